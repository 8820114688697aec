//! Error types and validation functions for spread analysis.
//!
//! Structural problems (bad schema, unreadable input, empty merged series)
//! are fatal and surface through [`SpreadAnalysisError`]. Statistical
//! degeneracies (flatlines, zero variance, insufficient samples) never reach
//! this module: estimators recover them locally into explicit
//! "undefined"/"insufficient" markers in the result structures.

use std::sync::Arc;
use thiserror::Error;

/// Error types for spread analysis operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum SpreadAnalysisError {
    /// Required columns are missing from an input series.
    #[error("Schema error in {label}: missing required columns {missing:?}")]
    SchemaError {
        /// Which input series failed validation
        label: String,
        /// Names of the required columns that were not found
        missing: Vec<String>,
    },

    /// A field value could not be parsed.
    #[error("Parse error in {label}: {reason}")]
    ParseError {
        /// Which input series contained the value
        label: String,
        /// What failed to parse, and why
        reason: String,
    },

    /// Insufficient data for the requested computation.
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Minimum required rows
        required: usize,
        /// Actual number of rows available
        actual: usize,
    },

    /// Invalid configuration parameter.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Numerical computation error.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
    },

    /// A regime had zero rows where at least one was required.
    #[error("Regime '{regime}' is empty")]
    EmptyRegime {
        /// Which regime was empty
        regime: String,
    },

    /// I/O operation error.
    #[error("I/O operation failed: {operation}")]
    IoError {
        /// I/O operation that failed
        operation: String,
        /// Underlying error
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Result type for spread analysis operations.
pub type SpreadResult<T> = Result<T, SpreadAnalysisError>;

/// Validates that data has sufficient length for a computation.
///
/// # Arguments
/// * `data` - Input values
/// * `min_required` - Minimum number of values required
/// * `operation` - Name of the operation requiring the data
pub fn validate_data_length<T>(
    data: &[T],
    min_required: usize,
    _operation: &str,
) -> SpreadResult<()> {
    if data.len() < min_required {
        Err(SpreadAnalysisError::InsufficientData {
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter is within expected bounds (inclusive).
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> SpreadResult<()> {
    if value.is_nan() {
        return Err(SpreadAnalysisError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(SpreadAnalysisError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validate an allocation size before reserving a large working set.
///
/// The bootstrap resample matrix is the only materially large allocation in
/// the pipeline (`n × iterations` indices); a misconfigured iteration count
/// must fail with an explicit error rather than exhaust memory.
pub fn validate_allocation_size(size: usize, operation: &str) -> SpreadResult<()> {
    // Maximum safe allocation: 1GB
    const MAX_SAFE_ALLOCATION: usize = 1 << 30;

    if size > MAX_SAFE_ALLOCATION {
        return Err(SpreadAnalysisError::NumericalError {
            reason: format!(
                "Attempted allocation of {} bytes in '{}' exceeds safety limit of {} bytes",
                size, operation, MAX_SAFE_ALLOCATION
            ),
        });
    }

    Ok(())
}
