//! # Analysis Configuration
//!
//! Configuration for the spread analysis pipeline. Every knob has a default
//! suitable for daily futures-spread data; all are overridable.

use crate::errors::{SpreadAnalysisError, SpreadResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum calendar-day gap accepted between consecutive bars in strict mode
/// (weekend only: Friday to Monday is 3 days).
pub const MAX_GAP_DAYS_STRICT: i64 = 3;

/// Maximum calendar-day gap accepted in relaxed mode (long weekends and bank
/// holidays).
pub const MAX_GAP_DAYS_RELAXED: i64 = 5;

/// Configuration for the spread analysis pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpreadConfig {
    /// Smallest price increment; spread moves are expressed as integer
    /// multiples of this
    pub tick_size: f64,
    /// Ordered set of tick thresholds to estimate probabilities for
    pub tick_levels: Vec<i64>,
    /// Multiplier applied to the scaled expanding MAD when flagging outliers
    pub outlier_mad_threshold: f64,
    /// Floor (in ticks) for the outlier threshold; guards against near-zero
    /// dispersion producing a degenerate threshold
    pub min_outlier_ticks: f64,
    /// Strict adjacency: reject gaps over 3 calendar days (weekends only);
    /// relaxed allows up to 5
    pub strict_daily_only: bool,
    /// Minimum expanding-window length before the outlier statistics are
    /// defined; earlier rows are warm-up
    pub min_expanding_window: usize,
    /// Minimum observations for a conditional transition cohort to be
    /// reported
    pub min_conditional_samples: usize,
    /// Width of the centered rolling window used for swing detection
    pub swing_window: usize,
    /// Maximum number of support and resistance levels reported per side
    pub top_n_levels: usize,
    /// Minimum separation (in ticks) between accepted levels on one side
    pub sr_min_distance_ticks: i64,
    /// Recency window (calendar days) for level detection
    pub sr_lookback_days: i64,
    /// Number of bootstrap resampling iterations
    pub bootstrap_iterations: usize,
    /// Optional RNG seed; `None` means entropy seeding (non-deterministic)
    pub bootstrap_seed: Option<u64>,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            tick_size: 0.005,
            tick_levels: vec![1, 2, 3],
            outlier_mad_threshold: 4.0,
            min_outlier_ticks: 10.0,
            strict_daily_only: false,
            min_expanding_window: 20,
            min_conditional_samples: 30,
            swing_window: 5,
            top_n_levels: 3,
            sr_min_distance_ticks: 4,
            sr_lookback_days: 60,
            bootstrap_iterations: 2000,
            bootstrap_seed: None,
        }
    }
}

impl SpreadConfig {
    /// Maximum calendar-day gap accepted under the configured adjacency
    /// policy.
    pub fn max_gap_days(&self) -> i64 {
        if self.strict_daily_only {
            MAX_GAP_DAYS_STRICT
        } else {
            MAX_GAP_DAYS_RELAXED
        }
    }

    /// Validate the configuration before running the pipeline.
    pub fn validate(&self) -> SpreadResult<()> {
        if !(self.tick_size > 0.0) || !self.tick_size.is_finite() {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "tick_size".to_string(),
                value: self.tick_size,
                constraint: "finite and > 0".to_string(),
            });
        }

        if self.tick_levels.is_empty() {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "tick_levels".to_string(),
                value: 0.0,
                constraint: "at least one threshold".to_string(),
            });
        }

        if self.tick_levels.windows(2).any(|w| w[0] >= w[1]) || self.tick_levels[0] < 1 {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "tick_levels".to_string(),
                value: self.tick_levels[0] as f64,
                constraint: "strictly increasing positive thresholds".to_string(),
            });
        }

        if self.outlier_mad_threshold <= 0.0 || !self.outlier_mad_threshold.is_finite() {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "outlier_mad_threshold".to_string(),
                value: self.outlier_mad_threshold,
                constraint: "finite and > 0".to_string(),
            });
        }

        if self.min_expanding_window == 0 {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "min_expanding_window".to_string(),
                value: 0.0,
                constraint: ">= 1".to_string(),
            });
        }

        if self.swing_window == 0 {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "swing_window".to_string(),
                value: 0.0,
                constraint: ">= 1".to_string(),
            });
        }

        if self.bootstrap_iterations == 0 {
            return Err(SpreadAnalysisError::InvalidParameter {
                parameter: "bootstrap_iterations".to_string(),
                value: 0.0,
                constraint: ">= 1".to_string(),
            });
        }

        Ok(())
    }
}
