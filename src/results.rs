//! # Analysis Result Structures
//!
//! The immutable bundle assembled once per run. This is the sole interface
//! to presentation and dashboard collaborators: they render this structure
//! and never recompute analytics.

use crate::aligner::MergeSummary;
use crate::bootstrap::BootstrapRecord;
use crate::levels::SupportResistance;
use crate::outliers::OutlierSummary;
use crate::probabilities::{RegimeProbabilities, VolumeWeightedRecord};
use crate::statistical_tests::StatisticalTestSuite;
use crate::transitions::ConditionalTransitions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete results of one spread analysis run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisReport {
    /// Data-quality summary from the merge
    pub merge: MergeSummary,
    /// Warm-up and outlier counts from the classifier
    pub outliers: OutlierSummary,
    /// Empirical probabilities over the raw regime (spikes included)
    pub raw_probabilities: RegimeProbabilities,
    /// Empirical probabilities over the valid regime (outlier- and
    /// warm-up-free)
    pub valid_probabilities: RegimeProbabilities,
    /// Volume-weighted probabilities (raw regime); empty when total volume
    /// is zero
    pub volume_weighted: Vec<VolumeWeightedRecord>,
    /// Bootstrap confidence intervals (valid regime); empty when the
    /// regime has no rows
    pub bootstrap: Vec<BootstrapRecord>,
    /// Conditional transition cohorts; a cohort is absent below the sample
    /// minimum
    pub transitions: ConditionalTransitions,
    /// Support/resistance levels and the directional target
    pub levels: SupportResistance,
    /// Statistical test suite (raw regime); absent below 10 observations
    pub statistical_tests: Option<StatisticalTestSuite>,
}
