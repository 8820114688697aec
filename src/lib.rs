//! # Spread Analytics
//!
//! Dual-regime probability and support/resistance analytics for the spread
//! between two related daily price series.
//!
//! The pipeline aligns two OHLCV series into one bar per trading day, forms
//! the spread and its tick-quantized move, flags anomalous moves with a
//! causal expanding-window MAD (no look-ahead), and then estimates:
//!
//! - **Empirical tick probabilities** with Wilson confidence intervals,
//!   computed in parallel over a *raw* regime (spikes included) and a
//!   *valid* regime (outlier- and warm-up-free)
//! - **Volume-weighted probabilities** over the raw regime
//! - **Bootstrap confidence intervals** (vectorized iid resampling,
//!   reproducible under a fixed seed)
//! - **Conditional transition probabilities** keyed by the sign of the
//!   current move, with adjacency guaranteed through stable row ids
//! - **Support/resistance levels** from volume concentration and swing
//!   points over a recency window, with confluence-boosted strength scores
//! - **Statistical tests**: distribution shape, autocorrelation, t-test,
//!   Wilcoxon signed-rank, and a runs test, each guarded against
//!   degenerate inputs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spread_analytics::{SpreadAnalyzer, SpreadConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SpreadConfig {
//!         bootstrap_seed: Some(42),
//!         ..Default::default()
//!     };
//!     let analyzer = SpreadAnalyzer::with_config(config)?;
//!     let report = analyzer.analyze_files("leg1_1d.csv", "leg2_1d.csv")?;
//!
//!     for record in &report.valid_probabilities.records {
//!         println!(
//!             "P(|move| >= {} ticks) = {:.2}% [{:.2}%, {:.2}%]",
//!             record.threshold,
//!             record.at_least.probability * 100.0,
//!             record.at_least.interval.lower_bound * 100.0,
//!             record.at_least.interval.upper_bound * 100.0,
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//!
//! Statistical degeneracies (flatlines, zero variance, insufficient
//! samples) are always recovered locally into explicit absent/undefined
//! markers in [`AnalysisReport`]; only structural problems (bad schema,
//! unreadable input, empty merged series) return errors. Presentation is a
//! consumer concern: this crate computes, the report renders elsewhere.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aligner;
pub mod analyzer;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod levels;
pub mod loader;
pub mod math_utils;
pub mod outliers;
pub mod probabilities;
pub mod regimes;
pub mod results;
pub mod rng;
pub mod statistical_tests;
pub mod transitions;

pub use aligner::{align_and_merge, Bar, MergeSummary};
pub use analyzer::SpreadAnalyzer;
pub use bootstrap::{bootstrap_probabilities, BootstrapEstimate, BootstrapRecord};
pub use config::SpreadConfig;
pub use errors::{SpreadAnalysisError, SpreadResult};
pub use levels::{detect_levels, DirectionBias, EvidenceKind, Level, SupportResistance};
pub use loader::{load_ohlcv_series, parse_ohlcv_csv, OhlcvRecord};
pub use outliers::{classify_outliers, OutlierSummary};
pub use probabilities::{
    empirical_probabilities, volume_weighted_probabilities, wilson_interval, ProbabilityRecord,
    ProportionEstimate, RegimeProbabilities, VolumeWeightedRecord, WilsonInterval,
};
pub use regimes::{Regime, RegimeKind};
pub use results::AnalysisReport;
pub use statistical_tests::{
    run_statistical_tests, AutocorrelationPoint, DistributionStats, RunsTest,
    StatisticalTestSuite, TTestResult, WilcoxonResult,
};
pub use transitions::{conditional_transitions, ConditionalTransitions, TransitionCohort};
