//! Pipeline orchestration.
//!
//! [`SpreadAnalyzer`] threads one pair of input series through the stages —
//! align/merge, outlier classification, regime construction, and every
//! estimator — and assembles the immutable [`AnalysisReport`]. Stages never
//! share mutable state; each consumes the previous stage's output.

use std::path::Path;

use crate::aligner::align_and_merge;
use crate::bootstrap::bootstrap_probabilities;
use crate::config::SpreadConfig;
use crate::errors::{validate_data_length, SpreadAnalysisError, SpreadResult};
use crate::levels::detect_levels;
use crate::loader::{load_ohlcv_series, OhlcvRecord};
use crate::outliers::classify_outliers;
use crate::probabilities::{empirical_probabilities, volume_weighted_probabilities};
use crate::regimes::{Regime, RegimeKind};
use crate::results::AnalysisReport;
use crate::statistical_tests::run_statistical_tests;
use crate::transitions::conditional_transitions;

/// Runs the full spread analysis pipeline for one pair of series.
#[derive(Debug, Clone, Default)]
pub struct SpreadAnalyzer {
    config: SpreadConfig,
}

impl SpreadAnalyzer {
    /// Analyzer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with a custom configuration; rejects invalid settings up
    /// front so no stage has to re-validate.
    pub fn with_config(config: SpreadConfig) -> SpreadResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }

    /// Load both series from CSV files and analyze them.
    pub fn analyze_files<P: AsRef<Path>>(&self, path1: P, path2: P) -> SpreadResult<AnalysisReport> {
        let label1 = display_label(path1.as_ref(), "series1");
        let label2 = display_label(path2.as_ref(), "series2");
        let series1 = load_ohlcv_series(path1.as_ref(), &label1)?;
        let series2 = load_ohlcv_series(path2.as_ref(), &label2)?;
        self.analyze_series(&series1, &series2)
    }

    /// Analyze two already-loaded series.
    pub fn analyze_series(
        &self,
        series1: &[OhlcvRecord],
        series2: &[OhlcvRecord],
    ) -> SpreadResult<AnalysisReport> {
        let (mut bars, merge) = align_and_merge(series1, series2, &self.config)?;
        validate_data_length(&bars, 1, "merged spread series")?;

        let outliers = classify_outliers(&mut bars, &self.config);

        let raw = Regime::build(RegimeKind::Raw, &bars);
        let valid = Regime::build(RegimeKind::Valid, &bars);
        log::info!(
            "merged {} days ({} raw, {} valid)",
            bars.len(),
            raw.len(),
            valid.len()
        );

        let raw_probabilities = empirical_probabilities(&raw, &self.config);
        let valid_probabilities = empirical_probabilities(&valid, &self.config);
        let volume_weighted = volume_weighted_probabilities(&raw, &self.config);
        let bootstrap = bootstrap_probabilities(&valid, &self.config)?;
        let transitions = conditional_transitions(&valid, &self.config);
        let statistical_tests = run_statistical_tests(&raw);

        // Unreachable in practice: bars is non-empty here, and detect_levels
        // only declines on an empty history.
        let levels = detect_levels(&bars, &self.config).ok_or_else(|| {
            SpreadAnalysisError::EmptyRegime {
                regime: "merged series".to_string(),
            }
        })?;

        Ok(AnalysisReport {
            merge,
            outliers,
            raw_probabilities,
            valid_probabilities,
            volume_weighted,
            bootstrap,
            transitions,
            levels,
            statistical_tests,
        })
    }
}

fn display_label(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}
