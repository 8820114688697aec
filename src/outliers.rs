//! Causal expanding-window outlier classification.
//!
//! Each row's classification depends only on rows up to and including it:
//! a running median of `tick_move` and a running median absolute deviation
//! of each row's move from the median current at that row. Both statistics
//! are undefined until the window reaches `min_expanding_window` rows;
//! earlier rows are warm-up and are never flagged as outliers, because
//! undefined statistics cannot judge anomalies.

use crate::aligner::Bar;
use crate::config::SpreadConfig;
use crate::math_utils::median_of_sorted;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normal-consistency constant: scales MAD to approximate a standard
/// deviation for normally distributed data.
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Counts reported by the classifier.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutlierSummary {
    /// Rows where the expanding statistics were undefined
    pub n_warmup: usize,
    /// Rows flagged anomalous
    pub n_outliers: usize,
    /// Threshold (in ticks) in effect at the final row, if ever defined
    pub final_threshold: Option<f64>,
}

/// Insert `value` into `sorted`, keeping it sorted ascending.
fn insert_sorted(sorted: &mut Vec<f64>, value: f64) {
    let idx = sorted.partition_point(|&x| x < value);
    sorted.insert(idx, value);
}

/// Classify warm-up and outlier rows in place.
///
/// The threshold at each row is `max(outlier_mad_threshold × scaled_mad,
/// min_outlier_ticks)`; the floor guards against near-zero dispersion
/// collapsing the threshold. A non-warm-up row is an outlier when its
/// `tick_move` is missing or its absolute deviation from the running median
/// exceeds the threshold.
pub fn classify_outliers(bars: &mut [Bar], config: &SpreadConfig) -> OutlierSummary {
    let window = config.min_expanding_window;
    let mut summary = OutlierSummary::default();

    let mut ticks_sorted: Vec<f64> = Vec::with_capacity(bars.len());
    let mut devs_sorted: Vec<f64> = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter_mut().enumerate() {
        // Deviation of this row from the median as of this row; the window
        // includes the row being judged.
        let deviation = bar.tick_move.map(|t| {
            let tick = t as f64;
            insert_sorted(&mut ticks_sorted, tick);
            let running_median = median_of_sorted(&ticks_sorted);
            let dev = (tick - running_median).abs();
            insert_sorted(&mut devs_sorted, dev);
            dev
        });

        if i + 1 < window {
            bar.is_warmup = true;
            bar.is_outlier = false;
            summary.n_warmup += 1;
            continue;
        }

        bar.is_warmup = false;
        let mad = median_of_sorted(&devs_sorted);
        let threshold = (config.outlier_mad_threshold * mad * MAD_NORMAL_SCALE)
            .max(config.min_outlier_ticks);
        summary.final_threshold = Some(threshold);

        bar.is_outlier = match deviation {
            Some(dev) => dev > threshold,
            None => true,
        };
        if bar.is_outlier {
            summary.n_outliers += 1;
        }
    }

    if summary.n_outliers > 0 {
        log::warn!(
            "{} outliers flagged (expanding MAD, threshold {:.1} ticks)",
            summary.n_outliers,
            summary.final_threshold.unwrap_or(config.min_outlier_ticks)
        );
    }
    if summary.n_warmup > 0 {
        log::info!(
            "{} warm-up rows (excluded from the valid regime, included in raw)",
            summary.n_warmup
        );
    }

    summary
}
