//! Empirical and volume-weighted tick probability estimators.
//!
//! Empirical probabilities are computed independently for both regimes so
//! the "real world" (spikes included) and "normal regime" views can be
//! compared side by side. Every probability carries a Wilson-score 95%
//! confidence interval, which behaves sensibly at small samples and extreme
//! proportions where the normal approximation does not.

use once_cell::sync::Lazy;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::SpreadConfig;
use crate::regimes::{Regime, RegimeKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Confidence level used for all Wilson intervals.
pub const WILSON_CONFIDENCE: f64 = 0.95;

// Cached standard normal for quantile lookups.
static STANDARD_NORMAL: Lazy<Normal> =
    Lazy::new(|| Normal::new(0.0, 1.0).expect("standard normal is well-defined"));

/// Wilson-score confidence interval, clipped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WilsonInterval {
    /// Lower bound, clipped at 0
    pub lower_bound: f64,
    /// Upper bound, clipped at 1
    pub upper_bound: f64,
}

/// A count converted to a proportion with its interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProportionEstimate {
    /// Number of qualifying rows
    pub count: usize,
    /// `count / n`
    pub probability: f64,
    /// Wilson 95% interval for the probability
    pub interval: WilsonInterval,
}

/// Probabilities for one tick threshold in one regime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbabilityRecord {
    /// Threshold in ticks
    pub threshold: i64,
    /// Threshold in price units (`threshold × tick_size`)
    pub tick_value: f64,
    /// `|move| == threshold`
    pub exact: ProportionEstimate,
    /// `|move| >= threshold`
    pub at_least: ProportionEstimate,
    /// `move >= threshold`
    pub up: ProportionEstimate,
    /// `move <= -threshold`
    pub down: ProportionEstimate,
}

/// Full empirical probability set for one regime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegimeProbabilities {
    /// Which regime these probabilities describe
    pub kind: RegimeKind,
    /// Rows in the regime
    pub n: usize,
    /// `move == 0`
    pub zero_move: ProportionEstimate,
    /// One record per configured threshold, ascending
    pub records: Vec<ProbabilityRecord>,
}

/// Volume-weighted probabilities for one tick threshold (raw regime only).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VolumeWeightedRecord {
    /// Threshold in ticks
    pub threshold: i64,
    /// Volume share of rows with `|move| >= threshold`
    pub at_least: f64,
    /// Volume share of rows with `move >= threshold`
    pub up: f64,
    /// Volume share of rows with `move <= -threshold`
    pub down: f64,
}

/// Wilson-score confidence interval for a binomial proportion.
///
/// `trials == 0` yields the degenerate `(0, 0)` interval without raising.
pub fn wilson_interval(successes: usize, trials: usize, confidence: f64) -> WilsonInterval {
    if trials == 0 {
        return WilsonInterval {
            lower_bound: 0.0,
            upper_bound: 0.0,
        };
    }

    let z = STANDARD_NORMAL.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let margin = (z / denom) * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    WilsonInterval {
        lower_bound: (center - margin).max(0.0),
        upper_bound: (center + margin).min(1.0),
    }
}

fn proportion(count: usize, trials: usize) -> ProportionEstimate {
    let probability = if trials == 0 {
        0.0
    } else {
        count as f64 / trials as f64
    };
    ProportionEstimate {
        count,
        probability,
        interval: wilson_interval(count, trials, WILSON_CONFIDENCE),
    }
}

/// Empirical tick probabilities for one regime.
///
/// An empty regime yields zero counts and `(0, 0)` intervals rather than an
/// error; absence of data is part of the result, not a failure.
pub fn empirical_probabilities(regime: &Regime<'_>, config: &SpreadConfig) -> RegimeProbabilities {
    let moves: Vec<i64> = regime.iter().filter_map(|b| b.tick_move).collect();
    let n = moves.len();

    let zero_count = moves.iter().filter(|&&m| m == 0).count();

    let records = config
        .tick_levels
        .iter()
        .map(|&threshold| {
            let exact = moves.iter().filter(|&&m| m.abs() == threshold).count();
            let at_least = moves.iter().filter(|&&m| m.abs() >= threshold).count();
            let up = moves.iter().filter(|&&m| m >= threshold).count();
            let down = moves.iter().filter(|&&m| m <= -threshold).count();

            ProbabilityRecord {
                threshold,
                tick_value: threshold as f64 * config.tick_size,
                exact: proportion(exact, n),
                at_least: proportion(at_least, n),
                up: proportion(up, n),
                down: proportion(down, n),
            }
        })
        .collect();

    RegimeProbabilities {
        kind: regime.kind(),
        n,
        zero_move: proportion(zero_count, n),
        records,
    }
}

/// Volume-weighted probabilities over the raw regime.
///
/// Weights threshold membership by `spread_volume` instead of counting
/// rows. The raw regime is used deliberately: volume concentrates in spike
/// events, and excluding them would hide exactly the tail risk this
/// estimate exists to expose. Returns an empty vector when total volume is
/// zero.
pub fn volume_weighted_probabilities(
    raw: &Regime<'_>,
    config: &SpreadConfig,
) -> Vec<VolumeWeightedRecord> {
    debug_assert_eq!(raw.kind(), RegimeKind::Raw);

    let total_volume: f64 = raw.iter().map(|b| b.spread_volume).sum();
    if total_volume <= 0.0 {
        return Vec::new();
    }

    config
        .tick_levels
        .iter()
        .map(|&threshold| {
            let mut at_least = 0.0;
            let mut up = 0.0;
            let mut down = 0.0;
            for bar in raw.iter() {
                let m = match bar.tick_move {
                    Some(m) => m,
                    None => continue,
                };
                if m.abs() >= threshold {
                    at_least += bar.spread_volume;
                }
                if m >= threshold {
                    up += bar.spread_volume;
                }
                if m <= -threshold {
                    down += bar.spread_volume;
                }
            }
            VolumeWeightedRecord {
                threshold,
                at_least: at_least / total_volume,
                up: up / total_volume,
                down: down / total_volume,
            }
        })
        .collect()
}
