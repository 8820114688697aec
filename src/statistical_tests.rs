//! Statistical tests over the raw regime's tick moves.
//!
//! The raw regime is deliberate: volatility clustering happens during the
//! big moves, so testing only the filtered data would hide exactly the
//! effects these tests look for. Every test guards its degenerate inputs —
//! flatlines, zero variance, too few observations — and reports an explicit
//! absent/undefined marker instead of a NaN or an error.

use once_cell::sync::Lazy;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::math_utils::{mean, median, population_std, sample_std};
use crate::regimes::{Regime, RegimeKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum raw-regime observations before the suite runs at all.
pub const MIN_SUITE_SAMPLES: usize = 10;

/// Minimum non-zero moves for the signed-rank test.
pub const MIN_WILCOXON_SAMPLES: usize = 10;

/// Autocorrelation lags reported by the suite.
pub const AUTOCORRELATION_LAGS: [usize; 4] = [1, 2, 3, 5];

/// Two-sided critical z at the 5% level, used by the runs test.
const RUNS_CRITICAL_Z: f64 = 1.96;

static STANDARD_NORMAL: Lazy<Normal> =
    Lazy::new(|| Normal::new(0.0, 1.0).expect("standard normal is well-defined"));

/// Shape of the tick-move distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionStats {
    /// Mean absolute move (ticks)
    pub mean_abs: f64,
    /// Median absolute move (ticks)
    pub median_abs: f64,
    /// Population std of absolute moves
    pub std_abs: f64,
    /// Mean directional move (ticks)
    pub mean_dir: f64,
    /// Population std of directional moves
    pub std_dir: f64,
    /// Skewness; forced to 0 on a flatline (no shape without variance)
    pub skewness: f64,
    /// Excess kurtosis; forced to 0 on a flatline
    pub kurtosis: f64,
    /// Directional std is exactly zero
    pub is_flatline: bool,
}

/// Autocorrelation at one lag; `None` when undefined (zero variance in a
/// shifted slice, or a non-finite coefficient).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AutocorrelationPoint {
    /// Lag in bars
    pub lag: usize,
    /// Pearson coefficient; `None` when undefined
    pub coefficient: Option<f64>,
}

/// One-sample t-test of the mean move against zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TTestResult {
    /// t statistic
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Mean differs from zero at the 5% level
    pub has_bias: bool,
}

/// Wilcoxon signed-rank test on the non-zero moves.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WilcoxonResult {
    /// Smaller of the positive/negative rank sums
    pub statistic: f64,
    /// Two-sided p-value (normal approximation)
    pub p_value: f64,
    /// Median of non-zero moves differs from zero at the 5% level
    pub has_bias: bool,
}

/// Runs test for randomness about the median.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunsTest {
    /// All values fell on one side of the median
    NotApplicable,
    /// Test computed
    Result {
        /// Standardized deviation of the observed run count
        z_statistic: f64,
        /// `|z| < 1.96`: no evidence against randomness
        is_random: bool,
    },
}

/// Full test suite over the raw regime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatisticalTestSuite {
    pub distribution: DistributionStats,
    pub autocorrelation: Vec<AutocorrelationPoint>,
    /// Absent when the directional variance is zero
    pub t_test: Option<TTestResult>,
    /// Absent below [`MIN_WILCOXON_SAMPLES`] non-zero moves or on a
    /// degenerate rank variance
    pub wilcoxon: Option<WilcoxonResult>,
    pub runs_test: RunsTest,
}

fn distribution_stats(moves: &[f64], abs_moves: &[f64]) -> DistributionStats {
    let std_dir = population_std(moves);
    let is_flatline = std_dir == 0.0;

    let (skewness, kurtosis) = if is_flatline {
        // A flatline has no shape
        (0.0, 0.0)
    } else {
        let m = mean(moves);
        let n = moves.len() as f64;
        let m2 = moves.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / n;
        let m3 = moves.iter().map(|&x| (x - m).powi(3)).sum::<f64>() / n;
        let m4 = moves.iter().map(|&x| (x - m).powi(4)).sum::<f64>() / n;
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    };

    DistributionStats {
        mean_abs: mean(abs_moves),
        median_abs: median(abs_moves),
        std_abs: population_std(abs_moves),
        mean_dir: mean(moves),
        std_dir,
        skewness,
        kurtosis,
        is_flatline,
    }
}

/// Pearson autocorrelation at the given lags.
///
/// A coefficient is undefined when either shifted sub-series has zero
/// variance; reporting `None` there is what keeps a flatline from producing
/// a 0/0.
pub fn autocorrelations(moves: &[f64], lags: &[usize]) -> Vec<AutocorrelationPoint> {
    let mut points = Vec::with_capacity(lags.len());
    for &lag in lags {
        if moves.len() <= lag {
            continue;
        }
        let head = &moves[..moves.len() - lag];
        let tail = &moves[lag..];
        points.push(AutocorrelationPoint {
            lag,
            coefficient: pearson(head, tail),
        });
    }
    points
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mx = mean(x);
    let my = mean(y);
    let sx = population_std(x);
    let sy = population_std(y);
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    let cov = x
        .iter()
        .zip(y.iter())
        .map(|(&a, &b)| (a - mx) * (b - my))
        .sum::<f64>()
        / n;
    let r = cov / (sx * sy);
    r.is_finite().then_some(r)
}

/// One-sample t-test against a zero mean.
///
/// Returns `None` when the sample variance is zero (the statistic is 0/0).
pub fn t_test_zero_mean(moves: &[f64]) -> Option<TTestResult> {
    let n = moves.len();
    if n < 2 {
        return None;
    }
    let s = sample_std(moves);
    if !(s > 0.0) {
        return None;
    }
    let t = mean(moves) / (s / (n as f64).sqrt());
    let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
    let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some(TTestResult {
        statistic: t,
        p_value,
        has_bias: p_value < 0.05,
    })
}

/// Wilcoxon signed-rank test on non-zero moves (normal approximation with
/// tie correction).
pub fn wilcoxon_signed_rank(non_zero: &[f64]) -> Option<WilcoxonResult> {
    let n = non_zero.len();
    if n < MIN_WILCOXON_SAMPLES {
        return None;
    }

    // Rank |x| ascending, averaging ranks across ties
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        non_zero[a]
            .abs()
            .partial_cmp(&non_zero[b].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0f64; n];
    let mut tie_correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && non_zero[order[j + 1]].abs() == non_zero[order[i]].abs() {
            j += 1;
        }
        let avg_rank = (i + j + 2) as f64 / 2.0; // ranks are 1-based
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        let t = (j - i + 1) as f64;
        tie_correction += t * t * t - t;
        i = j + 1;
    }

    let w_plus: f64 = non_zero
        .iter()
        .zip(ranks.iter())
        .filter(|(&x, _)| x > 0.0)
        .map(|(_, &r)| r)
        .sum();
    let nf = n as f64;
    let rank_total = nf * (nf + 1.0) / 2.0;
    let w_minus = rank_total - w_plus;

    let expected = nf * (nf + 1.0) / 4.0;
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_correction / 48.0;
    if !(variance > 0.0) {
        return None;
    }

    let z = (w_plus - expected) / variance.sqrt();
    let p_value = 2.0 * (1.0 - STANDARD_NORMAL.cdf(z.abs()));
    Some(WilcoxonResult {
        statistic: w_plus.min(w_minus),
        p_value,
        has_bias: p_value < 0.05,
    })
}

/// Runs test for randomness about the median.
pub fn runs_test(moves: &[f64]) -> RunsTest {
    let med = median(moves);
    let above: Vec<bool> = moves.iter().map(|&x| x > med).collect();
    let n_above = above.iter().filter(|&&a| a).count();
    let n_below = above.len() - n_above;

    if n_above == 0 || n_below == 0 {
        return RunsTest::NotApplicable;
    }

    let runs = 1 + above.windows(2).filter(|w| w[0] != w[1]).count();
    let na = n_above as f64;
    let nb = n_below as f64;
    let total = na + nb;
    let expected = 1.0 + 2.0 * na * nb / total;
    let variance =
        (2.0 * na * nb * (2.0 * na * nb - na - nb)) / (total * total * (total - 1.0));

    let z = (runs as f64 - expected) / variance.max(1e-9).sqrt();
    RunsTest::Result {
        z_statistic: z,
        is_random: z.abs() < RUNS_CRITICAL_Z,
    }
}

/// Run the full suite over the raw regime.
///
/// Returns `None` below [`MIN_SUITE_SAMPLES`] observations.
pub fn run_statistical_tests(raw: &Regime<'_>) -> Option<StatisticalTestSuite> {
    debug_assert_eq!(raw.kind(), RegimeKind::Raw);

    let moves = raw.tick_moves();
    let abs_moves = raw.abs_tick_moves();
    if moves.len() < MIN_SUITE_SAMPLES {
        return None;
    }

    let non_zero: Vec<f64> = moves.iter().copied().filter(|&m| m != 0.0).collect();

    Some(StatisticalTestSuite {
        distribution: distribution_stats(&moves, &abs_moves),
        autocorrelation: autocorrelations(&moves, &AUTOCORRELATION_LAGS),
        t_test: t_test_zero_mean(&moves),
        wilcoxon: wilcoxon_signed_rank(&non_zero),
        runs_test: runs_test(&moves),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_flatline_forces_zero_shape() {
        let moves = vec![0.0; 20];
        let stats = distribution_stats(&moves, &moves);
        assert!(stats.is_flatline);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
    }

    #[test]
    fn test_symmetric_distribution_shape() {
        let moves: Vec<f64> = vec![-2.0, -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 2.0];
        let abs_moves: Vec<f64> = moves.iter().map(|m| m.abs()).collect();
        let stats = distribution_stats(&moves, &abs_moves);
        assert!(!stats.is_flatline);
        assert_approx_eq!(stats.mean_dir, 0.0, 1e-12);
        assert_approx_eq!(stats.skewness, 0.0, 1e-12);
    }

    #[test]
    fn test_autocorrelation_perfect_alternation() {
        // +1, -1, +1, -1 ... lag-1 correlation is exactly -1
        let moves: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let points = autocorrelations(&moves, &[1, 2]);
        assert_approx_eq!(points[0].coefficient.unwrap(), -1.0, 1e-12);
        assert_approx_eq!(points[1].coefficient.unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn test_autocorrelation_zero_variance_undefined() {
        let moves = vec![1.0; 20];
        let points = autocorrelations(&moves, &[1]);
        assert_eq!(points[0].coefficient, None);
    }

    #[test]
    fn test_t_test_detects_strong_drift() {
        let moves: Vec<f64> = (0..40).map(|i| 2.0 + 0.1 * ((i % 3) as f64 - 1.0)).collect();
        let result = t_test_zero_mean(&moves).expect("t-test expected");
        assert!(result.statistic > 0.0);
        assert!(result.has_bias);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_t_test_zero_variance_absent() {
        let moves = vec![1.0; 20];
        assert!(t_test_zero_mean(&moves).is_none());
    }

    #[test]
    fn test_wilcoxon_requires_ten_samples() {
        let nine = vec![1.0; 9];
        assert!(wilcoxon_signed_rank(&nine).is_none());
    }

    #[test]
    fn test_wilcoxon_one_sided_data_biased() {
        // All positive: W- is 0, strong bias
        let moves: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let result = wilcoxon_signed_rank(&moves).expect("wilcoxon expected");
        assert_approx_eq!(result.statistic, 0.0, 1e-12);
        assert!(result.has_bias);
    }

    #[test]
    fn test_wilcoxon_balanced_data_unbiased() {
        let moves = vec![1.0, -1.5, 2.0, -2.5, 3.0, -3.5, 4.0, -4.5, 5.0, -5.5, 6.0, -6.5];
        let result = wilcoxon_signed_rank(&moves).expect("wilcoxon expected");
        assert!(!result.has_bias);
    }

    #[test]
    fn test_runs_test_one_sided_not_applicable() {
        // Only 5 of 10 values above the median is fine, but all-equal data
        // puts everything "below" (not strictly above)
        let moves = vec![0.0; 12];
        assert_eq!(runs_test(&moves), RunsTest::NotApplicable);
    }

    #[test]
    fn test_runs_test_alternation_non_random() {
        let moves: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        match runs_test(&moves) {
            RunsTest::Result { z_statistic, is_random } => {
                assert!(z_statistic > RUNS_CRITICAL_Z);
                assert!(!is_random);
            }
            RunsTest::NotApplicable => panic!("runs test should be applicable"),
        }
    }

    #[test]
    fn test_runs_test_block_pattern_non_random() {
        // 20 lows then 20 highs: 2 runs, far below expectation
        let mut moves = vec![-1.0; 20];
        moves.extend(vec![1.0; 20]);
        match runs_test(&moves) {
            RunsTest::Result { z_statistic, is_random } => {
                assert!(z_statistic < -RUNS_CRITICAL_Z);
                assert!(!is_random);
            }
            RunsTest::NotApplicable => panic!("runs test should be applicable"),
        }
    }
}
