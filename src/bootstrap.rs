//! Bootstrap confidence intervals for tick probabilities.
//!
//! Draws the full `n × K` resample index matrix up front from a single
//! ChaCha20 stream, then computes per-iteration proportions with
//! whole-array passes — no per-iteration resampling loop. A fixed seed
//! therefore reproduces the matrix bit for bit, and the resulting interval
//! bounds exactly.
//!
//! Limitation, by construction: resampling is iid. Serially correlated
//! data will understate the true interval width. This is a disclosed
//! approximation of the estimator, not something callers should correct
//! for after the fact.

use crate::config::SpreadConfig;
use crate::errors::{validate_allocation_size, SpreadResult};
use crate::math_utils::{mean, percentile};
use crate::regimes::Regime;
use crate::rng::SeededRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean and percentile interval of a bootstrapped proportion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapEstimate {
    /// Mean proportion across iterations
    pub mean: f64,
    /// 2.5th percentile across iterations
    pub lower_bound: f64,
    /// 97.5th percentile across iterations
    pub upper_bound: f64,
}

/// Bootstrap results for one tick threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootstrapRecord {
    /// Threshold in ticks
    pub threshold: i64,
    /// `|move| >= threshold`
    pub absolute: BootstrapEstimate,
    /// `move >= threshold`
    pub up: BootstrapEstimate,
    /// `move <= -threshold`
    pub down: BootstrapEstimate,
}

fn summarize(mut proportions: Vec<f64>) -> BootstrapEstimate {
    let mean = mean(&proportions);
    proportions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    BootstrapEstimate {
        mean,
        lower_bound: percentile(&proportions, 0.025),
        upper_bound: percentile(&proportions, 0.975),
    }
}

/// Bootstrap confidence intervals over the valid regime's tick moves.
///
/// Returns an empty vector when the regime has no rows. The resample matrix
/// allocation is validated before it is made, so a runaway iteration count
/// fails with an explicit error instead of exhausting memory.
pub fn bootstrap_probabilities(
    regime: &Regime<'_>,
    config: &SpreadConfig,
) -> SpreadResult<Vec<BootstrapRecord>> {
    let moves = regime.tick_moves();
    let n = moves.len();
    let iterations = config.bootstrap_iterations;

    if n == 0 {
        return Ok(Vec::new());
    }

    validate_allocation_size(
        n.saturating_mul(iterations)
            .saturating_mul(std::mem::size_of::<u32>()),
        "bootstrap resample matrix",
    )?;

    // Full n-by-K index matrix in row-major order, drawn in one pass so a
    // fixed seed reproduces it exactly.
    let mut rng = SeededRng::from_optional_seed(config.bootstrap_seed);
    let mut indices: Vec<u32> = Vec::with_capacity(n * iterations);
    for _ in 0..n * iterations {
        indices.push(rng.usize(0..n) as u32);
    }

    let records = config
        .tick_levels
        .iter()
        .map(|&threshold| {
            let t = threshold as f64;
            let mut abs_counts = vec![0u32; iterations];
            let mut up_counts = vec![0u32; iterations];
            let mut down_counts = vec![0u32; iterations];

            // Whole-matrix pass; column k of row i lives at i * K + k.
            for row in indices.chunks_exact(iterations) {
                for (k, &idx) in row.iter().enumerate() {
                    let m = moves[idx as usize];
                    if m.abs() >= t {
                        abs_counts[k] += 1;
                    }
                    if m >= t {
                        up_counts[k] += 1;
                    }
                    if m <= -t {
                        down_counts[k] += 1;
                    }
                }
            }

            let to_proportions = |counts: Vec<u32>| -> Vec<f64> {
                counts.into_iter().map(|c| c as f64 / n as f64).collect()
            };

            BootstrapRecord {
                threshold,
                absolute: summarize(to_proportions(abs_counts)),
                up: summarize(to_proportions(up_counts)),
                down: summarize(to_proportions(down_counts)),
            }
        })
        .collect();

    Ok(records)
}
