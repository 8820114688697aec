//! Conditional next-move probabilities by sign of the current move.
//!
//! Transitions are built strictly within the valid regime and only between
//! rows that were adjacent in the original merged series
//! (`next.row_id - cur.row_id == 1`). Rows dropped by filtering therefore
//! never create a spurious transition across the gap they leave behind.

use crate::config::SpreadConfig;
use crate::regimes::{Regime, RegimeKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Next-move statistics for one cohort (after-up or after-down).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionCohort {
    /// Transitions observed in this cohort
    pub n_samples: usize,
    /// Probability the next move continues in the same direction
    pub prob_continue: f64,
    /// Probability the next move reverses direction
    pub prob_reverse: f64,
    /// Probability the next move is flat
    pub prob_unchanged: f64,
    /// Mean next move in ticks (signed)
    pub mean_next_move: f64,
}

/// Conditional transition cohorts.
///
/// A cohort is present if and only if it reached `min_conditional_samples`
/// observations. Absent means "insufficient evidence", not "no edge".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConditionalTransitions {
    /// Transitions following an up move
    pub after_up: Option<TransitionCohort>,
    /// Transitions following a down move
    pub after_down: Option<TransitionCohort>,
}

fn summarize_cohort(next_moves: &[i64], continue_is_positive: bool, min_samples: usize) -> Option<TransitionCohort> {
    let n = next_moves.len();
    if n < min_samples {
        return None;
    }

    let ups = next_moves.iter().filter(|&&m| m > 0).count();
    let downs = next_moves.iter().filter(|&&m| m < 0).count();
    let flats = n - ups - downs;
    let (continues, reverses) = if continue_is_positive {
        (ups, downs)
    } else {
        (downs, ups)
    };

    Some(TransitionCohort {
        n_samples: n,
        prob_continue: continues as f64 / n as f64,
        prob_reverse: reverses as f64 / n as f64,
        prob_unchanged: flats as f64 / n as f64,
        mean_next_move: next_moves.iter().sum::<i64>() as f64 / n as f64,
    })
}

/// Conditional transition analysis over the valid regime.
pub fn conditional_transitions(
    valid: &Regime<'_>,
    config: &SpreadConfig,
) -> ConditionalTransitions {
    debug_assert_eq!(valid.kind(), RegimeKind::Valid);

    let mut after_up: Vec<i64> = Vec::new();
    let mut after_down: Vec<i64> = Vec::new();

    let bars: Vec<_> = valid.iter().collect();
    for pair in bars.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        if next.row_id != cur.row_id + 1 {
            continue;
        }
        let (cur_move, next_move) = match (cur.tick_move, next.tick_move) {
            (Some(c), Some(n)) => (c, n),
            _ => continue,
        };
        if cur_move > 0 {
            after_up.push(next_move);
        } else if cur_move < 0 {
            after_down.push(next_move);
        }
    }

    ConditionalTransitions {
        after_up: summarize_cohort(&after_up, true, config.min_conditional_samples),
        after_down: summarize_cohort(&after_down, false, config.min_conditional_samples),
    }
}
