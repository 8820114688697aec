//! Dual-regime views over the merged spread series.
//!
//! Every downstream estimator states which regime it reads. The raw regime
//! keeps anomalies (tail risk and volatility clustering are only visible
//! there); the valid regime is the outlier- and warm-up-free subset that
//! gives a stable baseline estimate.

use crate::aligner::Bar;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which of the two parallel views of the data a computation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegimeKind {
    /// All consecutive rows with a defined move, including outliers and
    /// warm-up rows
    Raw,
    /// Raw minus outliers minus warm-up
    Valid,
}

impl RegimeKind {
    /// Human-readable label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            RegimeKind::Raw => "raw",
            RegimeKind::Valid => "valid",
        }
    }

    /// Membership predicate for this regime.
    pub fn admits(&self, bar: &Bar) -> bool {
        let in_raw = bar.is_consecutive && bar.tick_move.is_some();
        match self {
            RegimeKind::Raw => in_raw,
            RegimeKind::Valid => in_raw && !bar.is_outlier && !bar.is_warmup,
        }
    }
}

/// Ordered, non-owning view over the bars admitted by one regime.
///
/// Built once per run after classification and read-only thereafter.
#[derive(Debug, Clone)]
pub struct Regime<'a> {
    kind: RegimeKind,
    bars: Vec<&'a Bar>,
}

impl<'a> Regime<'a> {
    /// Select the admitted bars, preserving order.
    pub fn build(kind: RegimeKind, bars: &'a [Bar]) -> Self {
        let bars = bars.iter().filter(|b| kind.admits(b)).collect();
        Self { kind, bars }
    }

    /// Which regime this view represents.
    pub fn kind(&self) -> RegimeKind {
        self.kind
    }

    /// Number of admitted bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the regime has no rows.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Iterate the admitted bars in series order.
    pub fn iter(&self) -> std::slice::Iter<'_, &'a Bar> {
        self.bars.iter()
    }

    /// Directional tick moves as floats, in series order.
    ///
    /// Every admitted bar has a defined move, so this has the same length
    /// as the regime.
    pub fn tick_moves(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.tick_move)
            .map(|t| t as f64)
            .collect()
    }

    /// Absolute tick moves as floats, in series order.
    pub fn abs_tick_moves(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.abs_tick_move)
            .map(|t| t as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(row_id: usize, tick: Option<i64>, consecutive: bool, warmup: bool, outlier: bool) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(row_id as u64);
        Bar {
            date,
            timestamp: date.and_hms_opt(16, 0, 0).unwrap(),
            close1: 0.0,
            close2: 0.0,
            volume1: 0.0,
            volume2: 0.0,
            spread_close: 0.0,
            spread_volume: 1.0,
            price_change: tick.map(|t| t as f64),
            tick_move: tick,
            abs_tick_move: tick.map(i64::abs),
            days_gap: if row_id == 0 { None } else { Some(1) },
            row_id,
            is_consecutive: consecutive,
            is_warmup: warmup,
            is_outlier: outlier,
        }
    }

    #[test]
    fn test_valid_is_subset_of_raw() {
        let bars = vec![
            bar(0, None, true, true, false),
            bar(1, Some(1), true, true, false),
            bar(2, Some(-1), true, false, false),
            bar(3, Some(50), true, false, true),
            bar(4, Some(2), false, false, false),
            bar(5, Some(1), true, false, false),
        ];

        let raw = Regime::build(RegimeKind::Raw, &bars);
        let valid = Regime::build(RegimeKind::Valid, &bars);

        // raw: rows 1, 2, 3, 5 (row 0 has no move, row 4 not consecutive)
        assert_eq!(raw.len(), 4);
        // valid: rows 2, 5 (row 1 warm-up, row 3 outlier)
        assert_eq!(valid.len(), 2);

        let raw_ids: Vec<usize> = raw.iter().map(|b| b.row_id).collect();
        for v in valid.iter() {
            assert!(raw_ids.contains(&v.row_id));
        }
    }

    #[test]
    fn test_tick_moves_alignment() {
        let bars = vec![
            bar(0, None, true, false, false),
            bar(1, Some(3), true, false, false),
            bar(2, Some(-2), true, false, false),
        ];
        let raw = Regime::build(RegimeKind::Raw, &bars);
        assert_eq!(raw.tick_moves(), vec![3.0, -2.0]);
        assert_eq!(raw.abs_tick_moves(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(RegimeKind::Raw.label(), "raw");
        assert_eq!(RegimeKind::Valid.label(), "valid");
    }
}
