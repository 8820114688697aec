//! Time-alignment and merge of the two input series into a spread series.
//!
//! Each series is collapsed to one row per trading day (last intraday
//! timestamp wins), the two are inner-joined on calendar date, and the
//! merged rows get their spread, tick-quantized move, calendar gap, and a
//! stable `row_id` assigned before any filtering. `row_id` is the sole
//! authority for adjacency once rows are dropped from a regime.

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::SpreadConfig;
use crate::errors::SpreadResult;
use crate::loader::OhlcvRecord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fraction of a series lost to same-date deduplication above which the
/// input likely has unexpected intraday granularity.
const DEDUP_LOSS_WARN_FRACTION: f64 = 0.20;

/// One merged trading day of the spread series.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bar {
    /// Calendar date of the trading day
    pub date: NaiveDate,
    /// Last intraday timestamp observed for that date (from the first series)
    pub timestamp: NaiveDateTime,
    /// Daily close of the first leg
    pub close1: f64,
    /// Daily close of the second leg
    pub close2: f64,
    /// Daily volume of the first leg
    pub volume1: f64,
    /// Daily volume of the second leg
    pub volume2: f64,
    /// `close1 - close2`
    pub spread_close: f64,
    /// `min(volume1, volume2)`: the volume actually available to both legs
    pub spread_volume: f64,
    /// Difference from the prior bar's spread close; `None` for the first bar
    pub price_change: Option<f64>,
    /// `price_change / tick_size`, rounded to the nearest integer
    pub tick_move: Option<i64>,
    /// Absolute value of `tick_move`
    pub abs_tick_move: Option<i64>,
    /// Calendar days since the prior bar; `None` for the first bar
    pub days_gap: Option<i64>,
    /// Dense 0-based sequence number assigned before any filtering.
    /// Never renumbered; the only valid basis for adjacency tests.
    pub row_id: usize,
    /// Gap within the configured adjacency threshold (first bar: `true`)
    pub is_consecutive: bool,
    /// Expanding-window statistics undefined at this row
    pub is_warmup: bool,
    /// Flagged anomalous by the outlier classifier (never while warm-up)
    pub is_outlier: bool,
}

/// Data-quality summary emitted by the merge.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeSummary {
    /// Input rows in the first series before deduplication
    pub rows1: usize,
    /// Input rows in the second series before deduplication
    pub rows2: usize,
    /// Intraday rows consolidated away in the first series
    pub dedup1: usize,
    /// Intraday rows consolidated away in the second series
    pub dedup2: usize,
    /// Dates present in one series but not the other
    pub dropped_dates: usize,
    /// Rows in the merged spread series
    pub merged_rows: usize,
    /// Rows excluded from regimes because their gap exceeds the policy
    pub gap_excluded: usize,
    /// Sum of `spread_volume` over the merged series
    pub total_spread_volume: f64,
    /// First merged trading day
    pub first_date: Option<NaiveDate>,
    /// Last merged trading day
    pub last_date: Option<NaiveDate>,
}

/// Collapse a series to one row per calendar date, keeping the row with the
/// last timestamp of each day. Input must be sorted ascending by timestamp.
fn deduplicate_daily(records: &[OhlcvRecord]) -> Vec<OhlcvRecord> {
    let mut daily: Vec<OhlcvRecord> = Vec::with_capacity(records.len());
    for record in records {
        match daily.last_mut() {
            Some(last) if last.date() == record.date() => *last = *record,
            _ => daily.push(*record),
        }
    }
    daily
}

/// Merge two daily series into the spread series.
///
/// Returns the full merged bar list (rows in date order, `row_id` dense from
/// 0) together with a [`MergeSummary`]. Outlier and warm-up flags are left
/// `false`; the classifier fills them in afterwards.
pub fn align_and_merge(
    series1: &[OhlcvRecord],
    series2: &[OhlcvRecord],
    config: &SpreadConfig,
) -> SpreadResult<(Vec<Bar>, MergeSummary)> {
    let daily1 = deduplicate_daily(series1);
    let daily2 = deduplicate_daily(series2);

    let mut summary = MergeSummary {
        rows1: series1.len(),
        rows2: series2.len(),
        dedup1: series1.len() - daily1.len(),
        dedup2: series2.len() - daily2.len(),
        ..Default::default()
    };

    if summary.dedup1 > 0 || summary.dedup2 > 0 {
        log::info!(
            "consolidated intraday rows to daily close: series1={}, series2={}",
            summary.dedup1,
            summary.dedup2
        );
    }
    warn_on_dedup_loss("series1", summary.dedup1, summary.rows1);
    warn_on_dedup_loss("series2", summary.dedup2, summary.rows2);

    // Inner join on calendar date. Both sides are sorted and date-unique,
    // so a single forward scan suffices.
    let mut bars = Vec::with_capacity(daily1.len().min(daily2.len()));
    let max_gap = config.max_gap_days();
    let mut i = 0;
    let mut j = 0;
    let mut prev: Option<(NaiveDate, f64)> = None;

    while i < daily1.len() && j < daily2.len() {
        let d1 = daily1[i].date();
        let d2 = daily2[j].date();
        if d1 < d2 {
            i += 1;
            continue;
        }
        if d2 < d1 {
            j += 1;
            continue;
        }

        let r1 = &daily1[i];
        let r2 = &daily2[j];
        let spread_close = r1.close - r2.close;
        let spread_volume = r1.volume.min(r2.volume);

        let (price_change, tick_move, days_gap) = match prev {
            Some((prev_date, prev_close)) => {
                let change = spread_close - prev_close;
                let ticks = (change / config.tick_size).round() as i64;
                let gap = (d1 - prev_date).num_days();
                (Some(change), Some(ticks), Some(gap))
            }
            None => (None, None, None),
        };

        // First bar has no prior to compare against: consecutive by convention.
        let is_consecutive = days_gap.map_or(true, |gap| gap <= max_gap);

        bars.push(Bar {
            date: d1,
            timestamp: r1.timestamp,
            close1: r1.close,
            close2: r2.close,
            volume1: r1.volume,
            volume2: r2.volume,
            spread_close,
            spread_volume,
            price_change,
            tick_move,
            abs_tick_move: tick_move.map(i64::abs),
            days_gap,
            row_id: bars.len(),
            is_consecutive,
            is_warmup: false,
            is_outlier: false,
        });

        prev = Some((d1, spread_close));
        i += 1;
        j += 1;
    }

    summary.merged_rows = bars.len();
    summary.dropped_dates = daily1.len().max(daily2.len()).saturating_sub(bars.len());
    summary.gap_excluded = bars
        .iter()
        .filter(|b| !b.is_consecutive && b.tick_move.is_some())
        .count();
    summary.total_spread_volume = bars.iter().map(|b| b.spread_volume).sum();
    summary.first_date = bars.first().map(|b| b.date);
    summary.last_date = bars.last().map(|b| b.date);

    if summary.dropped_dates > 0 {
        log::warn!(
            "{} dates lost to non-overlapping calendars",
            summary.dropped_dates
        );
    }
    if summary.gap_excluded > 0 {
        log::warn!(
            "{} rows with gaps over {} days excluded from regimes",
            summary.gap_excluded,
            max_gap
        );
    }

    Ok((bars, summary))
}

fn warn_on_dedup_loss(label: &str, removed: usize, original: usize) {
    if original == 0 {
        return;
    }
    let fraction = removed as f64 / original as f64;
    if fraction > DEDUP_LOSS_WARN_FRACTION {
        log::warn!(
            "{}: deduplication removed {:.1}% of rows; check input for unexpected intraday granularity",
            label,
            fraction * 100.0
        );
    }
}
