//! Support/resistance level detection over a recency window.
//!
//! Every close is quantized to an integer tick index so level identity
//! never depends on floating-point equality. A registry keyed by tick index
//! merges evidence from volume concentration and swing extrema
//! (merge-not-overwrite), scores each level, and the strongest
//! well-separated levels on each side of the current price are reported.
//!
//! Swing detection uses a centered window and therefore sees "future" rows
//! relative to the center. That is acceptable here because levels are
//! descriptive output, not inputs to a forward-looking decision.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Duration;

use crate::aligner::Bar;
use crate::config::SpreadConfig;
use crate::math_utils::float_total_cmp;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum rows the recency window must contain before it is trusted;
/// below this the detector falls back to the full history.
const MIN_WINDOW_ROWS: usize = 10;

/// How a price level earned its place in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvidenceKind {
    /// Accumulated spread volume concentrated at this level
    Volume,
    /// Local maximum of the tick-index series
    SwingHigh,
    /// Local minimum of the tick-index series
    SwingLow,
}

impl EvidenceKind {
    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceKind::Volume => "Volume",
            EvidenceKind::SwingHigh => "Swing High",
            EvidenceKind::SwingLow => "Swing Low",
        }
    }
}

/// One detected support or resistance level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Level {
    /// Integer tick index (`round(price / tick_size)`)
    pub tick_index: i64,
    /// Price derived from the tick index
    pub price: f64,
    /// Evidence kinds contributing to this level
    pub evidence: BTreeSet<EvidenceKind>,
    /// Accumulated spread volume at this level
    pub volume: f64,
    /// Closes that landed exactly on this tick index in the window
    pub touch_count: usize,
    /// Swing extrema observed at this level
    pub swing_count: usize,
    /// Score in [0, 10]
    pub strength: f64,
    /// Absolute distance from the current price
    pub distance: f64,
    /// Distance in ticks
    pub distance_ticks: i64,
    /// Above the current price (resistance) or below (support)
    pub is_resistance: bool,
}

/// Directional bias derived from the last two closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DirectionBias {
    /// Latest close strictly above the prior close
    Up,
    /// Latest close strictly below the prior close
    Down,
    /// Latest close equal to the prior close
    Flat,
}

/// Support/resistance analysis for the current spread price.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportResistance {
    /// Latest spread close
    pub current_price: f64,
    /// Latest spread close quantized to ticks
    pub current_tick_index: i64,
    /// Bias from the last two closes
    pub direction: DirectionBias,
    /// Levels above the current price, ascending by distance
    pub resistance: Vec<Level>,
    /// Levels below the current price, ascending by distance
    pub support: Vec<Level>,
    /// Nearest level in the bias direction
    pub target: Option<Level>,
    /// Effective lookback in calendar days (recomputed on fallback)
    pub lookback_days: i64,
}

/// Registry entry accumulated while evidence is merged.
#[derive(Debug, Clone, Default)]
struct LevelDraft {
    evidence: BTreeSet<EvidenceKind>,
    volume: f64,
    touch_count: usize,
    swing_count: usize,
}

/// Mutable registry keyed by integer tick index with merge-not-overwrite
/// upsert semantics.
#[derive(Debug, Default)]
struct LevelRegistry {
    entries: BTreeMap<i64, LevelDraft>,
}

impl LevelRegistry {
    fn upsert(&mut self, tick_index: i64, touch_counts: &HashMap<i64, usize>) -> &mut LevelDraft {
        self.entries.entry(tick_index).or_insert_with(|| LevelDraft {
            touch_count: touch_counts.get(&tick_index).copied().unwrap_or(0),
            ..Default::default()
        })
    }
}

fn score_level(draft: &LevelDraft, max_volume: f64) -> f64 {
    let mut score = draft.evidence.len().min(3) as f64;

    // Confluence: volume concentration and a swing at the same level
    let has_volume = draft.evidence.contains(&EvidenceKind::Volume);
    let has_swing = draft.evidence.contains(&EvidenceKind::SwingHigh)
        || draft.evidence.contains(&EvidenceKind::SwingLow);
    if has_volume && has_swing {
        score += 3.0;
    }

    if max_volume > 0.0 {
        score += (draft.volume / max_volume) * 3.0;
    }
    score += (draft.touch_count as f64 / 10.0).min(1.0) * 2.0;
    score += (draft.swing_count as f64 / 3.0).min(1.0) * 2.0;

    ((score * 10.0).round() / 10.0).min(10.0)
}

/// Greedy minimum-distance filter over levels pre-sorted by descending
/// strength. Keeps at most `max_levels`, then re-sorts the survivors by
/// ascending distance for presentation.
fn filter_levels(candidates: Vec<Level>, min_distance: f64, max_levels: usize) -> Vec<Level> {
    let mut accepted: Vec<Level> = Vec::new();
    for level in candidates {
        if accepted.len() >= max_levels {
            break;
        }
        let far_enough = accepted
            .iter()
            .all(|a| (level.price - a.price).abs() >= min_distance);
        if far_enough {
            accepted.push(level);
        }
    }
    accepted.sort_by(|a, b| float_total_cmp(&a.distance, &b.distance));
    accepted
}

/// Detect support/resistance levels from the merged bar history.
///
/// Returns `None` when there are no bars at all. Level construction uses
/// the last `sr_lookback_days` of history; if fewer than 10 rows fall in
/// that window the full history is used instead and the effective lookback
/// becomes the realized calendar span.
pub fn detect_levels(bars: &[Bar], config: &SpreadConfig) -> Option<SupportResistance> {
    let last = bars.last()?;
    let tick_size = config.tick_size;

    let cutoff = last.timestamp - Duration::days(config.sr_lookback_days);
    let mut window: Vec<&Bar> = bars.iter().filter(|b| b.timestamp >= cutoff).collect();
    let mut lookback_days = config.sr_lookback_days;
    if window.len() < MIN_WINDOW_ROWS {
        window = bars.iter().collect();
        lookback_days = (last.date - bars[0].date).num_days();
    }

    let current_price = last.spread_close;
    let current_tick_index = (current_price / tick_size).round() as i64;
    let prev_price = if bars.len() > 1 {
        bars[bars.len() - 2].spread_close
    } else {
        current_price
    };

    let ticks: Vec<i64> = window
        .iter()
        .map(|b| (b.spread_close / tick_size).round() as i64)
        .collect();

    let mut touch_counts: HashMap<i64, usize> = HashMap::new();
    let mut volume_by_tick: HashMap<i64, f64> = HashMap::new();
    for (bar, &tick) in window.iter().zip(ticks.iter()) {
        *touch_counts.entry(tick).or_insert(0) += 1;
        *volume_by_tick.entry(tick).or_insert(0.0) += bar.spread_volume;
    }
    let max_volume = volume_by_tick
        .values()
        .copied()
        .fold(0.0f64, f64::max);

    let mut registry = LevelRegistry::default();

    // Volume nodes: top N*6 tick indices by accumulated volume
    let mut by_volume: Vec<(i64, f64)> = volume_by_tick.iter().map(|(&t, &v)| (t, v)).collect();
    by_volume.sort_by(|a, b| float_total_cmp(&b.1, &a.1).then(a.0.cmp(&b.0)));
    for &(tick, volume) in by_volume.iter().take(config.top_n_levels * 6) {
        let draft = registry.upsert(tick, &touch_counts);
        draft.evidence.insert(EvidenceKind::Volume);
        draft.volume += volume;
    }

    // Swing extrema over a centered rolling window; edge rows without a
    // complete window never qualify
    let w = config.swing_window;
    if ticks.len() >= w {
        let offset = (w - 1) / 2;
        for center in offset..=(ticks.len() - w + offset) {
            let start = center - offset;
            let slice = &ticks[start..start + w];
            let tick = ticks[center];
            if tick == *slice.iter().max().expect("window is non-empty") {
                let draft = registry.upsert(tick, &touch_counts);
                draft.evidence.insert(EvidenceKind::SwingHigh);
                draft.swing_count += 1;
            }
            if tick == *slice.iter().min().expect("window is non-empty") {
                let draft = registry.upsert(tick, &touch_counts);
                draft.evidence.insert(EvidenceKind::SwingLow);
                draft.swing_count += 1;
            }
        }
    }

    // Materialize levels, excluding the one the price is sitting on
    let mut candidates: Vec<Level> = Vec::with_capacity(registry.entries.len());
    for (&tick_index, draft) in &registry.entries {
        let price = tick_index as f64 * tick_size;
        let distance = (price - current_price).abs();
        let distance_ticks = (distance / tick_size).round() as i64;
        if distance_ticks == 0 {
            continue;
        }
        candidates.push(Level {
            tick_index,
            price,
            evidence: draft.evidence.clone(),
            volume: draft.volume,
            touch_count: draft.touch_count,
            swing_count: draft.swing_count,
            strength: score_level(draft, max_volume),
            distance,
            distance_ticks,
            is_resistance: price > current_price,
        });
    }

    let (mut resistance, mut support): (Vec<Level>, Vec<Level>) =
        candidates.into_iter().partition(|l| l.is_resistance);

    let by_strength_then_distance = |a: &Level, b: &Level| {
        float_total_cmp(&b.strength, &a.strength).then(float_total_cmp(&a.distance, &b.distance))
    };
    resistance.sort_by(by_strength_then_distance);
    support.sort_by(by_strength_then_distance);

    let min_distance = config.sr_min_distance_ticks as f64 * tick_size;
    let resistance = filter_levels(resistance, min_distance, config.top_n_levels);
    let support = filter_levels(support, min_distance, config.top_n_levels);

    let direction = if prev_price < current_price {
        DirectionBias::Up
    } else if prev_price > current_price {
        DirectionBias::Down
    } else {
        DirectionBias::Flat
    };

    let target = match direction {
        DirectionBias::Up => resistance.first().cloned(),
        DirectionBias::Down => support.first().cloned(),
        DirectionBias::Flat => resistance.first().or_else(|| support.first()).cloned(),
    };

    Some(SupportResistance {
        current_price,
        current_tick_index,
        direction,
        resistance,
        support,
        target,
        lookback_days,
    })
}
