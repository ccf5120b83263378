use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::config::AnalysisConfig;
use crate::constant::{Const, DataError, SwingKind};

/// A local extremum found on a three-bar neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub kind: SwingKind,
    pub strength: f64,
}

/// Three-bar rule: the whole bar sits strictly beyond both neighbours. With
/// `inclusive_opposite` the side away from the extreme may tie a neighbour.
/// A bar that strictly engulfs or sits strictly inside a neighbour matches
/// neither side.
pub fn classify(
    left: &Bar,
    middle: &Bar,
    right: &Bar,
    inclusive_opposite: bool,
) -> Option<SwingKind> {
    let above = |a: Decimal, b: Decimal| a > b || (inclusive_opposite && a == b);

    let is_top = middle.high > left.high
        && middle.high > right.high
        && above(middle.low, left.low)
        && above(middle.low, right.low);
    if is_top {
        return Some(SwingKind::High);
    }

    let is_bottom = middle.low < left.low
        && middle.low < right.low
        && above(left.high, middle.high)
        && above(right.high, middle.high);
    if is_bottom {
        return Some(SwingKind::Low);
    }
    None
}

#[derive(Debug, Clone)]
pub struct SwingDetector {
    strength_min: f64,
    strength_max: f64,
    inclusive_opposite: bool,
}

impl Default for SwingDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl SwingDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            strength_min: config.strength_min,
            strength_max: config.strength_max,
            inclusive_opposite: config.swing_inclusive_opposite,
        }
    }

    pub fn detect(&self, bars: &[Bar]) -> Vec<SwingPoint> {
        if bars.len() < Const::MIN_SWING_BARS {
            return Vec::new();
        }

        let mut out = Vec::new();
        for i in 1..bars.len() - 1 {
            let (left, middle, right) = (&bars[i - 1], &bars[i], &bars[i + 1]);
            let Some(kind) = classify(left, middle, right, self.inclusive_opposite) else {
                continue;
            };
            let price = match kind {
                SwingKind::High => middle.high,
                SwingKind::Low => middle.low,
            };
            out.push(SwingPoint {
                index: i,
                timestamp: middle.open_time,
                price,
                kind,
                strength: self.strength(left, middle, right),
            });
        }
        out
    }

    /// Like [`detect`](Self::detect) but reports a too-short input instead of
    /// returning an empty list.
    pub fn try_detect(&self, bars: &[Bar]) -> Result<Vec<SwingPoint>, DataError> {
        if bars.len() < Const::MIN_SWING_BARS {
            return Err(DataError::InsufficientData {
                required: Const::MIN_SWING_BARS,
                actual: bars.len(),
            });
        }
        Ok(self.detect(bars))
    }

    fn strength(&self, left: &Bar, middle: &Bar, right: &Bar) -> f64 {
        let avg = (left.range() + middle.range() + right.range()) / Decimal::from(3);
        if avg <= Decimal::ZERO {
            return 1.0;
        }
        let ratio = (middle.range() / avg).to_f64().unwrap_or(1.0);
        ratio.max(self.strength_min).min(self.strength_max)
    }
}

pub fn detect_swings(bars: &[Bar]) -> Vec<SwingPoint> {
    SwingDetector::default().detect(bars)
}
