use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constant::{Const, DataError, Direction, SwingKind};
use crate::swing::SwingPoint;

/// A directional move between two opposite-kind swing points (笔).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub start: SwingPoint,
    pub end: SwingPoint,
    pub direction: Direction,
    pub length: Decimal,
    pub bar_span: usize,
    #[serde(with = "duration_secs")]
    pub time_span: Duration,
}

impl Stroke {
    /// `None` when both swings have the same kind.
    pub fn between(start: &SwingPoint, end: &SwingPoint) -> Option<Self> {
        if start.kind == end.kind {
            return None;
        }
        let direction = match start.kind {
            SwingKind::Low => Direction::Up,
            SwingKind::High => Direction::Down,
        };
        Some(Self {
            start: start.clone(),
            end: end.clone(),
            direction,
            length: (end.price - start.price).abs(),
            bar_span: end.index.abs_diff(start.index),
            time_span: end.timestamp - start.timestamp,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrokeBuilder;

impl StrokeBuilder {
    /// Pairs consecutive swings and keeps only the opposite-kind pairs, so a
    /// run of same-kind swings never yields a stroke of its own.
    pub fn build(&self, swings: &[SwingPoint]) -> Vec<Stroke> {
        swings
            .windows(2)
            .filter_map(|pair| Stroke::between(&pair[0], &pair[1]))
            .collect()
    }

    pub fn try_build(&self, swings: &[SwingPoint]) -> Result<Vec<Stroke>, DataError> {
        if swings.len() < Const::MIN_STROKE_SWINGS {
            return Err(DataError::InsufficientData {
                required: Const::MIN_STROKE_SWINGS,
                actual: swings.len(),
            });
        }
        Ok(self.build(swings))
    }
}

pub fn build_strokes(swings: &[SwingPoint]) -> Vec<Stroke> {
    StrokeBuilder.build(swings)
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}
