use std::fs;
use std::path::Path;
use std::str::FromStr;

use chanlun::{DataError, Direction, Stroke, SwingKind, SwingPoint, TrendDirection, TrendState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// 买卖点类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Buy1,
    Buy2,
    Buy3,
    Sell1,
    Sell2,
    Sell3,
    Hold,
    Wait,
}

impl SignalKind {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy1 | Self::Buy2 | Self::Buy3)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Self::Sell1 | Self::Sell2 | Self::Sell3)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy1 => "buy1",
            Self::Buy2 => "buy2",
            Self::Buy3 => "buy3",
            Self::Sell1 => "sell1",
            Self::Sell2 => "sell2",
            Self::Sell3 => "sell3",
            Self::Hold => "hold",
            Self::Wait => "wait",
        }
    }
}

/// Selects signals by side or by exact kind, e.g. `buy`, `sell`, `sell2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFilter {
    Buy,
    Sell,
    Kind(SignalKind),
}

impl SignalFilter {
    pub fn matches(self, kind: SignalKind) -> bool {
        match self {
            Self::Buy => kind.is_buy(),
            Self::Sell => kind.is_sell(),
            Self::Kind(k) => k == kind,
        }
    }
}

impl FromStr for SignalFilter {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "buy" => return Ok(Self::Buy),
            "sell" => return Ok(Self::Sell),
            _ => {}
        }
        [
            SignalKind::Buy1,
            SignalKind::Buy2,
            SignalKind::Buy3,
            SignalKind::Sell1,
            SignalKind::Sell2,
            SignalKind::Sell3,
            SignalKind::Hold,
            SignalKind::Wait,
        ]
        .into_iter()
        .find(|k| k.as_str() == key)
        .map(Self::Kind)
        .ok_or_else(|| StrategyError::InvalidFilter(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub confidence: f64,
    pub risk: RiskLevel,
    pub position_size: f64,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub confidence_threshold: f64,
    pub swing_stop_pct: f64,
    pub swing_take_profit_pct: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalConfigPatch {
    pub confidence_threshold: Option<f64>,
    pub swing_stop_pct: Option<f64>,
    pub swing_take_profit_pct: Option<f64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            swing_stop_pct: 0.03,
            swing_take_profit_pct: 0.06,
        }
    }
}

impl SignalConfig {
    pub fn apply_patch(mut self, patch: SignalConfigPatch) -> Self {
        if let Some(v) = patch.confidence_threshold {
            self.confidence_threshold = v;
        }
        if let Some(v) = patch.swing_stop_pct {
            self.swing_stop_pct = v;
        }
        if let Some(v) = patch.swing_take_profit_pct {
            self.swing_take_profit_pct = v;
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        let patch: SignalConfigPatch = serde_yaml::from_str(yaml)?;
        Ok(Self::default().apply_patch(patch))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Turns the latest swing and the latest stroke transition into signals.
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Swing signal first, then the stroke-reversal signal. Anything below
    /// the confidence threshold is dropped.
    pub fn generate(
        &self,
        swings: &[SwingPoint],
        strokes: &[Stroke],
        trend: &TrendState,
    ) -> Vec<Signal> {
        let swing = swings.last().map(|s| self.swing_signal(s, trend));
        let reversal = self.reversal_signal(strokes);

        swing
            .into_iter()
            .chain(reversal)
            .filter(|s| s.confidence >= self.config.confidence_threshold)
            .collect()
    }

    fn swing_signal(&self, swing: &SwingPoint, trend: &TrendState) -> Signal {
        let base = (0.5 + swing.strength * 0.2).min(0.8);
        let agrees = matches!(
            (swing.kind, trend.direction),
            (SwingKind::Low, TrendDirection::Up) | (SwingKind::High, TrendDirection::Down)
        );
        let (confidence, risk) = if agrees {
            ((base + trend.strength * 0.2).min(0.95), RiskLevel::Low)
        } else if trend.direction == TrendDirection::Sideways {
            (base, RiskLevel::Medium)
        } else {
            ((base - 0.2).max(0.3), RiskLevel::High)
        };

        let stop = pct(self.config.swing_stop_pct);
        let take = pct(self.config.swing_take_profit_pct);
        let (kind, stop_loss, take_profit, label) = match swing.kind {
            SwingKind::Low => (
                SignalKind::Buy3,
                swing.price * (Decimal::ONE - stop),
                swing.price * (Decimal::ONE + take),
                "bottom swing buy",
            ),
            SwingKind::High => (
                SignalKind::Sell3,
                swing.price * (Decimal::ONE + stop),
                swing.price * (Decimal::ONE - take),
                "top swing sell",
            ),
        };

        Signal {
            kind,
            timestamp: swing.timestamp,
            price: swing.price,
            confidence,
            risk,
            position_size: (0.05 + confidence * 0.15).min(0.2),
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            description: format!("{label}, strength {:.2}", swing.strength),
        }
    }

    fn reversal_signal(&self, strokes: &[Stroke]) -> Option<Signal> {
        let [prev, current] = strokes.get(strokes.len().checked_sub(2)?..)? else {
            return None;
        };
        if prev.direction == current.direction {
            return None;
        }

        let length_ratio = if prev.length > Decimal::ZERO {
            (current.length / prev.length).to_f64().unwrap_or(1.0)
        } else {
            1.0
        };
        let confidence = (0.6 + (length_ratio - 1.0) * 0.3).clamp(0.0, 0.9);

        let (kind, take_profit, label) = match current.direction {
            Direction::Up => (
                SignalKind::Buy2,
                current.end.price + current.length,
                "stroke reversal buy",
            ),
            Direction::Down => (
                SignalKind::Sell2,
                current.end.price - current.length,
                "stroke reversal sell",
            ),
        };

        Some(Signal {
            kind,
            timestamp: current.end.timestamp,
            price: current.end.price,
            confidence,
            risk: RiskLevel::Medium,
            position_size: (0.1 + confidence * 0.1).min(0.25),
            stop_loss: Some(current.start.price),
            take_profit: Some(take_profit),
            description: format!("{label}, length ratio {length_ratio:.2}"),
        })
    }
}

fn pct(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

pub fn generate_signals(
    swings: &[SwingPoint],
    strokes: &[Stroke],
    trend: &TrendState,
    confidence_threshold: f64,
) -> Vec<Signal> {
    let config = SignalConfig {
        confidence_threshold,
        ..SignalConfig::default()
    };
    SignalGenerator::new(config).generate(swings, strokes, trend)
}

#[cfg(test)]
mod tests {
    use super::{SignalConfig, SignalFilter, SignalKind};

    #[test]
    fn patch_overrides_only_given_fields() {
        let config = SignalConfig::from_yaml_str("confidence_threshold: 0.7\n").unwrap();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.swing_stop_pct, 0.03);
        assert_eq!(config.swing_take_profit_pct, 0.06);
    }

    #[test]
    fn kind_sides() {
        assert!(SignalKind::Buy2.is_buy());
        assert!(SignalKind::Sell3.is_sell());
        assert!(!SignalKind::Hold.is_buy());
        assert!(!SignalKind::Wait.is_sell());
        assert_eq!(SignalKind::Buy2.as_str(), "buy2");
    }

    #[test]
    fn filter_parses_sides_and_kinds() {
        let buy: SignalFilter = "BUY".parse().unwrap();
        assert!(buy.matches(SignalKind::Buy1));
        assert!(buy.matches(SignalKind::Buy3));
        assert!(!buy.matches(SignalKind::Sell1));

        let sell2: SignalFilter = " sell2 ".parse().unwrap();
        assert_eq!(sell2, SignalFilter::Kind(SignalKind::Sell2));
        assert!(sell2.matches(SignalKind::Sell2));
        assert!(!sell2.matches(SignalKind::Sell1));

        assert!("buy4".parse::<SignalFilter>().is_err());
    }
}
