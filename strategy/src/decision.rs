use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::signal::{RiskLevel, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionAction {
    Buy,
    Sell,
    Wait,
}

/// 交易建议。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub action: DecisionAction,
    pub reason: String,
    pub confidence: f64,
    pub position_size: f64,
    pub price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub risk: Option<RiskLevel>,
}

impl DecisionResult {
    pub fn wait(reason: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Wait,
            reason: reason.into(),
            confidence: 0.0,
            position_size: 0.0,
            price: None,
            stop_loss: None,
            take_profit: None,
            risk: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    /// Follows the most confident signal; ties keep the earlier one.
    pub fn evaluate(&self, signals: &[Signal]) -> DecisionResult {
        let best = signals.iter().fold(None::<&Signal>, |best, s| match best {
            Some(b) if b.confidence >= s.confidence => Some(b),
            _ => Some(s),
        });
        let Some(best) = best else {
            return DecisionResult::wait("no clear signal");
        };

        let action = if best.kind.is_buy() {
            DecisionAction::Buy
        } else if best.kind.is_sell() {
            DecisionAction::Sell
        } else {
            DecisionAction::Wait
        };

        DecisionResult {
            action,
            reason: best.description.clone(),
            confidence: best.confidence,
            position_size: best.position_size,
            price: Some(best.price),
            stop_loss: best.stop_loss,
            take_profit: best.take_profit,
            risk: Some(best.risk),
        }
    }
}
