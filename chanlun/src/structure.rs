//! 走势结构分析。
//!
//! 由最近的收盘价变化与最近若干笔的上涨长度占比共同决定趋势方向与强度，
//! 并从分型点中提取支撑/阻力位。每次调用都从输入重新计算，不保留状态。

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::config::AnalysisConfig;
use crate::constant::{Direction, MarketPhase, SwingKind, TrendDirection};
use crate::stroke::Stroke;
use crate::swing::SwingPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendState {
    pub direction: TrendDirection,
    pub strength: f64,
    pub price_change: f64,
    pub up_ratio: f64,
    pub stroke_count: usize,
    pub phase: MarketPhase,
    pub support_levels: Vec<Decimal>,
    pub resistance_levels: Vec<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct StructureAnalyzer {
    config: AnalysisConfig,
}

impl StructureAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Levels come from the stroke endpoints.
    pub fn analyze(&self, bars: &[Bar], strokes: &[Stroke]) -> TrendState {
        let mut swings = strokes
            .iter()
            .flat_map(|s| [s.start.clone(), s.end.clone()])
            .collect::<Vec<_>>();
        swings.sort_by_key(|s| s.index);
        swings.dedup_by_key(|s| s.index);
        self.analyze_with_swings(bars, &swings, strokes)
    }

    pub fn analyze_with_swings(
        &self,
        bars: &[Bar],
        swings: &[SwingPoint],
        strokes: &[Stroke],
    ) -> TrendState {
        let cfg = &self.config;
        let price_change = self.price_change(bars);
        let recent = &strokes[strokes.len().saturating_sub(cfg.trend_stroke_window)..];

        let up_ratio = if strokes.len() >= cfg.trend_stroke_window {
            let total: Decimal = recent.iter().map(|s| s.length).sum();
            let up: Decimal = recent
                .iter()
                .filter(|s| s.direction == Direction::Up)
                .map(|s| s.length)
                .sum();
            if total > Decimal::ZERO {
                (up / total).to_f64().unwrap_or(0.5)
            } else {
                0.5
            }
        } else if price_change >= 0.0 {
            0.5
        } else {
            0.3
        };

        let (direction, strength) = if price_change > cfg.trend_threshold
            && up_ratio > cfg.up_ratio_bull
        {
            let s = price_change.abs() * 10.0 + (up_ratio - 0.5) * 2.0;
            (TrendDirection::Up, s.min(1.0))
        } else if price_change < -cfg.trend_threshold && up_ratio < cfg.up_ratio_bear {
            let s = price_change.abs() * 10.0 + (0.5 - up_ratio) * 2.0;
            (TrendDirection::Down, s.min(1.0))
        } else {
            (TrendDirection::Sideways, cfg.sideways_strength)
        };

        let (support_levels, resistance_levels) = self.levels(swings);

        TrendState {
            direction,
            strength,
            price_change,
            up_ratio,
            stroke_count: recent.len(),
            phase: market_phase(strokes),
            support_levels,
            resistance_levels,
        }
    }

    fn price_change(&self, bars: &[Bar]) -> f64 {
        let lookback = self.config.trend_lookback;
        if lookback == 0 || bars.len() < lookback {
            return 0.0;
        }
        let start = bars[bars.len() - lookback].close;
        let end = bars[bars.len() - 1].close;
        if start.is_zero() {
            return 0.0;
        }
        ((end - start) / start).to_f64().unwrap_or(0.0)
    }

    fn levels(&self, swings: &[SwingPoint]) -> (Vec<Decimal>, Vec<Decimal>) {
        let n = self.config.level_count;
        let mut supports = swings
            .iter()
            .filter(|s| s.kind == SwingKind::Low)
            .map(|s| s.price)
            .collect::<Vec<_>>();
        supports.sort();
        supports.truncate(n);

        let mut resistances = swings
            .iter()
            .filter(|s| s.kind == SwingKind::High)
            .map(|s| s.price)
            .collect::<Vec<_>>();
        resistances.sort_by(|a, b| b.cmp(a));
        resistances.truncate(n);

        (supports, resistances)
    }
}

pub fn market_phase(strokes: &[Stroke]) -> MarketPhase {
    if strokes.len() < 3 {
        return MarketPhase::Insufficient;
    }
    let dirs = strokes[strokes.len() - 3..]
        .iter()
        .map(|s| s.direction)
        .collect::<Vec<_>>();
    match dirs.as_slice() {
        [Direction::Down, Direction::Up, Direction::Down] => MarketPhase::Adjustment,
        [Direction::Up, Direction::Down, Direction::Up] => MarketPhase::Rising,
        [Direction::Up, Direction::Up, Direction::Up] => MarketPhase::StrongRally,
        [Direction::Down, Direction::Down, Direction::Down] => MarketPhase::StrongDecline,
        _ => MarketPhase::Ranging,
    }
}

pub fn analyze_structure(bars: &[Bar], strokes: &[Stroke]) -> TrendState {
    StructureAnalyzer::default().analyze(bars, strokes)
}
