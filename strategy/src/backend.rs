//! 分析后端。
//!
//! 规则后端跑完整的分型/笔/走势/信号流程；均线后端是简化分析，
//! 在主后端不可用时由 `FallbackBackend` 接手。

use chanlun::{
    validate_series, AnalysisProfileConfig, Bar, StructurePipeline, StructureSnapshot, Timeframe,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use tracing::{debug, warn};

use crate::decision::{DecisionEngine, DecisionResult};
use crate::error::StrategyError;
use crate::signal::{RiskLevel, Signal, SignalConfig, SignalGenerator, SignalKind};

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub backend: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyAnalysis {
    pub signals: Vec<Signal>,
    /// `None` when the backend does not compute swing structure.
    pub structure: Option<StructureSnapshot>,
    pub recommendation: DecisionResult,
    pub metadata: AnalysisMetadata,
}

impl StrategyAnalysis {
    pub fn latest_signal(&self) -> Option<&Signal> {
        self.signals.last()
    }
}

pub trait AnalysisBackend {
    fn name(&self) -> &str;

    /// `bars` are already at `timeframe`.
    fn analyze(&self, bars: &[Bar], timeframe: Timeframe)
        -> Result<StrategyAnalysis, StrategyError>;
}

impl<T: AnalysisBackend + ?Sized> AnalysisBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn analyze(
        &self,
        bars: &[Bar],
        timeframe: Timeframe,
    ) -> Result<StrategyAnalysis, StrategyError> {
        (**self).analyze(bars, timeframe)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleBasedBackend {
    profile: AnalysisProfileConfig,
    signals: SignalConfig,
}

impl RuleBasedBackend {
    pub fn new(profile: AnalysisProfileConfig, signals: SignalConfig) -> Self {
        Self { profile, signals }
    }
}

impl AnalysisBackend for RuleBasedBackend {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn analyze(
        &self,
        bars: &[Bar],
        timeframe: Timeframe,
    ) -> Result<StrategyAnalysis, StrategyError> {
        validate_series(bars)?;
        let pipeline = StructurePipeline::new(self.profile.resolve_for(timeframe));
        let structure = pipeline.run(bars);
        let signals = SignalGenerator::new(self.signals.clone()).generate(
            &structure.swings,
            &structure.strokes,
            &structure.trend,
        );
        let recommendation = DecisionEngine.evaluate(&signals);
        debug!(
            timeframe = %timeframe,
            swings = structure.swings.len(),
            strokes = structure.strokes.len(),
            signals = signals.len(),
            "rule based analysis"
        );

        Ok(StrategyAnalysis {
            signals,
            structure: Some(structure),
            recommendation,
            metadata: metadata(timeframe, bars.len(), self.name()),
        })
    }
}

/// Short/long close average comparison over the most recent bars.
#[derive(Debug, Clone)]
pub struct MovingAverageBackend {
    pub short_period: usize,
    pub long_period: usize,
    pub band: f64,
}

impl Default for MovingAverageBackend {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 10,
            band: 0.01,
        }
    }
}

impl MovingAverageBackend {
    fn average(closes: &[Decimal], period: usize, fallback: Decimal) -> Decimal {
        if period == 0 || closes.len() < period {
            return fallback;
        }
        let window = &closes[closes.len() - period..];
        window.iter().copied().sum::<Decimal>() / Decimal::from(period)
    }
}

impl AnalysisBackend for MovingAverageBackend {
    fn name(&self) -> &str {
        "moving_average"
    }

    fn analyze(
        &self,
        bars: &[Bar],
        timeframe: Timeframe,
    ) -> Result<StrategyAnalysis, StrategyError> {
        validate_series(bars)?;
        let mut signals = Vec::new();

        if let Some(last) = bars.last() {
            let closes = bars.iter().map(|b| b.close).collect::<Vec<_>>();
            let short = Self::average(&closes, self.short_period, last.close);
            let long = Self::average(&closes, self.long_period, last.close);
            let band = Decimal::from_f64(self.band).unwrap_or(Decimal::ZERO);

            let crossed = if short > long * (Decimal::ONE + band) {
                Some((SignalKind::Buy1, "short average above long average"))
            } else if short < long * (Decimal::ONE - band) {
                Some((SignalKind::Sell1, "short average below long average"))
            } else {
                None
            };

            if let Some((kind, description)) = crossed {
                signals.push(Signal {
                    kind,
                    timestamp: last.open_time,
                    price: last.close,
                    confidence: 0.5,
                    risk: RiskLevel::Medium,
                    position_size: 0.1,
                    stop_loss: None,
                    take_profit: None,
                    description: description.to_string(),
                });
            }
        }

        let recommendation = DecisionEngine.evaluate(&signals);
        Ok(StrategyAnalysis {
            signals,
            structure: None,
            recommendation,
            metadata: metadata(timeframe, bars.len(), self.name()),
        })
    }
}

/// Runs `primary`, and `fallback` whenever `primary` errors.
#[derive(Debug, Clone, Default)]
pub struct FallbackBackend<P, F> {
    primary: P,
    fallback: F,
}

impl<P: AnalysisBackend, F: AnalysisBackend> FallbackBackend<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: AnalysisBackend, F: AnalysisBackend> AnalysisBackend for FallbackBackend<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn analyze(
        &self,
        bars: &[Bar],
        timeframe: Timeframe,
    ) -> Result<StrategyAnalysis, StrategyError> {
        match self.primary.analyze(bars, timeframe) {
            Ok(analysis) => Ok(analysis),
            Err(err) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %err,
                    "primary backend failed, falling back"
                );
                self.fallback.analyze(bars, timeframe)
            }
        }
    }
}

fn metadata(timeframe: Timeframe, bar_count: usize, backend: &str) -> AnalysisMetadata {
    AnalysisMetadata {
        timeframe,
        bar_count,
        backend: backend.to_string(),
        analyzed_at: Utc::now(),
    }
}
