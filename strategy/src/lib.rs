mod backend;
mod decision;
mod error;
mod signal;

use chanlun::{validate_series, AnalysisProfileConfig, Bar, Timeframe};
use tracing::info;

pub use backend::{
    AnalysisBackend, AnalysisMetadata, FallbackBackend, MovingAverageBackend, RuleBasedBackend,
    StrategyAnalysis,
};
pub use decision::{DecisionAction, DecisionEngine, DecisionResult};
pub use error::StrategyError;
pub use signal::{
    generate_signals, RiskLevel, Signal, SignalConfig, SignalConfigPatch, SignalFilter,
    SignalGenerator, SignalKind,
};

pub struct Strategy {
    backend: Box<dyn AnalysisBackend + Send + Sync>,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(AnalysisProfileConfig::default(), SignalConfig::default())
    }
}

impl Strategy {
    /// Rule based analysis, falling back to the moving average backend.
    pub fn new(profile: AnalysisProfileConfig, signals: SignalConfig) -> Self {
        Self::with_backend(FallbackBackend::new(
            RuleBasedBackend::new(profile, signals),
            MovingAverageBackend::default(),
        ))
    }

    pub fn with_backend(backend: impl AnalysisBackend + Send + Sync + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn analyze(
        &self,
        bars: &[Bar],
        timeframe: Timeframe,
    ) -> Result<StrategyAnalysis, StrategyError> {
        validate_series(bars)?;
        let analysis = self.backend.analyze(bars, timeframe)?;
        info!(
            timeframe = %timeframe,
            bars = bars.len(),
            signals = analysis.signals.len(),
            backend = %analysis.metadata.backend,
            action = ?analysis.recommendation.action,
            "strategy analysis"
        );
        Ok(analysis)
    }
}
