//! 历史信号回放：按固定步长在历史 bar 上滑动分析窗口，
//! 每个窗口只保留最新的一个信号。

use chanlun::{aggregate, Bar, Timeframe};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use strategy::{AnalysisBackend, RuleBasedBackend, Signal, SignalFilter};
use tracing::{info, warn};

use crate::error::BacktestError;

/// Closes averaged into the reference price for signal performance.
pub const PERFORMANCE_LOOKBACK: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSignal {
    pub batch_index: usize,
    #[serde(flatten)]
    pub signal: Signal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub buy: usize,
    pub sell: usize,
    pub average_confidence: f64,
    /// Signals per day of the scanned span.
    pub signal_frequency: f64,
}

/// Each signal priced against the mean of the last closes of the series.
/// Sells score the inverted move. Percent values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalPerformance {
    pub total_signals: usize,
    pub profitable_signals: usize,
    pub win_rate: f64,
    pub average_return: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalHistoryReport {
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub signals: Vec<HistoricalSignal>,
    pub stats: HistoryStats,
    pub performance: SignalPerformance,
}

pub struct SignalHistory<B> {
    backend: B,
    window: usize,
    step: usize,
    filter: Option<SignalFilter>,
}

impl SignalHistory<RuleBasedBackend> {
    pub fn new() -> Self {
        Self::with_backend(RuleBasedBackend::default())
    }
}

impl Default for SignalHistory<RuleBasedBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AnalysisBackend> SignalHistory<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            window: 50,
            step: 100,
            filter: None,
        }
    }

    pub fn window(mut self, window: usize, step: usize) -> Self {
        self.window = window;
        self.step = step;
        self
    }

    /// Keep only batches whose latest signal matches.
    pub fn filter(mut self, filter: Option<SignalFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Batch `i` analyzes `bars[i - window..=i]` for `i` in `window..len`.
    pub fn scan(&self, bars: &[Bar], timeframe: Timeframe) -> Result<SignalHistoryReport, BacktestError> {
        if self.window == 0 || self.step == 0 {
            return Err(BacktestError::InvalidConfig(format!(
                "history window {} and step {} must be positive",
                self.window, self.step
            )));
        }
        let bars = aggregate(bars, timeframe)?;
        let mut signals = Vec::new();

        for i in (self.window..bars.len()).step_by(self.step) {
            match self.backend.analyze(&bars[i - self.window..=i], timeframe) {
                Ok(analysis) => {
                    let Some(signal) = analysis.latest_signal() else {
                        continue;
                    };
                    if self.filter.is_some_and(|f| !f.matches(signal.kind)) {
                        continue;
                    }
                    signals.push(HistoricalSignal {
                        batch_index: i,
                        signal: signal.clone(),
                    });
                }
                Err(err) => warn!(batch = i, error = %err, "history batch failed, skipped"),
            }
        }

        let stats = stats(&signals, span_days(&bars));
        let performance = performance(&signals, &bars);
        info!(
            timeframe = %timeframe,
            bars = bars.len(),
            signals = stats.total,
            win_rate = performance.win_rate,
            "signal history scanned"
        );
        Ok(SignalHistoryReport {
            timeframe,
            bar_count: bars.len(),
            signals,
            stats,
            performance,
        })
    }
}

fn span_days(bars: &[Bar]) -> f64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (last.close_time - first.open_time).num_seconds() as f64 / 86_400.0,
        _ => 0.0,
    }
}

fn stats(signals: &[HistoricalSignal], days: f64) -> HistoryStats {
    let total = signals.len();
    HistoryStats {
        total,
        buy: signals.iter().filter(|s| s.signal.kind.is_buy()).count(),
        sell: signals.iter().filter(|s| s.signal.kind.is_sell()).count(),
        average_confidence: signals.iter().map(|s| s.signal.confidence).sum::<f64>()
            / total.max(1) as f64,
        // spans under a day count as one day
        signal_frequency: total as f64 / days.max(1.0),
    }
}

fn performance(signals: &[HistoricalSignal], bars: &[Bar]) -> SignalPerformance {
    let tail = &bars[bars.len().saturating_sub(PERFORMANCE_LOOKBACK)..];
    if signals.is_empty() || tail.is_empty() {
        return SignalPerformance::default();
    }
    let reference = tail.iter().map(|b| b.close).sum::<Decimal>() / Decimal::from(tail.len());

    let mut profitable = 0;
    let mut total_return = 0.0;
    for s in signals {
        let price = s.signal.price;
        if price <= Decimal::ZERO {
            continue;
        }
        let side = if s.signal.kind.is_buy() {
            reference - price
        } else if s.signal.kind.is_sell() {
            price - reference
        } else {
            continue;
        };
        let rate = (side / price).to_f64().unwrap_or(0.0);
        if rate > 0.0 {
            profitable += 1;
        }
        total_return += rate;
    }

    let n = signals.len() as f64;
    SignalPerformance {
        total_signals: signals.len(),
        profitable_signals: profitable,
        win_rate: profitable as f64 / n * 100.0,
        average_return: total_return / n * 100.0,
    }
}

pub fn signal_history(
    bars: &[Bar],
    timeframe: Timeframe,
    window: usize,
    step: usize,
) -> Result<SignalHistoryReport, BacktestError> {
    SignalHistory::new().window(window, step).scan(bars, timeframe)
}
