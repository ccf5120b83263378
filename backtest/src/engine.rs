use chanlun::{aggregate, Bar, Timeframe};
use rust_decimal::Decimal;
use serde::Serialize;
use strategy::{AnalysisBackend, RuleBasedBackend};
use tracing::{debug, info, warn};

use crate::account::{Account, Trade};
use crate::config::BacktestConfig;
use crate::error::BacktestError;
use crate::metrics::Performance;

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub final_capital: Decimal,
    pub trades: Vec<Trade>,
    pub performance: Performance,
    pub windows: usize,
    pub skipped_windows: usize,
}

/// Replays the analysis over sliding windows and trades one long position.
pub struct BacktestEngine<B> {
    config: BacktestConfig,
    backend: B,
}

impl BacktestEngine<RuleBasedBackend> {
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        Self::with_backend(config, RuleBasedBackend::default())
    }
}

impl<B: AnalysisBackend> BacktestEngine<B> {
    pub fn with_backend(config: BacktestConfig, backend: B) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// `bars` are aggregated to `period` first. Window `i` covers
    /// `bars[i - window..i]` and trades at the close of `bars[i - 1]`.
    pub fn run(&self, bars: &[Bar], period: Timeframe) -> Result<BacktestResult, BacktestError> {
        let bars = aggregate(bars, period)?;
        let cfg = &self.config;
        let mut account = Account::new(cfg.initial_capital);
        let mut windows = 0;
        let mut skipped_windows = 0;

        for i in (cfg.window..bars.len()).step_by(cfg.step) {
            windows += 1;
            let signal = match self.backend.analyze(&bars[i - cfg.window..i], period) {
                Ok(analysis) => analysis.latest_signal().cloned(),
                Err(err) => {
                    warn!(window = i, error = %err, "window analysis failed, skipped");
                    skipped_windows += 1;
                    None
                }
            };
            let Some(signal) = signal else {
                continue;
            };

            let bar = &bars[i - 1];
            if signal.kind.is_buy() && account.is_flat() {
                if account.open_long(i - 1, bar.close_time, bar.close, &signal) {
                    debug!(window = i, price = %bar.close, kind = signal.kind.as_str(), "open long");
                }
            } else if signal.kind.is_sell() && !account.is_flat() {
                if let Some(trade) = account.close_long(i - 1, bar.close_time, bar.close, false) {
                    debug!(window = i, price = %bar.close, profit = %trade.profit, "close long");
                }
            }
        }

        if let Some(last) = bars.last().filter(|_| !account.is_flat()) {
            account.close_long(bars.len() - 1, last.close_time, last.close, true);
        }

        let final_capital = account.cash();
        let trades = account.into_trades();
        let performance = Performance::compute(&trades, cfg.initial_capital, final_capital);
        info!(
            timeframe = %period,
            bars = bars.len(),
            windows,
            skipped_windows,
            trades = trades.len(),
            total_return = performance.total_return,
            "backtest finished"
        );

        Ok(BacktestResult {
            timeframe: period,
            bar_count: bars.len(),
            final_capital,
            trades,
            performance,
            windows,
            skipped_windows,
        })
    }
}

/// Backtest with the rule based backend and default analysis settings.
pub fn run_backtest(
    bars: &[Bar],
    period: Timeframe,
    initial_capital: Decimal,
    window: usize,
    step: usize,
) -> Result<BacktestResult, BacktestError> {
    let config = BacktestConfig {
        window,
        step,
        initial_capital,
    };
    BacktestEngine::new(config)?.run(bars, period)
}
