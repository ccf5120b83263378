mod account;
mod config;
mod engine;
mod error;
mod frame;
mod history;
mod metrics;

pub use account::{Account, OpenPosition, PositionState, Trade, QUANTITY_DP};
pub use config::{BacktestConfig, BacktestConfigPatch};
pub use engine::{run_backtest, BacktestEngine, BacktestResult};
pub use error::BacktestError;
pub use frame::trades_frame;
pub use history::{
    signal_history, HistoricalSignal, HistoryStats, SignalHistory, SignalHistoryReport,
    SignalPerformance, PERFORMANCE_LOOKBACK,
};
pub use metrics::Performance;
