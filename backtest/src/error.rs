use chanlun::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("invalid backtest config: {0}")]
    InvalidConfig(String),
}
