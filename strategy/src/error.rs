use chanlun::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("backend {backend} failed: {reason}")]
    Backend { backend: String, reason: String },
    #[error("unknown signal filter {0:?}")]
    InvalidFilter(String),
}
