use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constant::DataError;

/// One OHLCV interval `[open_time, close_time)`.
///
/// Prices and volumes are exact decimals. Construct through [`Bar::new`] to
/// get the invariant checks; pipeline entry points re-check whole series with
/// [`validate_series`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub quote_volume: Decimal,
    #[serde(default)]
    pub trade_count: u64,
    #[serde(default)]
    pub taker_buy_volume: Decimal,
    #[serde(default)]
    pub taker_buy_quote_volume: Decimal,
}

impl Bar {
    pub fn new(
        open_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, DataError> {
        let bar = Self {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
            quote_volume: Decimal::ZERO,
            trade_count: 0,
            taker_buy_volume: Decimal::ZERO,
            taker_buy_quote_volume: Decimal::ZERO,
        };
        bar.validate()?;
        Ok(bar)
    }

    pub fn with_flow(
        mut self,
        quote_volume: Decimal,
        trade_count: u64,
        taker_buy_volume: Decimal,
        taker_buy_quote_volume: Decimal,
    ) -> Self {
        self.quote_volume = quote_volume;
        self.trade_count = trade_count;
        self.taker_buy_volume = taker_buy_volume;
        self.taker_buy_quote_volume = taker_buy_quote_volume;
        self
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    pub fn validate(&self) -> Result<(), DataError> {
        match self.violation() {
            Some(reason) => Err(DataError::InvalidBar {
                index: 0,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn violation(&self) -> Option<&'static str> {
        if self.open_time >= self.close_time {
            return Some("open_time must precede close_time");
        }
        if self.low > self.high {
            return Some("low above high");
        }
        if self.open < self.low || self.open > self.high {
            return Some("open outside [low, high]");
        }
        if self.close < self.low || self.close > self.high {
            return Some("close outside [low, high]");
        }
        if self.volume < Decimal::ZERO {
            return Some("negative volume");
        }
        None
    }
}

/// Checks every bar and the strict `open_time` ordering of the series.
pub fn validate_series(bars: &[Bar]) -> Result<(), DataError> {
    for (index, bar) in bars.iter().enumerate() {
        if let Some(reason) = bar.violation() {
            return Err(DataError::InvalidBar {
                index,
                reason: reason.to_string(),
            });
        }
        if index > 0 && bars[index - 1].open_time >= bar.open_time {
            return Err(DataError::InvalidBar {
                index,
                reason: "open_time not strictly increasing".to_string(),
            });
        }
    }
    Ok(())
}
