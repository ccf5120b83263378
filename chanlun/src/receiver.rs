use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::bar::{validate_series, Bar};
use crate::constant::DataError;

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    #[serde(alias = "datetime", alias = "timestamp")]
    open_time: String,
    #[serde(default)]
    close_time: Option<String>,
    #[serde(alias = "open_price")]
    open: String,
    #[serde(alias = "high_price")]
    high: String,
    #[serde(alias = "low_price")]
    low: String,
    #[serde(alias = "close_price")]
    close: String,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
    #[serde(default, alias = "trades_count")]
    trade_count: Option<u64>,
    #[serde(default)]
    taker_buy_volume: Option<String>,
    #[serde(default)]
    taker_buy_quote_volume: Option<String>,
}

/// Loads an ordered bar series from a CSV file with a header row.
///
/// A missing `close_time` column means one-minute bars.
pub fn load_bars_csv(file_path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    let file_path = file_path.as_ref();
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut out = Vec::new();

    for (index, row) in reader.deserialize::<CsvBarRow>().enumerate() {
        let row = row?;
        let open_time = parse_datetime(&row.open_time)?;
        let close_time = match row.close_time.as_deref() {
            Some(v) if !v.trim().is_empty() => parse_datetime(v)?,
            _ => open_time + Duration::minutes(1),
        };
        let bar = Bar {
            open_time,
            close_time,
            open: parse_decimal(&row.open, index)?,
            high: parse_decimal(&row.high, index)?,
            low: parse_decimal(&row.low, index)?,
            close: parse_decimal(&row.close, index)?,
            volume: parse_optional(row.volume.as_deref(), index)?,
            quote_volume: parse_optional(row.quote_volume.as_deref(), index)?,
            trade_count: row.trade_count.unwrap_or_default(),
            taker_buy_volume: parse_optional(row.taker_buy_volume.as_deref(), index)?,
            taker_buy_quote_volume: parse_optional(row.taker_buy_quote_volume.as_deref(), index)?,
        };
        out.push(bar);
    }

    validate_series(&out)?;
    info!(path = %file_path.display(), rows = out.len(), "loaded bars");
    Ok(out)
}

fn parse_decimal(value: &str, index: usize) -> Result<Decimal, DataError> {
    Decimal::from_str(value.trim()).map_err(|e| DataError::InvalidBar {
        index,
        reason: format!("bad number {value:?}: {e}"),
    })
}

fn parse_optional(value: Option<&str>, index: usize) -> Result<Decimal, DataError> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_decimal(v, index),
        _ => Ok(Decimal::ZERO),
    }
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, DataError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let patterns = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
    ];

    for pattern in patterns {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    if let Ok(millis) = value.parse::<i64>() {
        if let Some(dt) = DateTime::<Utc>::from_timestamp_millis(millis) {
            return Ok(dt);
        }
    }

    Err(DataError::InvalidDatetime(value.to_string()))
}
