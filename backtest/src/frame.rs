use chanlun::frame::decimal_f64;
use chanlun::DataError;
use polars::df;
use polars::prelude::DataFrame;

use crate::account::Trade;

pub fn trades_frame(trades: &[Trade]) -> Result<DataFrame, DataError> {
    Ok(df!(
        "entry_index" => trades.iter().map(|t| t.entry_index as u64).collect::<Vec<_>>(),
        "exit_index" => trades.iter().map(|t| t.exit_index as u64).collect::<Vec<_>>(),
        "entry_time" => trades.iter().map(|t| t.entry_time.timestamp_millis()).collect::<Vec<_>>(),
        "exit_time" => trades.iter().map(|t| t.exit_time.timestamp_millis()).collect::<Vec<_>>(),
        "entry_price" => trades.iter().map(|t| decimal_f64(t.entry_price)).collect::<Vec<_>>(),
        "exit_price" => trades.iter().map(|t| decimal_f64(t.exit_price)).collect::<Vec<_>>(),
        "shares" => trades.iter().map(|t| decimal_f64(t.shares)).collect::<Vec<_>>(),
        "profit" => trades.iter().map(|t| decimal_f64(t.profit)).collect::<Vec<_>>(),
        "return_rate" => trades.iter().map(|t| t.return_rate).collect::<Vec<_>>(),
        "signal" => trades.iter().map(|t| t.signal_kind.as_str()).collect::<Vec<_>>(),
        "forced" => trades.iter().map(|t| t.forced).collect::<Vec<_>>()
    )?)
}
