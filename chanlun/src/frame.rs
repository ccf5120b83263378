//! Dataframe views of pipeline output, for display and parquet export.

use std::fs::{create_dir_all, File};
use std::path::Path;

use polars::df;
use polars::prelude::{DataFrame, ParquetWriter};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::bar::Bar;
use crate::constant::{DataError, Direction, SwingKind, Timeframe};
use crate::engine::StructureSnapshot;
use crate::stroke::Stroke;
use crate::swing::SwingPoint;

pub fn decimal_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

pub fn bars_frame(bars: &[Bar]) -> Result<DataFrame, DataError> {
    Ok(df!(
        "open_time" => bars.iter().map(|b| b.open_time.timestamp_millis()).collect::<Vec<_>>(),
        "close_time" => bars.iter().map(|b| b.close_time.timestamp_millis()).collect::<Vec<_>>(),
        "open" => bars.iter().map(|b| decimal_f64(b.open)).collect::<Vec<_>>(),
        "high" => bars.iter().map(|b| decimal_f64(b.high)).collect::<Vec<_>>(),
        "low" => bars.iter().map(|b| decimal_f64(b.low)).collect::<Vec<_>>(),
        "close" => bars.iter().map(|b| decimal_f64(b.close)).collect::<Vec<_>>(),
        "volume" => bars.iter().map(|b| decimal_f64(b.volume)).collect::<Vec<_>>(),
        "trade_count" => bars.iter().map(|b| b.trade_count).collect::<Vec<_>>()
    )?)
}

pub fn swings_frame(swings: &[SwingPoint]) -> Result<DataFrame, DataError> {
    Ok(df!(
        "index" => swings.iter().map(|s| s.index as u64).collect::<Vec<_>>(),
        "timestamp" => swings.iter().map(|s| s.timestamp.timestamp_millis()).collect::<Vec<_>>(),
        "price" => swings.iter().map(|s| decimal_f64(s.price)).collect::<Vec<_>>(),
        "kind" => swings.iter().map(|s| kind_label(s.kind)).collect::<Vec<_>>(),
        "strength" => swings.iter().map(|s| s.strength).collect::<Vec<_>>()
    )?)
}

pub fn strokes_frame(strokes: &[Stroke]) -> Result<DataFrame, DataError> {
    Ok(df!(
        "start_index" => strokes.iter().map(|s| s.start.index as u64).collect::<Vec<_>>(),
        "end_index" => strokes.iter().map(|s| s.end.index as u64).collect::<Vec<_>>(),
        "start_price" => strokes.iter().map(|s| decimal_f64(s.start.price)).collect::<Vec<_>>(),
        "end_price" => strokes.iter().map(|s| decimal_f64(s.end.price)).collect::<Vec<_>>(),
        "direction" => strokes
            .iter()
            .map(|s| match s.direction {
                Direction::Up => "up",
                Direction::Down => "down",
            })
            .collect::<Vec<_>>(),
        "length" => strokes.iter().map(|s| decimal_f64(s.length)).collect::<Vec<_>>(),
        "bar_span" => strokes.iter().map(|s| s.bar_span as u64).collect::<Vec<_>>()
    )?)
}

pub fn write_parquet(frame: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), DataError> {
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(frame)?;
    Ok(())
}

/// Writes `bars_<tf>`, `swings_<tf>` and `strokes_<tf>` parquet files.
pub fn write_snapshot_parquet(
    timeframe: Timeframe,
    bars: &[Bar],
    snapshot: &StructureSnapshot,
    output_dir: impl AsRef<Path>,
) -> Result<(), DataError> {
    let output_dir = output_dir.as_ref();
    create_dir_all(output_dir)?;
    let tf = timeframe.as_str();

    write_parquet(&mut bars_frame(bars)?, output_dir.join(format!("bars_{tf}.parquet")))?;
    write_parquet(
        &mut swings_frame(&snapshot.swings)?,
        output_dir.join(format!("swings_{tf}.parquet")),
    )?;
    write_parquet(
        &mut strokes_frame(&snapshot.strokes)?,
        output_dir.join(format!("strokes_{tf}.parquet")),
    )?;
    Ok(())
}

fn kind_label(kind: SwingKind) -> &'static str {
    match kind {
        SwingKind::High => "high",
        SwingKind::Low => "low",
    }
}
