//! 周期聚合。
//!
//! 以 epoch 对齐的固定桶把低周期 bar 合成高周期 bar：
//! - 桶起点 = `floor(open_time / period) * period`，与输入窗口的起点无关；
//! - 空桶不产出；
//! - 目标周期等于源周期时原样返回。

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::bar::{validate_series, Bar};
use crate::constant::{DataError, Timeframe};

/// Streaming form: feed bars in `open_time` order, receive each bucket once
/// a bar from a later bucket shows up.
pub struct BucketAggregator {
    timeframe: Timeframe,
    current: Option<Bar>,
}

impl BucketAggregator {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            current: None,
        }
    }

    pub fn update(&mut self, bar: Bar) -> Option<Bar> {
        let start = bucket_start(bar.open_time, self.timeframe);
        match self.current.as_mut() {
            Some(bucket) if bucket.open_time == start => {
                bucket.high = bucket.high.max(bar.high);
                bucket.low = bucket.low.min(bar.low);
                bucket.close = bar.close;
                bucket.volume += bar.volume;
                bucket.quote_volume += bar.quote_volume;
                bucket.trade_count += bar.trade_count;
                bucket.taker_buy_volume += bar.taker_buy_volume;
                bucket.taker_buy_quote_volume += bar.taker_buy_quote_volume;
                None
            }
            _ => {
                let opened = Bar {
                    open_time: start,
                    close_time: start + self.timeframe.duration(),
                    ..bar
                };
                self.current.replace(opened)
            }
        }
    }

    pub fn flush(&mut self) -> Option<Bar> {
        self.current.take()
    }
}

pub struct BarAggregator {
    target: Timeframe,
}

impl BarAggregator {
    pub fn new(target: Timeframe) -> Self {
        Self { target }
    }

    pub fn aggregate(&self, bars: &[Bar]) -> Result<Vec<Bar>, DataError> {
        validate_series(bars)?;
        let Some(first) = bars.first() else {
            return Ok(Vec::new());
        };

        let source = first.close_time - first.open_time;
        let target = self.target.duration();
        if target == source {
            return Ok(bars.to_vec());
        }
        if target < source {
            return Err(DataError::UnsupportedPeriod(format!(
                "{} is finer than the {}s source bars",
                self.target,
                source.num_seconds()
            )));
        }

        let mut bucketer = BucketAggregator::new(self.target);
        let mut out = Vec::with_capacity(bars.len() / (target.num_minutes().max(1) as usize) + 1);
        for bar in bars {
            if let Some(done) = bucketer.update(bar.clone()) {
                out.push(done);
            }
        }
        out.extend(bucketer.flush());

        debug!(
            timeframe = %self.target,
            source = bars.len(),
            buckets = out.len(),
            "aggregated bars"
        );
        Ok(out)
    }
}

pub fn aggregate(bars: &[Bar], target: Timeframe) -> Result<Vec<Bar>, DataError> {
    BarAggregator::new(target).aggregate(bars)
}

/// Same as [`aggregate`], with the target given as a raw duration.
pub fn aggregate_period(bars: &[Bar], period: chrono::Duration) -> Result<Vec<Bar>, DataError> {
    aggregate(bars, Timeframe::from_duration(period)?)
}

pub fn bucket_start(ts: DateTime<Utc>, timeframe: Timeframe) -> DateTime<Utc> {
    let period = timeframe.duration().num_seconds();
    let start = ts.timestamp().div_euclid(period) * period;
    DateTime::<Utc>::from_timestamp(start, 0).unwrap_or(ts)
}
