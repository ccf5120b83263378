use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chanlun::{aggregate, aggregate_period, Bar, DataError, Timeframe};

fn base_dt() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn minute_bar(minute: i64, close: Decimal, volume: Decimal) -> Bar {
    let open_time = base_dt() + Duration::minutes(minute);
    let open = close - dec!(0.5);
    Bar::new(
        open_time,
        open_time + Duration::minutes(1),
        open,
        close + dec!(1),
        open - dec!(1),
        close,
        volume,
    )
    .expect("valid bar")
    .with_flow(volume * close, 3, volume / dec!(2), volume * close / dec!(2))
}

fn minute_series(start: i64, count: i64) -> Vec<Bar> {
    (start..start + count)
        .map(|m| {
            let close = dec!(100) + Decimal::from(m % 17) - Decimal::from(m % 5);
            minute_bar(m, close, Decimal::from(1 + m % 7))
        })
        .collect()
}

#[test]
fn two_hours_of_minutes_yield_two_hourly_bars() {
    let bars = minute_series(0, 120);
    let hourly = aggregate(&bars, Timeframe::H1).expect("aggregate");

    assert_eq!(hourly.len(), 2);
    assert_eq!(hourly[0].open, bars[0].open);
    assert_eq!(hourly[0].close, bars[59].close);
    assert_eq!(hourly[1].open, bars[60].open);
    assert_eq!(hourly[1].close, bars[119].close);
    assert_eq!(hourly[0].open_time, base_dt());
    assert_eq!(hourly[0].close_time, base_dt() + Duration::hours(1));
    assert_eq!(hourly[1].trade_count, 180);
}

#[test]
fn bucket_extremes_and_sums() {
    let bars = minute_series(0, 15);
    let out = aggregate(&bars, Timeframe::M15).unwrap();
    assert_eq!(out.len(), 1);

    let high = bars.iter().map(|b| b.high).max().unwrap();
    let low = bars.iter().map(|b| b.low).min().unwrap();
    let volume: Decimal = bars.iter().map(|b| b.volume).sum();
    let quote: Decimal = bars.iter().map(|b| b.quote_volume).sum();
    assert_eq!(out[0].high, high);
    assert_eq!(out[0].low, low);
    assert_eq!(out[0].volume, volume);
    assert_eq!(out[0].quote_volume, quote);
}

#[test]
fn gaps_produce_no_bucket() {
    let mut bars = minute_series(0, 5);
    bars.extend(minute_series(20, 5));
    let out = aggregate(&bars, Timeframe::M5).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].open_time, base_dt() + Duration::minutes(20));
}

#[test]
fn same_resolution_is_identity() {
    let bars = minute_series(3, 30);
    assert_eq!(aggregate(&bars, Timeframe::M1).unwrap(), bars);
}

#[test]
fn empty_input_is_empty_output() {
    assert!(aggregate(&[], Timeframe::H4).unwrap().is_empty());
}

#[test]
fn unsupported_period_is_rejected() {
    let bars = minute_series(0, 10);
    let err = aggregate_period(&bars, Duration::minutes(7)).expect_err("7m unsupported");
    assert!(matches!(err, DataError::UnsupportedPeriod(_)));
    assert!(matches!(Timeframe::parse("2h"), Err(DataError::UnsupportedPeriod(_))));

    let hourly = aggregate(&minute_series(0, 120), Timeframe::H1).unwrap();
    assert!(matches!(
        aggregate(&hourly, Timeframe::M5),
        Err(DataError::UnsupportedPeriod(_))
    ));
}

#[test]
fn invalid_bar_is_a_hard_error() {
    let mut bars = minute_series(0, 10);
    bars[4].close = bars[4].high + dec!(1);
    match aggregate(&bars, Timeframe::M5) {
        Err(DataError::InvalidBar { index, .. }) => assert_eq!(index, 4),
        other => panic!("unexpected {other:?}"),
    }
}

proptest! {
    #[test]
    fn volume_is_additive_per_bucket(start in 0i64..500, count in 1i64..400) {
        let bars = minute_series(start, count);
        let out = aggregate(&bars, Timeframe::M15).unwrap();
        for bucket in &out {
            let expected: Decimal = bars
                .iter()
                .filter(|b| b.open_time >= bucket.open_time && b.open_time < bucket.close_time)
                .map(|b| b.volume)
                .sum();
            prop_assert_eq!(bucket.volume, expected);
        }
        let total: Decimal = bars.iter().map(|b| b.volume).sum();
        let agg_total: Decimal = out.iter().map(|b| b.volume).sum();
        prop_assert_eq!(total, agg_total);
    }

    #[test]
    fn aggregated_bars_keep_ohlc_bounds(start in 0i64..500, count in 1i64..400) {
        for bar in aggregate(&minute_series(start, count), Timeframe::M30).unwrap() {
            prop_assert!(bar.low <= bar.open && bar.open <= bar.high);
            prop_assert!(bar.low <= bar.close && bar.close <= bar.high);
        }
    }

    #[test]
    fn offset_windows_agree_on_shared_buckets(a in 0i64..240, b in 0i64..240) {
        let all = minute_series(0, 720);
        let left = &all[a as usize..600];
        let right = &all[b as usize..720];
        let left_out = aggregate(left, Timeframe::H1).unwrap();
        let right_out = aggregate(right, Timeframe::H1).unwrap();

        let covered = |bars: &[Bar], bucket: &Bar| {
            bars.first().is_some_and(|f| f.open_time <= bucket.open_time)
                && bars.last().is_some_and(|l| l.close_time >= bucket.close_time)
        };
        for bucket in &left_out {
            if !covered(left, bucket) || !covered(right, bucket) {
                continue;
            }
            let other = right_out.iter().find(|x| x.open_time == bucket.open_time);
            prop_assert_eq!(Some(bucket), other);
        }
    }
}
