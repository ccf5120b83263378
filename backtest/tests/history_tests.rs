use chanlun::{Bar, Timeframe};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategy::{
    AnalysisBackend, AnalysisMetadata, DecisionEngine, RiskLevel, Signal, SignalFilter,
    SignalKind, StrategyAnalysis, StrategyError,
};

use backtest::{signal_history, trades_frame, BacktestError, SignalHistory};

fn hourly(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let open_time = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
                + Duration::hours(i as i64);
            let c = dec!(20) + Decimal::from(i % 7);
            Bar::new(open_time, open_time + Duration::hours(1), c, c + dec!(1), c - dec!(1), c, dec!(3))
                .unwrap()
        })
        .collect()
}

/// Alternates buy and sell by batch and checks the window size.
struct Alternating {
    expected_len: usize,
}

impl AnalysisBackend for Alternating {
    fn name(&self) -> &str {
        "alternating"
    }

    fn analyze(&self, bars: &[Bar], timeframe: Timeframe) -> Result<StrategyAnalysis, StrategyError> {
        if bars.len() != self.expected_len {
            return Err(StrategyError::Backend {
                backend: "alternating".to_string(),
                reason: format!("window of {}", bars.len()),
            });
        }
        let hour = (bars[0].open_time - Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).num_hours();
        let (kind, confidence) = if (hour / 100) % 2 == 0 {
            (SignalKind::Buy2, 0.7)
        } else {
            (SignalKind::Sell3, 0.9)
        };
        let last = &bars[bars.len() - 1];
        let signals = vec![Signal {
            kind,
            timestamp: last.open_time,
            price: last.close,
            confidence,
            risk: RiskLevel::Medium,
            position_size: 0.1,
            stop_loss: None,
            take_profit: None,
            description: "alternating".to_string(),
        }];
        Ok(StrategyAnalysis {
            recommendation: DecisionEngine.evaluate(&signals),
            signals,
            structure: None,
            metadata: AnalysisMetadata {
                timeframe,
                bar_count: bars.len(),
                backend: self.name().to_string(),
                analyzed_at: Utc::now(),
            },
        })
    }
}

#[test]
fn batches_use_inclusive_windows() {
    let report = SignalHistory::with_backend(Alternating { expected_len: 51 })
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();

    let batches = report.signals.iter().map(|s| s.batch_index).collect::<Vec<_>>();
    assert_eq!(batches, vec![50, 150, 250]);
    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.buy, 2);
    assert_eq!(report.stats.sell, 1);
    assert!((report.stats.average_confidence - (0.7 + 0.9 + 0.7) / 3.0).abs() < 1e-12);
    // 3 signals over 300 hours
    assert!((report.stats.signal_frequency - 0.24).abs() < 1e-12);
}

#[test]
fn performance_scores_signals_against_recent_closes() {
    let report = SignalHistory::with_backend(Alternating { expected_len: 51 })
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();

    // buy@21, sell@23, buy@25 against the mean of the last 10 closes, 23.3
    let prices = report.signals.iter().map(|s| s.signal.price).collect::<Vec<_>>();
    assert_eq!(prices, vec![dec!(21), dec!(23), dec!(25)]);

    let perf = &report.performance;
    assert_eq!(perf.total_signals, 3);
    assert_eq!(perf.profitable_signals, 1);
    assert!((perf.win_rate - 100.0 / 3.0).abs() < 1e-9);
    let expected = (2.3 / 21.0 - 0.3 / 23.0 - 1.7 / 25.0) / 3.0 * 100.0;
    assert!((perf.average_return - expected).abs() < 1e-9);
}

#[test]
fn filter_keeps_matching_batches_only() {
    let buys = SignalHistory::with_backend(Alternating { expected_len: 51 })
        .filter(Some(SignalFilter::Buy))
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();
    let batches = buys.signals.iter().map(|s| s.batch_index).collect::<Vec<_>>();
    assert_eq!(batches, vec![50, 250]);
    assert_eq!(buys.stats.buy, 2);
    assert_eq!(buys.stats.sell, 0);
    assert_eq!(buys.performance.profitable_signals, 1);
    assert!((buys.performance.win_rate - 50.0).abs() < 1e-9);

    let sell3 = SignalHistory::with_backend(Alternating { expected_len: 51 })
        .filter(Some("sell3".parse().unwrap()))
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();
    assert_eq!(sell3.signals.len(), 1);
    assert_eq!(sell3.signals[0].signal.kind, SignalKind::Sell3);
    assert_eq!(sell3.performance.profitable_signals, 0);
    assert!((sell3.performance.average_return + 0.3 / 23.0 * 100.0).abs() < 1e-9);

    let none = SignalHistory::with_backend(Alternating { expected_len: 51 })
        .filter(Some(SignalFilter::Kind(SignalKind::Buy1)))
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();
    assert!(none.signals.is_empty());
    assert_eq!(none.performance.total_signals, 0);
    assert_eq!(none.performance.win_rate, 0.0);
}

#[test]
fn short_span_counts_as_one_day_and_flat_move_is_not_a_win() {
    let report = SignalHistory::with_backend(Alternating { expected_len: 11 })
        .window(10, 100)
        .scan(&hourly(12), Timeframe::H1)
        .unwrap();

    assert_eq!(report.stats.total, 1);
    assert!((report.stats.signal_frequency - 1.0).abs() < 1e-12);
    // buy at 23, last 10 closes also average 23
    assert_eq!(report.signals[0].signal.price, dec!(23));
    assert_eq!(report.performance.profitable_signals, 0);
    assert_eq!(report.performance.average_return, 0.0);
}

#[test]
fn failed_batches_are_dropped() {
    let report = SignalHistory::with_backend(Alternating { expected_len: 11 })
        .window(10, 100)
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();
    assert_eq!(report.stats.total, 3);

    let report = SignalHistory::with_backend(Alternating { expected_len: 99 })
        .scan(&hourly(300), Timeframe::H1)
        .unwrap();
    assert!(report.signals.is_empty());
    assert_eq!(report.stats.average_confidence, 0.0);
}

#[test]
fn rule_based_history_on_short_input_is_empty() {
    let report = signal_history(&hourly(40), Timeframe::H1, 50, 100).unwrap();
    assert_eq!(report.bar_count, 40);
    assert!(report.signals.is_empty());
    assert_eq!(report.stats.total, 0);
}

#[test]
fn zero_step_is_rejected() {
    assert!(matches!(
        signal_history(&hourly(40), Timeframe::H1, 50, 0),
        Err(BacktestError::InvalidConfig(_))
    ));
}

#[test]
fn empty_trade_frame_has_columns() {
    let frame = trades_frame(&[]).unwrap();
    assert_eq!(frame.height(), 0);
    assert!(frame.get_column_names().iter().any(|c| *c == "profit"));
}
