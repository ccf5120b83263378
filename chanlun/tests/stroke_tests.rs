use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chanlun::stroke::StrokeBuilder;
use chanlun::{build_strokes, DataError, Direction, SwingKind, SwingPoint};

fn swing(index: usize, kind: SwingKind, price: Decimal) -> SwingPoint {
    SwingPoint {
        index,
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::hours(index as i64),
        price,
        kind,
        strength: 1.0,
    }
}

#[test]
fn alternating_swings_become_strokes() {
    let swings = vec![
        swing(2, SwingKind::Low, dec!(10)),
        swing(5, SwingKind::High, dec!(15)),
        swing(9, SwingKind::Low, dec!(12)),
    ];
    let strokes = build_strokes(&swings);

    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].direction, Direction::Up);
    assert_eq!(strokes[0].length, dec!(5));
    assert_eq!(strokes[0].bar_span, 3);
    assert_eq!(strokes[0].time_span, Duration::hours(3));
    assert_eq!(strokes[1].direction, Direction::Down);
    assert_eq!(strokes[1].length, dec!(3));
    assert_eq!(strokes[1].bar_span, 4);
    assert_eq!(strokes[1].start, strokes[0].end);
}

#[test]
fn same_kind_pairs_are_skipped() {
    let swings = vec![
        swing(1, SwingKind::Low, dec!(10)),
        swing(3, SwingKind::High, dec!(14)),
        swing(5, SwingKind::High, dec!(16)),
        swing(8, SwingKind::Low, dec!(11)),
    ];
    let strokes = build_strokes(&swings);

    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].end.index, 3);
    assert_eq!(strokes[1].start.index, 5);
    assert_eq!(strokes[1].direction, Direction::Down);
    assert_eq!(strokes[1].length, dec!(5));
}

#[test]
fn too_few_swings_give_empty_result() {
    let one = vec![swing(1, SwingKind::Low, dec!(10))];
    assert!(build_strokes(&one).is_empty());
    assert!(build_strokes(&[]).is_empty());
    assert!(matches!(
        StrokeBuilder.try_build(&one),
        Err(DataError::InsufficientData { required: 2, actual: 1 })
    ));
}

fn arb_swings() -> impl Strategy<Value = Vec<SwingPoint>> {
    prop::collection::vec((any::<bool>(), 1u32..500), 0..60).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (is_high, price))| {
                let kind = if is_high { SwingKind::High } else { SwingKind::Low };
                swing(i * 2 + 1, kind, Decimal::from(price))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn consecutive_strokes_alternate(swings in arb_swings()) {
        let strokes = build_strokes(&swings);
        for pair in strokes.windows(2) {
            prop_assert_ne!(pair[0].direction, pair[1].direction);
        }
        for stroke in &strokes {
            prop_assert_ne!(stroke.start.kind, stroke.end.kind);
            prop_assert_eq!(stroke.direction == Direction::Up, stroke.start.kind == SwingKind::Low);
        }
    }

    #[test]
    fn building_is_pure(swings in arb_swings()) {
        prop_assert_eq!(build_strokes(&swings), build_strokes(&swings));
    }
}

#[test]
fn stroke_serializes_time_span_in_seconds() {
    let swings = vec![
        swing(0, SwingKind::High, dec!(12)),
        swing(2, SwingKind::Low, dec!(9)),
    ];
    let stroke = &build_strokes(&swings)[0];
    let json = serde_json::to_value(stroke).unwrap();
    assert_eq!(json["time_span"], 7200);
    assert_eq!(json["direction"], "down");
    assert_eq!(json["length"], "3");

    let back: chanlun::Stroke = serde_json::from_value(json).unwrap();
    assert_eq!(&back, stroke);
}
