// In crates/analytics/tests/end_to_end.rs

use analytics::{AggregateOptions, AggregationEngine, Classification, OrdersByPosition, PipTable};
use chrono::{TimeZone, Utc};
use core_types::{LegKind, ProtectiveLevels, Side, Symbol, TradeLeg};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn deal(ticket: u64, position_id: u64, kind: LegKind, hour: u32, price: Decimal, profit: Decimal) -> TradeLeg {
    TradeLeg {
        ticket,
        position_id,
        kind,
        time: Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap(),
        price,
        volume: dec!(2),
        side: if kind == LegKind::Entry { Side::Buy } else { Side::Sell },
        symbol: Symbol("EURUSD".to_string()),
        profit,
        stop_loss: None,
        take_profit: None,
    }
}

fn options(threshold: Decimal) -> AggregateOptions {
    AggregateOptions {
        include_entry_legs: false,
        classification_threshold: threshold,
        ..AggregateOptions::default()
    }
}

#[test]
fn documented_round_trip() {
    let legs = vec![
        deal(1, 100, LegKind::Entry, 9, dec!(1.1000), Decimal::ZERO),
        deal(2, 100, LegKind::Exit, 11, dec!(1.1050), dec!(100.0)),
    ];

    let engine = AggregationEngine::new(options(dec!(10)));
    let (records, totals) = engine.aggregate(&legs, &OrdersByPosition::new(), &PipTable::default());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entry_price, Some(dec!(1.1000)));
    assert_eq!(records[0].result_distance_pips, Some(dec!(50)));
    assert_eq!(records[0].classification, Classification::Win);
    assert_eq!(totals.total_count, 1);
    assert_eq!(totals.win_count, 1);
    assert_eq!(totals.total_result, dec!(100.0));
    assert_eq!(totals.win_result, dec!(100.0));
}

#[test]
fn classification_thresholds_through_the_engine() {
    let legs = vec![
        deal(1, 1, LegKind::Exit, 1, dec!(1.1), dec!(10)),
        deal(2, 2, LegKind::Exit, 2, dec!(1.1), dec!(-10)),
        deal(3, 3, LegKind::Exit, 3, dec!(1.1), dec!(10.01)),
        deal(4, 4, LegKind::Exit, 4, dec!(1.1), dec!(-10.01)),
    ];

    let engine = AggregationEngine::new(options(dec!(10)));
    let (records, totals) = engine.aggregate(&legs, &OrdersByPosition::new(), &PipTable::default());

    let classes: Vec<_> = records.iter().map(|r| r.classification).collect();
    assert_eq!(
        classes,
        vec![Classification::Breakeven, Classification::Breakeven, Classification::Win, Classification::Lose]
    );
    assert_eq!(totals.breakeven_result, Decimal::ZERO);
    assert_eq!(totals.total_result, Decimal::ZERO);
}

#[test]
fn summary_partitions_hold_for_mixed_journal() {
    let legs = vec![
        deal(1, 10, LegKind::Entry, 1, dec!(1.1000), Decimal::ZERO),
        deal(2, 11, LegKind::Entry, 2, dec!(1.1200), Decimal::ZERO),
        deal(3, 10, LegKind::Exit, 3, dec!(1.1030), dec!(60)),
        deal(4, 11, LegKind::Exit, 4, dec!(1.1150), dec!(-100)),
        deal(5, 12, LegKind::Exit, 5, dec!(1.1150), dec!(3)),
    ];
    let orders = OrdersByPosition::from([(
        10,
        vec![ProtectiveLevels { stop_loss: Some(dec!(1.0980)), take_profit: Some(dec!(1.1060)) }],
    )]);

    for include_entry_legs in [false, true] {
        let engine = AggregationEngine::new(AggregateOptions {
            include_entry_legs,
            classification_threshold: dec!(5),
            ..AggregateOptions::default()
        });
        let (records, t) = engine.aggregate(&legs, &orders, &PipTable::default());

        assert_eq!(records.len(), if include_entry_legs { 5 } else { 3 });
        assert_eq!(t.win_count + t.lose_count + t.breakeven_count, t.total_count);
        assert_eq!(t.win_result + t.lose_result + t.breakeven_result, t.total_result);
        assert_eq!(t.total_result, dec!(-37));
    }

    let (records, _) = AggregationEngine::new(options(dec!(5))).aggregate(&legs, &orders, &PipTable::default());
    let first = &records[0];
    assert_eq!(first.stop_loss_distance_pips, Some(dec!(20)));
    assert_eq!(first.planned_reward_ratio, Some(dec!(3)));
    // 60 / (20 pips * 2 lots * 10)
    assert_eq!(first.realized_reward_ratio, Some(dec!(0.15)));
    // Position 12 was opened before the window.
    assert_eq!(records[2].entry_time, None);
    assert_eq!(records[2].stop_loss_distance_pips, None);
}
