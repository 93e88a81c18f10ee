// In crates/analytics/src/engine.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use core_types::{LegKind, PositionId, ProtectiveLevels, Side, TradeLeg};
use rust_decimal::Decimal;

use crate::pips::PipSizeResolver;
use crate::types::{
    AggregateOptions, Classification, ClosePriceMode, EnrichedRecord, OrdersByPosition,
    PositionAggregate, SummaryTotals,
};

/// Running sums for one position while the legs are being grouped.
#[derive(Debug, Default)]
struct PositionAccumulator {
    side: Option<Side>,
    entry_legs: usize,
    entry_notional: Decimal,
    entry_volume: Decimal,
    earliest_entry_time: Option<DateTime<Utc>>,
    last_exit_price: Option<Decimal>,
    exit_notional: Decimal,
    exit_volume: Decimal,
    stop_loss_sum: Decimal,
    stop_loss_count: u32,
    take_profit_sum: Decimal,
    take_profit_count: u32,
}

impl PositionAccumulator {
    fn add_leg(&mut self, leg: &TradeLeg) {
        match leg.kind {
            LegKind::Entry => {
                self.entry_legs += 1;
                self.entry_notional += leg.price * leg.volume;
                self.entry_volume += leg.volume;
                self.side = Some(leg.side);
                self.earliest_entry_time = Some(match self.earliest_entry_time {
                    Some(seen) => seen.min(leg.time),
                    None => leg.time,
                });
            }
            LegKind::Exit => {
                self.last_exit_price = Some(leg.price);
                self.exit_notional += leg.price * leg.volume;
                self.exit_volume += leg.volume;
            }
        }
    }

    fn add_orders(&mut self, orders: &[ProtectiveLevels]) {
        for order in orders {
            if let Some(sl) = order.stop_loss.filter(|sl| *sl > Decimal::ZERO) {
                self.stop_loss_sum += sl;
                self.stop_loss_count += 1;
            }
            if let Some(tp) = order.take_profit.filter(|tp| *tp > Decimal::ZERO) {
                self.take_profit_sum += tp;
                self.take_profit_count += 1;
            }
        }
    }

    fn finalize(self, position_id: PositionId, mode: ClosePriceMode) -> PositionAggregate {
        let average_entry_price = if self.entry_volume > Decimal::ZERO {
            self.entry_notional / self.entry_volume
        } else {
            self.entry_notional
        };

        let close_price = match mode {
            ClosePriceMode::LastExit => self.last_exit_price,
            ClosePriceMode::VolumeWeighted if self.exit_volume > Decimal::ZERO => {
                Some(self.exit_notional / self.exit_volume)
            }
            ClosePriceMode::VolumeWeighted => self.last_exit_price,
        };

        PositionAggregate {
            position_id,
            side: self.side,
            entry_legs: self.entry_legs,
            entry_volume: self.entry_volume,
            average_entry_price,
            average_stop_loss: mean(self.stop_loss_sum, self.stop_loss_count),
            average_take_profit: mean(self.take_profit_sum, self.take_profit_count),
            earliest_entry_time: self.earliest_entry_time,
            close_price,
        }
    }
}

fn mean(sum: Decimal, count: u32) -> Option<Decimal> {
    (count > 0).then(|| sum / Decimal::from(count))
}

/// Groups legs by position and finalizes one aggregate per position id.
///
/// Protective levels of every historical order tied to a position are folded
/// in once, when the position is first seen.
pub fn group_positions(
    legs: &[TradeLeg],
    orders: &OrdersByPosition,
    mode: ClosePriceMode,
) -> HashMap<PositionId, PositionAggregate> {
    let mut accumulators: HashMap<PositionId, PositionAccumulator> = HashMap::new();

    for leg in legs {
        let acc = accumulators.entry(leg.position_id).or_insert_with(|| {
            let mut acc = PositionAccumulator::default();
            match orders.get(&leg.position_id) {
                Some(position_orders) => acc.add_orders(position_orders),
                None => tracing::debug!(position_id = leg.position_id, "No historical orders for position."),
            }
            acc
        });
        acc.add_leg(leg);
    }

    accumulators
        .into_iter()
        .map(|(position_id, acc)| {
            let aggregate = acc.finalize(position_id, mode);
            tracing::debug!(
                position_id,
                entry_price = %aggregate.average_entry_price,
                stop_loss = ?aggregate.average_stop_loss,
                take_profit = ?aggregate.average_take_profit,
                close_price = ?aggregate.close_price,
                "Finalized position."
            );
            (position_id, aggregate)
        })
        .collect()
}

/// Turns a window of trade legs into enriched journal records plus summary totals.
#[derive(Debug, Default)]
pub struct AggregationEngine {
    options: AggregateOptions,
}

impl AggregationEngine {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Runs the grouping, finalization and emission passes over `legs`.
    ///
    /// Records come out in input order. Entry legs are skipped when
    /// `include_entry_legs` is off; when included they carry zero profit and
    /// therefore count as breakeven.
    pub fn aggregate(
        &self,
        legs: &[TradeLeg],
        orders: &OrdersByPosition,
        pips: &dyn PipSizeResolver,
    ) -> (Vec<EnrichedRecord>, SummaryTotals) {
        let positions = group_positions(legs, orders, self.options.close_price_mode);

        let mut records = Vec::with_capacity(legs.len());
        let mut totals = SummaryTotals::new();

        for leg in legs {
            if leg.is_entry() && !self.options.include_entry_legs {
                continue;
            }
            let Some(position) = positions.get(&leg.position_id) else {
                continue;
            };

            let record = self.enrich(leg, position, pips.pip_size(&leg.symbol));
            totals.record(record.classification, record.result_money);
            records.push(record);
        }

        tracing::info!(
            legs = legs.len(),
            positions = positions.len(),
            records = records.len(),
            total_result = %totals.total_result,
            "Aggregation complete."
        );

        (records, totals)
    }

    fn enrich(&self, leg: &TradeLeg, position: &PositionAggregate, pip_size: Decimal) -> EnrichedRecord {
        let entry_price = position.entry_price();
        let to_pips = |distance: Decimal| distance.checked_div(pip_size);

        // Without an entry price every distance would be measured from zero.
        let stop_loss_distance_pips = entry_price
            .zip(position.average_stop_loss)
            .and_then(|(entry, sl)| to_pips((entry - sl).abs()));
        let take_profit_distance_pips = entry_price
            .zip(position.average_take_profit)
            .and_then(|(entry, tp)| to_pips((tp - entry).abs()));
        let result_distance_pips = entry_price
            .zip(position.close_price)
            .and_then(|(entry, close)| to_pips(close - entry));

        let stop_loss_money = stop_loss_distance_pips
            .map(|pips| pips * leg.volume * self.options.pip_value_per_lot);
        let planned_reward_ratio = match (take_profit_distance_pips, stop_loss_distance_pips) {
            (Some(tp), Some(sl)) => tp.checked_div(sl).map(|r| r.round_dp(2)),
            _ => None,
        };
        let realized_reward_ratio = stop_loss_money
            .and_then(|risk| leg.profit.checked_div(risk))
            .map(|r| r.round_dp(2));

        EnrichedRecord {
            leg: leg.clone(),
            position_side: position.side,
            entry_price,
            stop_loss: position.average_stop_loss,
            take_profit: position.average_take_profit,
            close_price: position.close_price,
            entry_time: position.earliest_entry_time,
            stop_loss_distance_pips,
            take_profit_distance_pips,
            result_distance_pips,
            result_money: leg.profit,
            stop_loss_money,
            planned_reward_ratio,
            realized_reward_ratio,
            classification: Classification::from_result(leg.profit, self.options.classification_threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::Symbol;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, minute, 0).unwrap()
    }

    fn leg(ticket: u64, position_id: u64, kind: LegKind, minute: u32, price: Decimal, volume: Decimal) -> TradeLeg {
        TradeLeg {
            ticket,
            position_id,
            kind,
            time: at(minute),
            price,
            volume,
            side: Side::Buy,
            symbol: Symbol("EURUSD".to_string()),
            profit: Decimal::ZERO,
            stop_loss: None,
            take_profit: None,
        }
    }

    fn exit(ticket: u64, position_id: u64, minute: u32, price: Decimal, volume: Decimal, profit: Decimal) -> TradeLeg {
        TradeLeg { profit, side: Side::Sell, ..leg(ticket, position_id, LegKind::Exit, minute, price, volume) }
    }

    fn eurusd_pips() -> impl Fn(&Symbol) -> Decimal {
        |_: &Symbol| dec!(0.0001)
    }

    fn engine(include_entry_legs: bool, threshold: Decimal) -> AggregationEngine {
        AggregationEngine::new(AggregateOptions {
            include_entry_legs,
            classification_threshold: threshold,
            ..AggregateOptions::default()
        })
    }

    #[test]
    fn single_round_trip_wins() {
        let legs = vec![
            leg(1, 100, LegKind::Entry, 0, dec!(1.1000), dec!(2)),
            exit(2, 100, 30, dec!(1.1050), dec!(2), dec!(100.0)),
        ];

        let (records, totals) = engine(false, dec!(10)).aggregate(&legs, &OrdersByPosition::new(), &eurusd_pips());

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.leg.ticket, 2);
        assert_eq!(r.entry_price, Some(dec!(1.1000)));
        assert_eq!(r.result_distance_pips, Some(dec!(50)));
        assert_eq!(r.entry_time, Some(at(0)));
        assert_eq!(r.position_side, Some(Side::Buy));
        assert_eq!(r.classification, Classification::Win);
        assert_eq!(r.stop_loss_distance_pips, None);
        assert_eq!(r.planned_reward_ratio, None);
        assert_eq!(r.realized_reward_ratio, None);

        assert_eq!(totals.total_count, 1);
        assert_eq!(totals.win_count, 1);
        assert_eq!(totals.total_result, dec!(100.0));
        assert_eq!(totals.win_result, dec!(100.0));
    }

    #[test]
    fn weighted_entry_ignores_exit_legs_and_order() {
        let forward = vec![
            leg(1, 7, LegKind::Entry, 0, dec!(1.2000), dec!(1)),
            leg(2, 7, LegKind::Entry, 5, dec!(1.2100), dec!(3)),
            exit(3, 7, 9, dec!(1.3000), dec!(4), dec!(50)),
        ];
        let mut reversed = forward.clone();
        reversed.swap(0, 1);

        let a = group_positions(&forward, &OrdersByPosition::new(), ClosePriceMode::LastExit);
        let b = group_positions(&reversed, &OrdersByPosition::new(), ClosePriceMode::LastExit);

        // (1.2000 * 1 + 1.2100 * 3) / 4
        assert_eq!(a[&7].average_entry_price, dec!(1.2075));
        assert_eq!(a[&7].average_entry_price, b[&7].average_entry_price);
        assert_eq!(a[&7].earliest_entry_time, Some(at(0)));
        assert_eq!(b[&7].earliest_entry_time, Some(at(0)));
    }

    #[test]
    fn position_without_entries_does_not_divide() {
        let legs = vec![exit(9, 55, 1, dec!(1.0500), dec!(1), dec!(-20))];

        let positions = group_positions(&legs, &OrdersByPosition::new(), ClosePriceMode::LastExit);
        let p = &positions[&55];
        assert_eq!(p.average_entry_price, Decimal::ZERO);
        assert_eq!(p.earliest_entry_time, None);
        assert_eq!(p.side, None);

        let (records, totals) = engine(true, Decimal::ZERO).aggregate(&legs, &OrdersByPosition::new(), &eurusd_pips());
        assert_eq!(records[0].entry_time, None);
        assert_eq!(records[0].result_distance_pips, None);
        assert_eq!(records[0].classification, Classification::Lose);
        assert_eq!(totals.lose_count, 1);
    }

    #[test]
    fn zero_volume_entries_keep_the_raw_sum() {
        let legs = vec![leg(1, 3, LegKind::Entry, 0, dec!(1.5), dec!(0))];
        let positions = group_positions(&legs, &OrdersByPosition::new(), ClosePriceMode::LastExit);
        assert_eq!(positions[&3].average_entry_price, Decimal::ZERO);
        assert_eq!(positions[&3].entry_legs, 1);
        assert_eq!(positions[&3].entry_price(), None);
    }

    #[test]
    fn zero_volume_entry_gives_no_result_pips() {
        let legs = vec![
            leg(1, 3, LegKind::Entry, 0, dec!(1.5), dec!(0)),
            exit(2, 3, 1, dec!(1.5010), dec!(0), dec!(0)),
        ];
        let (records, _) = engine(false, Decimal::ZERO).aggregate(&legs, &OrdersByPosition::new(), &eurusd_pips());
        assert_eq!(records[0].entry_price, None);
        assert_eq!(records[0].result_distance_pips, None);
    }

    #[test]
    fn position_opened_before_the_window_has_no_protective_distances() {
        let legs = vec![exit(5, 12, 3, dec!(1.1010), dec!(1), dec!(30))];
        let orders = OrdersByPosition::from([(
            12,
            vec![ProtectiveLevels { stop_loss: Some(dec!(1.0980)), take_profit: Some(dec!(1.1060)) }],
        )]);

        let (records, totals) = engine(false, Decimal::ZERO).aggregate(&legs, &orders, &eurusd_pips());
        let r = &records[0];

        // The levels themselves are known; only distances from the entry are not.
        assert_eq!(r.stop_loss, Some(dec!(1.0980)));
        assert_eq!(r.take_profit, Some(dec!(1.1060)));
        assert_eq!(r.entry_price, None);
        assert_eq!(r.stop_loss_distance_pips, None);
        assert_eq!(r.take_profit_distance_pips, None);
        assert_eq!(r.stop_loss_money, None);
        assert_eq!(r.planned_reward_ratio, None);
        assert_eq!(r.realized_reward_ratio, None);
        assert_eq!(r.result_distance_pips, None);
        assert_eq!(r.classification, Classification::Win);
        assert_eq!(totals.win_count, 1);
    }

    #[test]
    fn protective_levels_average_only_positive_values() {
        let legs = vec![
            leg(1, 100, LegKind::Entry, 0, dec!(1.1000), dec!(1)),
            exit(2, 100, 10, dec!(1.0980), dec!(1), dec!(-20)),
        ];
        let orders = OrdersByPosition::from([(
            100,
            vec![
                ProtectiveLevels { stop_loss: Some(dec!(1.0980)), take_profit: Some(dec!(1.1040)) },
                ProtectiveLevels { stop_loss: Some(dec!(1.0960)), take_profit: None },
                ProtectiveLevels { stop_loss: Some(dec!(0)), take_profit: Some(dec!(1.1060)) },
            ],
        )]);

        let (records, _) = engine(true, Decimal::ZERO).aggregate(&legs, &orders, &eurusd_pips());
        let close = &records[1];

        assert_eq!(close.stop_loss, Some(dec!(1.0970)));
        assert_eq!(close.take_profit, Some(dec!(1.1050)));
        assert_eq!(close.stop_loss_distance_pips, Some(dec!(30)));
        assert_eq!(close.take_profit_distance_pips, Some(dec!(50)));
        // 30 pips * 1 lot * 10 per pip
        assert_eq!(close.stop_loss_money, Some(dec!(300)));
        assert_eq!(close.planned_reward_ratio, Some(dec!(1.67)));
        assert_eq!(close.realized_reward_ratio, Some(dec!(-0.07)));
        assert_eq!(close.result_distance_pips, Some(dec!(-20)));
    }

    #[test]
    fn orders_are_folded_once_per_position() {
        let legs = vec![
            leg(1, 4, LegKind::Entry, 0, dec!(1.1000), dec!(1)),
            leg(2, 4, LegKind::Entry, 1, dec!(1.1000), dec!(1)),
            exit(3, 4, 2, dec!(1.1010), dec!(2), dec!(20)),
        ];
        let orders = OrdersByPosition::from([(
            4,
            vec![
                ProtectiveLevels { stop_loss: Some(dec!(1.0990)), take_profit: None },
                ProtectiveLevels { stop_loss: Some(dec!(1.0970)), take_profit: None },
            ],
        )]);
        let positions = group_positions(&legs, &orders, ClosePriceMode::LastExit);
        assert_eq!(positions[&4].average_stop_loss, Some(dec!(1.0980)));
    }

    #[test]
    fn zero_stop_distance_is_present_not_absent() {
        let legs = vec![
            leg(1, 8, LegKind::Entry, 0, dec!(1.1000), dec!(1)),
            exit(2, 8, 5, dec!(1.1000), dec!(1), dec!(0)),
        ];
        let orders = OrdersByPosition::from([(
            8,
            vec![ProtectiveLevels { stop_loss: Some(dec!(1.1000)), take_profit: Some(dec!(1.1020)) }],
        )]);

        let (records, _) = engine(false, Decimal::ZERO).aggregate(&legs, &orders, &eurusd_pips());
        let r = &records[0];
        assert_eq!(r.stop_loss_distance_pips, Some(dec!(0)));
        assert_eq!(r.stop_loss_money, Some(dec!(0)));
        assert_eq!(r.planned_reward_ratio, None);
        assert_eq!(r.realized_reward_ratio, None);
        assert_eq!(r.classification, Classification::Breakeven);
    }

    #[test]
    fn last_exit_wins_by_default() {
        let legs = vec![
            leg(1, 12, LegKind::Entry, 0, dec!(1.1000), dec!(2)),
            exit(2, 12, 5, dec!(1.1020), dec!(1), dec!(20)),
            exit(3, 12, 9, dec!(1.1040), dec!(1), dec!(40)),
        ];
        let last = group_positions(&legs, &OrdersByPosition::new(), ClosePriceMode::LastExit);
        assert_eq!(last[&12].close_price, Some(dec!(1.1040)));

        let weighted = group_positions(&legs, &OrdersByPosition::new(), ClosePriceMode::VolumeWeighted);
        assert_eq!(weighted[&12].close_price, Some(dec!(1.1030)));
    }

    #[test]
    fn sell_positions_keep_unadjusted_result_sign() {
        // A profitable short: entered at 1.2000, covered at 1.1950.
        let mut entry = leg(1, 21, LegKind::Entry, 0, dec!(1.2000), dec!(1));
        entry.side = Side::Sell;
        let mut cover = exit(2, 21, 5, dec!(1.1950), dec!(1), dec!(50));
        cover.side = Side::Buy;

        let (records, totals) = engine(false, Decimal::ZERO).aggregate(&[entry, cover], &OrdersByPosition::new(), &eurusd_pips());

        assert_eq!(records[0].position_side, Some(Side::Sell));
        // close - entry, not flipped for the short side.
        assert_eq!(records[0].result_distance_pips, Some(dec!(-50)));
        assert_eq!(records[0].classification, Classification::Win);
        assert_eq!(totals.win_count, 1);
    }

    #[test]
    fn included_entry_legs_count_as_breakeven() {
        let legs = vec![
            leg(1, 100, LegKind::Entry, 0, dec!(1.1000), dec!(2)),
            exit(2, 100, 30, dec!(1.1050), dec!(2), dec!(100.0)),
        ];

        let (records, totals) = engine(true, dec!(10)).aggregate(&legs, &OrdersByPosition::new(), &eurusd_pips());

        assert_eq!(records.iter().map(|r| r.leg.ticket).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(records[0].classification, Classification::Breakeven);
        // The entry row also sees the position's close.
        assert_eq!(records[0].close_price, Some(dec!(1.1050)));
        assert_eq!(totals.total_count, 2);
        assert_eq!(totals.breakeven_count, 1);
        assert_eq!(totals.win_count, 1);
    }

    #[test]
    fn empty_input_yields_zeroed_totals() {
        let (records, totals) = engine(true, dec!(10)).aggregate(&[], &OrdersByPosition::new(), &eurusd_pips());
        assert!(records.is_empty());
        assert_eq!(totals, SummaryTotals::default());
    }

    #[test]
    fn zero_pip_size_leaves_distances_absent() {
        let legs = vec![
            leg(1, 1, LegKind::Entry, 0, dec!(1.1000), dec!(1)),
            exit(2, 1, 1, dec!(1.1010), dec!(1), dec!(10)),
        ];
        let broken = |_: &Symbol| Decimal::ZERO;
        let (records, _) = engine(false, Decimal::ZERO).aggregate(&legs, &OrdersByPosition::new(), &broken);
        assert_eq!(records[0].result_distance_pips, None);
    }
}
