// In crates/analytics/src/types.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use core_types::{PositionId, ProtectiveLevels, Side, TradeLeg};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Every historical order's protective levels, keyed by the position it belongs to.
pub type OrdersByPosition = HashMap<PositionId, Vec<ProtectiveLevels>>;

/// How the close price of a position is derived from its exit legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosePriceMode {
    /// The price of the last exit leg seen in the window.
    #[default]
    LastExit,
    /// Volume-weighted mean over all exit legs.
    VolumeWeighted,
}

/// Knobs for a single aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateOptions {
    pub include_entry_legs: bool,
    /// Results strictly above `+threshold` win, strictly below `-threshold` lose.
    pub classification_threshold: Decimal,
    /// Money value of one pip for one lot, used for the stop-loss money column.
    pub pip_value_per_lot: Decimal,
    pub close_price_mode: ClosePriceMode,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_entry_legs: true,
            classification_threshold: Decimal::ZERO,
            pip_value_per_lot: dec!(10),
            close_price_mode: ClosePriceMode::LastExit,
        }
    }
}

/// The finalized summary of every leg sharing one position id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAggregate {
    pub position_id: PositionId,
    /// Direction of the entry legs, if any were seen.
    pub side: Option<Side>,
    /// Number of entry legs that contributed to `average_entry_price`.
    pub entry_legs: usize,
    /// Summed volume of those entry legs.
    pub entry_volume: Decimal,
    /// Volume-weighted entry price. When no entry volume was seen this is the
    /// undivided notional sum, i.e. zero when no entry leg contributed.
    pub average_entry_price: Decimal,
    pub average_stop_loss: Option<Decimal>,
    pub average_take_profit: Option<Decimal>,
    pub earliest_entry_time: Option<DateTime<Utc>>,
    pub close_price: Option<Decimal>,
}

impl PositionAggregate {
    /// The volume-weighted entry price, when entry legs with volume were seen.
    ///
    /// Distances measured from the entry are only meaningful when this is present.
    pub fn entry_price(&self) -> Option<Decimal> {
        (self.entry_volume > Decimal::ZERO).then_some(self.average_entry_price)
    }
}

/// Win/lose/breakeven bucket for a record's realized result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Win,
    Lose,
    Breakeven,
}

impl Classification {
    /// Classifies `result` against a symmetric threshold. Both boundaries are breakeven.
    pub fn from_result(result: Decimal, threshold: Decimal) -> Self {
        if result > threshold {
            Classification::Win
        } else if result < -threshold {
            Classification::Lose
        } else {
            Classification::Breakeven
        }
    }
}

/// One input leg enriched with the derived values of its position.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecord {
    pub leg: TradeLeg,
    pub position_side: Option<Side>,
    /// Absent when the position's opening fell outside the queried window.
    pub entry_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub entry_time: Option<DateTime<Utc>>,
    pub stop_loss_distance_pips: Option<Decimal>,
    pub take_profit_distance_pips: Option<Decimal>,
    /// `(close - entry) / pip`, not adjusted for the side of the position.
    pub result_distance_pips: Option<Decimal>,
    pub result_money: Decimal,
    pub stop_loss_money: Option<Decimal>,
    /// Take-profit distance over stop-loss distance, rounded to 2 decimals.
    pub planned_reward_ratio: Option<Decimal>,
    /// Result money over stop-loss money, rounded to 2 decimals.
    pub realized_reward_ratio: Option<Decimal>,
    pub classification: Classification,
}

/// Roll-up counters over all emitted records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub total_count: u32,
    pub total_result: Decimal,
    pub win_count: u32,
    pub win_result: Decimal,
    pub lose_count: u32,
    pub lose_result: Decimal,
    pub breakeven_count: u32,
    pub breakeven_result: Decimal,
}

impl SummaryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record's classification and result to the counters.
    pub fn record(&mut self, classification: Classification, result: Decimal) {
        self.total_count += 1;
        self.total_result += result;
        match classification {
            Classification::Win => {
                self.win_count += 1;
                self.win_result += result;
            }
            Classification::Lose => {
                self.lose_count += 1;
                self.lose_result += result;
            }
            Classification::Breakeven => {
                self.breakeven_count += 1;
                self.breakeven_result += result;
            }
        }
    }

    pub fn count(&self, classification: Classification) -> u32 {
        match classification {
            Classification::Win => self.win_count,
            Classification::Lose => self.lose_count,
            Classification::Breakeven => self.breakeven_count,
        }
    }

    pub fn result(&self, classification: Classification) -> Decimal {
        match classification {
            Classification::Win => self.win_result,
            Classification::Lose => self.lose_result,
            Classification::Breakeven => self.breakeven_result,
        }
    }

    /// Share of records in `classification`, in percent. Zero when nothing was recorded.
    pub fn percentage(&self, classification: Classification) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        (self.count(classification) as f64 / self.total_count as f64) * 100.0
    }

    /// Mean result per record. Zero when nothing was recorded.
    pub fn average_result(&self) -> Decimal {
        if self.total_count == 0 {
            return Decimal::ZERO;
        }
        self.total_result / Decimal::from(self.total_count)
    }

    /// Winning money over the absolute losing money, when there are losses.
    pub fn profit_factor(&self) -> Option<f64> {
        if self.lose_result.is_zero() {
            return None;
        }
        (self.win_result / self.lose_result.abs()).to_f64()
    }
}
