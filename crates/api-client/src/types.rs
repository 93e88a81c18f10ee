// In crates/api-client/src/types.rs

use chrono::DateTime;
use core_types::{LegKind, PositionId, ProtectiveLevels, Side, Symbol, Ticket, TradeLeg};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The main client for the trading terminal's HTTP bridge.
#[derive(Debug, Clone)]
pub struct TerminalClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the bridge, without a trailing slash.
    pub base_url: String,
}

/// Body of the bridge's login call.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub login: u64,
    pub password: &'a str,
    pub server: &'a str,
}

/// Minimal acknowledgement returned by calls that carry no payload.
#[derive(Debug, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// A deal as the terminal reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRecord {
    pub ticket: Ticket,
    pub position_id: PositionId,
    /// 0 = buy, 1 = sell, anything else is a balance operation.
    #[serde(rename = "type")]
    pub deal_type: i64,
    /// 0 = in, 1 = out, 2 = reversal, 3 = close by.
    pub entry: i64,
    /// Execution time in seconds since the epoch.
    pub time: i64,
    pub price: Decimal,
    pub volume: Decimal,
    pub symbol: String,
    #[serde(default)]
    pub profit: Decimal,
    #[serde(default)]
    pub sl: Decimal,
    #[serde(default)]
    pub tp: Decimal,
}

impl DealRecord {
    /// Whether the record is a buy or sell deal rather than a balance operation.
    pub fn is_trade(&self) -> bool {
        matches!(self.deal_type, 0 | 1)
    }

    pub fn into_leg(self) -> core_types::Result<TradeLeg> {
        let time = DateTime::from_timestamp(self.time, 0)
            .ok_or(core_types::Error::InvalidTimestamp(self.time))?;
        let levels = ProtectiveLevels::from_raw(self.sl, self.tp);
        Ok(TradeLeg {
            ticket: self.ticket,
            position_id: self.position_id,
            kind: LegKind::from_deal_entry(self.entry)?,
            time,
            price: self.price,
            volume: self.volume,
            side: Side::from_deal_type(self.deal_type)?,
            symbol: Symbol(self.symbol),
            profit: self.profit,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
        })
    }
}

/// A historical order as the terminal reports it. Unset levels are zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub ticket: Ticket,
    pub position_id: PositionId,
    #[serde(default)]
    pub sl: Decimal,
    #[serde(default)]
    pub tp: Decimal,
}

impl OrderRecord {
    pub fn levels(&self) -> ProtectiveLevels {
        ProtectiveLevels::from_raw(self.sl, self.tp)
    }
}

/// An exported copy of the terminal's history, used for offline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub deals: Vec<DealRecord>,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
}
