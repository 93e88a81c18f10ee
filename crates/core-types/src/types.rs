// In crates/core-types/src/types.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of a single executed deal.
pub type Ticket = u64;

/// Identifier shared by every deal belonging to one logical position.
pub type PositionId = u64;

/// Represents a trading symbol, e.g., "EURUSD".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Direction of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Maps the terminal's deal type code (0 = buy, 1 = sell).
    pub fn from_deal_type(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Side::Buy),
            1 => Ok(Side::Sell),
            other => Err(Error::NotATrade(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.pad("Buy"),
            Side::Sell => f.pad("Sell"),
        }
    }
}

/// Whether a leg opens/increases or closes/reduces its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegKind {
    Entry,
    Exit,
}

impl LegKind {
    /// Maps the terminal's deal entry code.
    ///
    /// `0` is an entry. `1` (out), `2` (reversal) and `3` (close by opposite)
    /// all reduce the position and are treated as exits.
    pub fn from_deal_entry(code: i64) -> Result<Self> {
        match code {
            0 => Ok(LegKind::Entry),
            1..=3 => Ok(LegKind::Exit),
            other => Err(Error::UnknownEntry(other)),
        }
    }

    /// The journal's action label for this kind of leg.
    pub fn action(&self) -> &'static str {
        match self {
            LegKind::Entry => "Open",
            LegKind::Exit => "Close",
        }
    }
}

/// A single executed deal as reported by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    pub ticket: Ticket,
    pub position_id: PositionId,
    pub kind: LegKind,
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
    pub side: Side,
    pub symbol: Symbol,
    /// Realized result of this deal; zero for entries.
    pub profit: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

impl TradeLeg {
    pub fn is_entry(&self) -> bool {
        self.kind == LegKind::Entry
    }
}

/// Stop-loss / take-profit pair carried by one historical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveLevels {
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

impl ProtectiveLevels {
    /// Builds levels from raw terminal values, where a non-positive level means "not set".
    pub fn from_raw(stop_loss: Decimal, take_profit: Decimal) -> Self {
        Self {
            stop_loss: (stop_loss > Decimal::ZERO).then_some(stop_loss),
            take_profit: (take_profit > Decimal::ZERO).then_some(take_profit),
        }
    }
}
