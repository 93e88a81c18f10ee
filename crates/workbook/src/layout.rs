// In crates/workbook/src/layout.rs

use analytics::EnrichedRecord;
use core_types::LegKind;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Column of the ticket, used to de-duplicate rows (column B).
pub const TICKET_COLUMN: u32 = 2;

/// Header titles, in column order A..T.
pub const HEADERS: [&str; 20] = [
    "Date",
    "Ticket",
    "Position ID",
    "Action",
    "Instrument",
    "Entry Time",
    "",
    "Side",
    "Entry Price",
    "Close Price",
    "SL Price",
    "SL Pips",
    "SL USD",
    "TP Price",
    "TP Pips",
    "Volume",
    "Result Pips",
    "Result USD",
    "RR Plan",
    "RR Fact",
];

/// Background of opening rows.
pub const OPEN_FILL: &str = "FFFFFFE0";
/// Background of closing rows with a positive result.
pub const PROFIT_FILL: &str = "FFCCFFCC";
/// Background of closing rows with a zero or negative result.
pub const LOSS_FILL: &str = "FFFFCCCC";

const NOT_AVAILABLE: &str = "N/A";

/// A single cell to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl From<Option<Decimal>> for CellValue {
    fn from(value: Option<Decimal>) -> Self {
        value
            .and_then(|v| v.to_f64())
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Some(value).into()
    }
}

fn ratio(value: Option<Decimal>) -> CellValue {
    match value {
        Some(_) => value.into(),
        None => CellValue::Text(NOT_AVAILABLE.to_string()),
    }
}

/// One journal row: the cells in column order plus the row background.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRow {
    pub ticket: String,
    pub cells: Vec<CellValue>,
    pub fill: &'static str,
}

impl JournalRow {
    pub fn from_record(record: &EnrichedRecord) -> Self {
        let leg = &record.leg;
        let ticket = leg.ticket.to_string();

        let cells = vec![
            CellValue::Text(leg.time.format("%d.%m.%Y").to_string()),
            CellValue::Text(ticket.clone()),
            CellValue::Number(leg.position_id as f64),
            CellValue::Text(leg.kind.action().to_string()),
            CellValue::Text(leg.symbol.0.clone()),
            record
                .entry_time
                .map(|t| CellValue::Text(t.format("%H:%M:%S").to_string()))
                .unwrap_or(CellValue::Empty),
            CellValue::Empty,
            CellValue::Text(leg.side.to_string()),
            record.entry_price.into(),
            record.close_price.into(),
            record.stop_loss.into(),
            record.stop_loss_distance_pips.into(),
            record.stop_loss_money.into(),
            record.take_profit.into(),
            record.take_profit_distance_pips.into(),
            leg.volume.into(),
            record.result_distance_pips.into(),
            record.result_money.into(),
            ratio(record.planned_reward_ratio),
            ratio(record.realized_reward_ratio),
        ];

        let fill = match leg.kind {
            LegKind::Entry => OPEN_FILL,
            LegKind::Exit if record.result_money > Decimal::ZERO => PROFIT_FILL,
            LegKind::Exit => LOSS_FILL,
        };

        Self { ticket, cells, fill }
    }
}
