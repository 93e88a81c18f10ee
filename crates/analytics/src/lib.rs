// In crates/analytics/src/lib.rs

pub mod engine;
pub mod error;
pub mod pips;
pub mod types;

// Re-export public types
pub use engine::{AggregationEngine, group_positions};
pub use error::{Error, Result};
pub use pips::{PipSizeResolver, PipTable};
pub use types::{
    AggregateOptions, Classification, ClosePriceMode, EnrichedRecord, OrdersByPosition,
    PositionAggregate, SummaryTotals,
};
