// In crates/analytics/src/error.rs

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Pip size for '{symbol}' must be positive, got {size}")]
    InvalidPipSize { symbol: String, size: Decimal },
}

pub type Result<T> = std::result::Result<T, Error>;
