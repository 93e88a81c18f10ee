// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Deal types other than buy/sell (balance, credit, commission, ...) carry no position.
    #[error("Deal type {0} is not a buy or sell")]
    NotATrade(i64),

    #[error("Unknown deal entry code: {0}")]
    UnknownEntry(i64),

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
