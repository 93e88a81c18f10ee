// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Failed to connect to the terminal: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("Invalid deal record: {0}")]
    InvalidRecord(#[from] core_types::Error),
    #[error("Failed to read history snapshot: {0}")]
    SnapshotIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
