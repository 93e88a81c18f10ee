// In crates/workbook/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to open workbook {}: {reason}", .path.display())]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Failed to save workbook {}: {reason}", .path.display())]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Sheet '{sheet}' not found. Available sheets: {available:?}")]
    SheetNotFound { sheet: String, available: Vec<String> },

    #[error("Failed to create sheet '{sheet}': {reason}")]
    SheetCreateFailed { sheet: String, reason: String },

    #[error("Workbook file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
