// In crates/app-config/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration")]
    LoadError(#[from] config::ConfigError),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to write TOML: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    #[error("Invalid setting '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(transparent)]
    Analytics(#[from] analytics::Error),

    #[error("Invalid login '{0}': must be an integer")]
    InvalidLogin(String),

    #[error("No login information found at {}", .0.display())]
    MissingCredentials(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
