// In crates/app-config/src/types.rs

use std::collections::HashMap;
use std::path::PathBuf;

use analytics::{AggregateOptions, ClosePriceMode, PipTable};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the trading terminal bridge.
    pub terminal: TerminalSettings,
    #[serde(default)]
    pub journal: JournalSettings,
    #[serde(default)]
    pub pips: PipSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TerminalSettings {
    /// The base URL of the terminal bridge's HTTP API.
    pub base_url: String,
    /// Where the login/password/server triple is stored.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Settings that shape how deals are turned into journal rows.
#[derive(Deserialize, Debug, Clone)]
pub struct JournalSettings {
    /// Win/lose/breakeven threshold on the realized result.
    #[serde(default)]
    pub qty: f64,
    #[serde(default = "default_enabled")]
    pub include_entry_legs: bool,
    #[serde(default = "default_pip_value_per_lot")]
    pub pip_value_per_lot: f64,
    #[serde(default)]
    pub close_price_mode: ClosePriceMode,
    #[serde(default = "default_summary_sheet")]
    pub summary_sheet: String,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            qty: 0.0,
            include_entry_legs: default_enabled(),
            pip_value_per_lot: default_pip_value_per_lot(),
            close_price_mode: ClosePriceMode::default(),
            summary_sheet: default_summary_sheet(),
        }
    }
}

impl JournalSettings {
    /// Converts the configured numbers into the aggregator's options.
    pub fn aggregate_options(&self) -> Result<AggregateOptions> {
        let classification_threshold = to_decimal("journal.qty", self.qty)?;
        if classification_threshold < Decimal::ZERO {
            return Err(Error::InvalidValue {
                name: "journal.qty".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(AggregateOptions {
            include_entry_legs: self.include_entry_legs,
            classification_threshold,
            pip_value_per_lot: to_decimal("journal.pip_value_per_lot", self.pip_value_per_lot)?,
            close_price_mode: self.close_price_mode,
        })
    }
}

/// Pip sizes per instrument.
#[derive(Deserialize, Debug, Clone)]
pub struct PipSettings {
    #[serde(default = "default_pip_size")]
    pub default: f64,
    #[serde(default)]
    pub overrides: HashMap<String, f64>,
}

impl Default for PipSettings {
    fn default() -> Self {
        Self { default: default_pip_size(), overrides: HashMap::new() }
    }
}

impl PipSettings {
    pub fn table(&self) -> Result<PipTable> {
        let default = to_decimal("pips.default", self.default)?;
        let overrides = self
            .overrides
            .iter()
            .map(|(symbol, size)| Ok((symbol.clone(), to_decimal(&format!("pips.overrides.{symbol}"), *size)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(PipTable::new(default, overrides)?)
    }
}

fn to_decimal(name: &str, value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| Error::InvalidValue {
        name: name.to_string(),
        reason: format!("{value} is not a finite number"),
    })
}

/// Helper functions for serde defaults
fn default_credentials_path() -> PathBuf { PathBuf::from("credentials.toml") }
fn default_timeout_secs() -> u64 { 30 }
fn default_enabled() -> bool { true }
fn default_pip_value_per_lot() -> f64 { 10.0 }
fn default_summary_sheet() -> String { "Summary".to_string() }
fn default_pip_size() -> f64 { 0.0001 }
