// In crates/api-client/src/lib.rs

use std::collections::HashMap;
use std::time::Duration;

use app_config::Credentials;
use app_config::TerminalSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{PositionId, ProtectiveLevels, TradeLeg};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod error;
pub mod snapshot;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use snapshot::SnapshotSource;
pub use types::*;

/// The source of historical deals and orders.
///
/// Both calls are expected to return records already ordered by time.
#[async_trait]
pub trait DealSource: Sync {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Every buy/sell deal executed inside `[start, end]`.
    async fn fetch_deals(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TradeLeg>>;

    /// The protective levels of every historical order tied to `position_id`.
    async fn fetch_orders(&self, position_id: PositionId) -> Result<Vec<ProtectiveLevels>>;
}

/// Fetches the deals of a window plus the orders of every position they touch.
///
/// Orders are requested once per distinct position id, in order of first appearance.
pub async fn fetch_history<S: DealSource + ?Sized>(
    source: &S,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(Vec<TradeLeg>, HashMap<PositionId, Vec<ProtectiveLevels>>)> {
    let legs = source.fetch_deals(start, end).await?;
    tracing::info!(source = source.name(), count = legs.len(), %start, %end, "Fetched deals.");

    let mut orders = HashMap::new();
    for leg in &legs {
        if orders.contains_key(&leg.position_id) {
            continue;
        }
        let levels = source.fetch_orders(leg.position_id).await?;
        if levels.is_empty() {
            tracing::debug!(position_id = leg.position_id, "No historical order data found for position.");
        }
        orders.insert(leg.position_id, levels);
    }

    Ok((legs, orders))
}

/// Converts raw deal records into legs, dropping balance operations.
pub fn legs_from_records(records: Vec<DealRecord>) -> Result<Vec<TradeLeg>> {
    records
        .into_iter()
        .filter(|record| {
            let keep = record.is_trade();
            if !keep {
                tracing::debug!(ticket = record.ticket, deal_type = record.deal_type, "Skipping non-trade deal.");
            }
            keep
        })
        .map(|record| record.into_leg().map_err(Error::from))
        .collect()
}

/// Decodes a bridge response, surfacing `{"code": n, "msg": ...}` error bodies.
pub fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    // The bridge returns an error object on failure, so we check for that first.
    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let msg = value.get("msg").and_then(Value::as_str).unwrap_or("Unknown error").to_string();
            return Err(Error::ApiError { code, msg });
        }
    }

    serde_json::from_value(value).map_err(Error::DeserializationFailed)
}

/// A rejected login is a connection failure rather than a generic API error.
fn parse_login_response(body: &str) -> Result<Ack> {
    parse_response(body).map_err(|e| match e {
        Error::ApiError { code, msg } => Error::ConnectionFailed(format!("code {code}: {msg}")),
        other => other,
    })
}

impl TerminalClient {
    /// Constructs a new TerminalClient from TerminalSettings.
    pub fn new(settings: &TerminalSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(TerminalClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Logs the bridge into the trading account.
    ///
    /// Any transport or account failure is reported as a connection failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        let request = LoginRequest {
            login: credentials.login,
            password: &credentials.password,
            server: &credentials.server,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
        let text = response.text().await.map_err(Error::RequestFailed)?;

        let ack = parse_login_response(&text)?;
        tracing::info!(login = credentials.login, server = %credentials.server, msg = %ack.msg, "Connected to terminal.");
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let text = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;
        parse_response(&text)
    }
}

#[async_trait]
impl DealSource for TerminalClient {
    fn name(&self) -> &'static str {
        "terminal"
    }

    /// Corresponds to `GET /history/deals?from=..&to=..`.
    async fn fetch_deals(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TradeLeg>> {
        let query = [("from", start.timestamp().to_string()), ("to", end.timestamp().to_string())];
        let records: Vec<DealRecord> = self.get("/history/deals", &query).await?;
        legs_from_records(records)
    }

    /// Corresponds to `GET /history/orders?position=..`.
    async fn fetch_orders(&self, position_id: PositionId) -> Result<Vec<ProtectiveLevels>> {
        let query = [("position", position_id.to_string())];
        let records: Vec<OrderRecord> = self.get("/history/orders", &query).await?;
        Ok(records.iter().map(OrderRecord::levels).collect())
    }
}

// Free function to allow api_client::new usage
pub fn new(settings: &TerminalSettings) -> Result<TerminalClient> {
    TerminalClient::new(settings)
}
