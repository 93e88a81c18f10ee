// In crates/api-client/src/snapshot.rs

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{PositionId, ProtectiveLevels, TradeLeg};

use crate::types::{HistorySnapshot, OrderRecord};
use crate::{DealSource, Result, legs_from_records};

/// A deal source backed by a JSON export of the terminal's history.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    legs: Vec<TradeLeg>,
    orders: Vec<OrderRecord>,
}

impl SnapshotSource {
    /// Reads a snapshot file of the form `{"deals": [...], "orders": [...]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: HistorySnapshot = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            deals = snapshot.deals.len(),
            orders = snapshot.orders.len(),
            "Loaded history snapshot."
        );
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: HistorySnapshot) -> Result<Self> {
        let mut legs = legs_from_records(snapshot.deals)?;
        // Exports are not guaranteed to be ordered; the sort is stable for equal times.
        legs.sort_by_key(|leg| leg.time);
        Ok(Self { legs, orders: snapshot.orders })
    }
}

#[async_trait]
impl DealSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch_deals(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<TradeLeg>> {
        Ok(self
            .legs
            .iter()
            .filter(|leg| leg.time >= start && leg.time <= end)
            .cloned()
            .collect())
    }

    async fn fetch_orders(&self, position_id: PositionId) -> Result<Vec<ProtectiveLevels>> {
        Ok(self
            .orders
            .iter()
            .filter(|order| order.position_id == position_id)
            .map(OrderRecord::levels)
            .collect())
    }
}
