//! Inventory types
//!
//! Events emitted by the ledger, the batched delta handed to the push
//! adapter, and the wire payload the backend expects.

use crate::models::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-class item counts (class_name -> count)
pub type InventoryCounts = BTreeMap<String, u32>;

/// Inventory event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A new track appeared on the shelf
    #[serde(rename = "SNACK_ADDED")]
    Added,
    /// A track stayed absent for the debounce window
    #[serde(rename = "SNACK_TAKEN")]
    Taken,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "SNACK_ADDED",
            Self::Taken => "SNACK_TAKEN",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single confirmed inventory change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub item: String,
    pub timestamp: DateTime<Utc>,
    pub track_id: TrackId,
    pub count_before: u32,
    pub count_after: u32,
}

impl InventoryEvent {
    pub fn added(item: &str, track_id: TrackId, count_before: u32) -> Self {
        Self {
            event_type: EventType::Added,
            item: item.to_string(),
            timestamp: Utc::now(),
            track_id,
            count_before,
            count_after: count_before.saturating_add(1),
        }
    }

    pub fn taken(item: &str, track_id: TrackId, count_before: u32) -> Self {
        Self {
            event_type: EventType::Taken,
            item: item.to_string(),
            timestamp: Utc::now(),
            track_id,
            count_before,
            count_after: count_before.saturating_sub(1),
        }
    }
}

/// Batched inventory update for the backend
///
/// `inventory` is always the complete current state, so a receiver can
/// reconcile even after a lost delta.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryDelta {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub inventory: InventoryCounts,
    pub events: Vec<InventoryEvent>,
}

impl InventoryDelta {
    /// Build the backend wire payload (`inventory` becomes `items`)
    pub fn to_payload(&self) -> DeltaPayload<'_> {
        DeltaPayload {
            machine_id: &self.machine_id,
            timestamp: self.timestamp,
            items: self
                .inventory
                .iter()
                .map(|(item, count)| {
                    (
                        item.as_str(),
                        ItemCount {
                            count: *count,
                            confidence: 1.0,
                        },
                    )
                })
                .collect(),
            events: &self.events,
        }
    }
}

/// Wire shape of `POST /inventory/update`
#[derive(Debug, Serialize)]
pub struct DeltaPayload<'a> {
    pub machine_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub items: BTreeMap<&'a str, ItemCount>,
    pub events: &'a [InventoryEvent],
}

/// Per-item entry of the wire payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemCount {
    pub count: u32,
    pub confidence: f32,
}
