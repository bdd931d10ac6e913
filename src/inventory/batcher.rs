//! DeltaBatcher - coalesces ledger events into one delta per flush

use super::ledger::TrackLedger;
use super::types::InventoryDelta;
use chrono::Utc;

/// Builds `InventoryDelta` snapshots from a ledger's pending events
#[derive(Debug, Clone)]
pub struct DeltaBatcher {
    machine_id: String,
}

impl DeltaBatcher {
    pub fn new(machine_id: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
        }
    }

    /// Take everything pending since the last delta
    ///
    /// Returns `None` when no events are pending; otherwise the delta carries
    /// the full current counts and the pending events in emission order, and
    /// the ledger's buffer is cleared.
    pub fn get_delta(&self, ledger: &mut TrackLedger) -> Option<InventoryDelta> {
        if ledger.pending_len() == 0 {
            return None;
        }

        let delta = InventoryDelta {
            machine_id: self.machine_id.clone(),
            timestamp: Utc::now(),
            inventory: ledger.current_inventory(),
            events: ledger.take_pending(),
        };

        tracing::debug!(
            machine_id = %delta.machine_id,
            events = delta.events.len(),
            items = delta.inventory.len(),
            "Inventory delta created"
        );
        Some(delta)
    }
}
