//! Inventory - Track Lifecycle Ledger + Delta Batcher
//!
//! ## Responsibilities
//!
//! - Turn per-frame tracked observations into SNACK_ADDED / SNACK_TAKEN events
//! - Keep running per-class counts
//! - Batch pending events into deltas for the push adapter
//!
//! ## Module layout
//! - `types`: events, delta, wire payload
//! - `ledger`: track lifecycle and debounce
//! - `batcher`: delta snapshots
//!
//! `InventoryService` is the shared owner: the detection loop writes through
//! it, the status surface reads through it, and one mutex guards the whole
//! ledger so every `update()` applies atomically.

pub mod batcher;
pub mod ledger;
pub mod types;

pub use batcher::DeltaBatcher;
pub use ledger::{TrackLedger, DEFAULT_DEBOUNCE_FRAMES};
pub use types::*;

use crate::models::TrackedObservation;
use tokio::sync::Mutex;

struct InventoryState {
    ledger: TrackLedger,
    batcher: DeltaBatcher,
}

/// InventoryService instance
pub struct InventoryService {
    state: Mutex<InventoryState>,
}

impl InventoryService {
    /// Create new InventoryService
    pub fn new(machine_id: impl Into<String>, debounce_frames: u32) -> Self {
        Self {
            state: Mutex::new(InventoryState {
                ledger: TrackLedger::new(debounce_frames),
                batcher: DeltaBatcher::new(machine_id),
            }),
        }
    }

    /// Apply one frame's observations
    pub async fn update(&self, observations: &[TrackedObservation]) -> Vec<InventoryEvent> {
        let mut state = self.state.lock().await;
        state.ledger.update(observations)
    }

    /// Take the pending delta, if any
    pub async fn get_delta(&self) -> Option<InventoryDelta> {
        let mut state = self.state.lock().await;
        let InventoryState { ledger, batcher } = &mut *state;
        batcher.get_delta(ledger)
    }

    /// Current per-class counts
    pub async fn current_inventory(&self) -> InventoryCounts {
        self.state.lock().await.ledger.current_inventory()
    }

    /// Number of events waiting for the next delta
    pub async fn pending_event_count(&self) -> usize {
        self.state.lock().await.ledger.pending_len()
    }

    /// Number of currently active tracks
    pub async fn active_track_count(&self) -> usize {
        self.state.lock().await.ledger.active_track_count()
    }

    /// Clear all inventory state
    pub async fn reset(&self) {
        self.state.lock().await.ledger.reset();
    }
}
