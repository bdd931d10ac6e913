//! Application state
//!
//! Holds all shared components read by the HTTP surface

use crate::api_client::CloudApiClient;
use crate::config::Settings;
use crate::error::Result;
use crate::inventory::InventoryService;
use crate::status_board::StatusBoard;
use crate::tracker_client::RemoteTracker;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// InventoryService (ledger + batcher)
    pub inventory: Arc<InventoryService>,
    /// StatusBoard (latest status / frame / detections)
    pub status: Arc<StatusBoard>,
    /// CloudApiClient (backend push adapter)
    pub api_client: Arc<CloudApiClient>,
    /// RemoteTracker used for health probes only
    pub tracker: Arc<RemoteTracker>,
}

impl AppState {
    /// Build shared components from settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let inventory = Arc::new(InventoryService::new(
            &settings.machine_id,
            settings.debounce_frames,
        ));
        let api_client = Arc::new(CloudApiClient::from_settings(&settings)?);
        let tracker = Arc::new(RemoteTracker::from_settings(&settings)?);

        Ok(Self {
            settings: Arc::new(settings),
            inventory,
            status: Arc::new(StatusBoard::new()),
            api_client,
            tracker,
        })
    }
}
