//! FoodInsight Edge Library
//!
//! Shelf inventory monitor for a single camera
//!
//! ## Architecture
//!
//! 1. SnapshotSource - Frame capture from the camera
//! 2. RemoteTracker - Detector/tracker sidecar adapter
//! 3. DetectionLoop - Frame processing loop
//! 4. InventoryService - Track lifecycle ledger + delta batcher
//! 5. CloudApiClient - Backend push adapter
//! 6. StatusBoard - Live status for the dashboard
//! 7. WebAPI - Local status surface
//!
//! ## Data flow
//!
//! camera -> tracker -> ledger -> batcher -> backend, with the status
//! board observing every frame.

pub mod api_client;
pub mod camera_source;
pub mod config;
pub mod detection_loop;
pub mod error;
pub mod inventory;
pub mod models;
pub mod ports;
pub mod state;
pub mod status_board;
pub mod tracker_client;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
