//! StatusBoard - shared live status for the local dashboard
//!
//! Holds the latest loop status, frame and detections. The detection loop
//! writes through the `FrameSink` / `StatusSink` ports; the HTTP surface only
//! reads.

use crate::inventory::InventoryCounts;
use crate::models::{Frame, TrackedObservation};
use crate::ports::{FrameSink, StatusSink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Detection service lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Initializing,
    Running,
    Stopped,
}

/// Current service status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: ServiceState,
    pub fps: f64,
    pub frame_count: u64,
    pub last_detection_time: Option<DateTime<Utc>>,
    pub motion_active: bool,
    pub inventory: InventoryCounts,
}

impl ServiceStatus {
    pub fn initializing() -> Self {
        Self {
            status: ServiceState::Initializing,
            fps: 0.0,
            frame_count: 0,
            last_detection_time: None,
            motion_active: false,
            inventory: InventoryCounts::new(),
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::initializing()
    }
}

#[derive(Default)]
struct BoardState {
    status: ServiceStatus,
    frame: Option<Frame>,
    detections: Vec<TrackedObservation>,
}

/// Shared status object read by the dashboard
pub struct StatusBoard {
    state: RwLock<BoardState>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BoardState::default()),
        }
    }

    /// Latest published status
    pub async fn status(&self) -> ServiceStatus {
        self.state.read().await.status.clone()
    }

    /// Latest captured frame
    pub async fn latest_frame(&self) -> Option<Frame> {
        self.state.read().await.frame.clone()
    }

    /// Detections drawn on the latest frame
    pub async fn latest_detections(&self) -> Vec<TrackedObservation> {
        self.state.read().await.detections.clone()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSink for StatusBoard {
    async fn on_frame(&self, frame: &Frame, detections: &[TrackedObservation]) {
        let mut state = self.state.write().await;
        state.frame = Some(frame.clone());
        state.detections = detections.to_vec();
    }
}

#[async_trait]
impl StatusSink for StatusBoard {
    async fn on_status(&self, status: ServiceStatus) {
        if status.status != self.state.read().await.status.status {
            tracing::info!(status = ?status.status, "Detection service status changed");
        }
        self.state.write().await.status = status;
    }
}
