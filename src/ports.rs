//! Ports between the detection loop and its collaborators
//!
//! The loop owns its input ports (`FrameSource`, `ObjectTracker`,
//! `MotionGate`) and shares its output ports (`FrameSink`, `StatusSink`,
//! `DeltaSink`) with the rest of the process.

use crate::error::Result;
use crate::inventory::InventoryDelta;
use crate::models::{Frame, TrackedObservation};
use crate::status_board::ServiceStatus;
use async_trait::async_trait;

/// Camera frame acquisition
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` when no frame is available right now
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Object detector + tracker (black box)
///
/// Implementations doing CPU-bound inference must move that work onto
/// `tokio::task::spawn_blocking` so the runtime keeps serving the status
/// surface.
#[async_trait]
pub trait ObjectTracker: Send {
    async fn detect_and_track(&mut self, frame: &Frame) -> Result<Vec<TrackedObservation>>;
}

/// "Should we run detection on this frame" oracle
pub trait MotionGate: Send {
    fn should_detect(&mut self, frame: &Frame) -> bool;

    /// Whether the gate currently considers the scene active
    fn is_active(&self) -> bool;
}

/// Gate that runs detection on every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDetect;

impl MotionGate for AlwaysDetect {
    fn should_detect(&mut self, _frame: &Frame) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        true
    }
}

/// Receives every captured frame with the latest detections
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn on_frame(&self, frame: &Frame, detections: &[TrackedObservation]);
}

/// Receives loop status after each processed frame
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn on_status(&self, status: ServiceStatus);
}

/// Delivers inventory deltas to the backend
#[async_trait]
pub trait DeltaSink: Send + Sync {
    async fn deliver(&self, delta: InventoryDelta);
}
