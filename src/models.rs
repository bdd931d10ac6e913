//! Shared models and types
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Track identifier assigned by the external tracker
pub type TrackId = u64;

/// Bounding box in frame pixel coordinates
///
/// Serialized as `[x1, y1, x2, y2]`, the layout the tracker emits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One tracked detection for one frame, as produced by the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObservation {
    /// Persistent track ID (stable while the object stays visible)
    pub track_id: TrackId,
    /// Detected class label (e.g. "banana")
    pub class_name: String,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Bounding box
    pub bbox: BBox,
}

impl TrackedObservation {
    pub fn new(
        track_id: TrackId,
        class_name: impl Into<String>,
        confidence: f32,
        bbox: BBox,
    ) -> Self {
        Self {
            track_id,
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }
}

/// Encoded camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic frame number assigned by the source
    pub sequence: u64,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
    /// Encoded image bytes (JPEG)
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub content_type: String,
}

impl Frame {
    pub fn jpeg(sequence: u64, data: Vec<u8>) -> Self {
        Self {
            sequence,
            captured_at: Utc::now(),
            data,
            content_type: "image/jpeg".to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub machine_id: String,
    pub backend_connected: bool,
    pub tracker_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_from_tracker_json() {
        let json = r#"{"track_id": 7, "class_name": "banana", "confidence": 0.83, "bbox": [10.0, 20.0, 110.0, 70.0]}"#;
        let obs: TrackedObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.track_id, 7);
        assert_eq!(obs.class_name, "banana");
        assert_eq!(obs.bbox, BBox::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let value = serde_json::to_value(BBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(value, serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_bbox_geometry() {
        let b = BBox::new(100.0, 100.0, 200.0, 150.0);
        assert_eq!(b.width(), 100.0);
        assert_eq!(b.height(), 50.0);
        assert_eq!(b.center(), (150.0, 125.0));
    }
}
