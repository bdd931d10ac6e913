//! RemoteTracker - detector/tracker sidecar adapter
//!
//! ## Responsibilities
//!
//! - Send a frame to the tracker (`POST /v1/track`, multipart)
//! - Parse tracked detections (class, confidence, bbox, track_id)
//!
//! Track IDs are owned by the sidecar and persist across calls, so one
//! `RemoteTracker` must talk to one sidecar tracker state per camera.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{Frame, TrackedObservation};
use crate::ports::ObjectTracker;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tracker response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackResponse {
    #[serde(default)]
    pub detections: Vec<TrackedObservation>,
}

/// Remote tracker client
pub struct RemoteTracker {
    client: reqwest::Client,
    base_url: String,
    machine_id: String,
    confidence: f32,
    input_size: u32,
}

impl RemoteTracker {
    /// Create new tracker client
    pub fn new(
        base_url: impl Into<String>,
        machine_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            machine_id: machine_id.into(),
            confidence: 0.4,
            input_size: 640,
        })
    }

    /// Create from application settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(&settings.tracker_url, &settings.machine_id, Duration::from_secs(10))?
            .with_confidence(settings.confidence_threshold)
            .with_input_size(settings.input_size))
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    /// Check tracker health
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/healthz", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Run detection + tracking on one frame
    pub async fn track(&self, frame: &Frame) -> Result<Vec<TrackedObservation>> {
        let url = format!("{}/v1/track", self.base_url);

        let form = Form::new()
            .part(
                "image",
                Part::bytes(frame.data.clone())
                    .file_name("frame.jpg")
                    .mime_str(&frame.content_type)?,
            )
            .text("machine_id", self.machine_id.clone())
            .text("captured_at", frame.captured_at.to_rfc3339())
            .text("confidence", self.confidence.to_string())
            .text("input_size", self.input_size.to_string());

        let resp = self.client.post(&url).multipart(form).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Detector(format!("{} - {}", status, body)));
        }

        let result: TrackResponse = resp.json().await?;

        if !result.detections.is_empty() {
            tracing::debug!(
                frame = frame.sequence,
                count = result.detections.len(),
                "Tracked detections received"
            );
        }
        Ok(result.detections)
    }
}

#[async_trait]
impl ObjectTracker for RemoteTracker {
    async fn detect_and_track(&mut self, frame: &Frame) -> Result<Vec<TrackedObservation>> {
        self.track(frame).await
    }
}
