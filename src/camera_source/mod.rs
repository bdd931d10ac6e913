//! SnapshotSource - HTTP snapshot camera adapter
//!
//! Pulls one JPEG per `next_frame()` from the camera's snapshot URL.
//! Frame sequence numbers are assigned here and only advance on success.

use crate::error::{Error, Result};
use crate::models::Frame;
use crate::ports::FrameSource;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Snapshot timeout used by `from_url`
const DEFAULT_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP snapshot frame source
pub struct SnapshotSource {
    client: reqwest::Client,
    url: String,
    next_sequence: u64,
}

impl SnapshotSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            next_sequence: 1,
        })
    }

    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(url, DEFAULT_SNAPSHOT_TIMEOUT)
    }

    async fn capture_http(&self) -> Result<Option<(Vec<u8>, String)>> {
        let resp = self.client.get(&self.url).send().await?;

        if !resp.status().is_success() {
            return Err(Error::Camera(format!(
                "snapshot request failed: {}",
                resp.status()
            )));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let data = resp.bytes().await?;
        if data.is_empty() {
            return Ok(None);
        }

        Ok(Some((data.to_vec(), content_type)))
    }
}

#[async_trait]
impl FrameSource for SnapshotSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some((data, content_type)) = self.capture_http().await? else {
            tracing::debug!(url = %self.url, "Camera returned an empty snapshot");
            return Ok(None);
        };

        let frame = Frame {
            sequence: self.next_sequence,
            captured_at: Utc::now(),
            data,
            content_type,
        };
        self.next_sequence += 1;
        Ok(Some(frame))
    }
}
