//! CloudApiClient - backend push adapter
//!
//! ## Responsibilities
//!
//! - Push inventory deltas to `POST /inventory/update`
//! - Bounded retries with exponential backoff
//! - Backend health check
//!
//! There is no outbox: a delta that still fails after the last attempt is
//! dropped and logged. The next delta carries the full inventory again, so
//! the backend converges once it is reachable.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::inventory::InventoryDelta;
use crate::ports::DeltaSink;
use async_trait::async_trait;
use std::time::Duration;

/// Retry policy for delta delivery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per delta (including the first)
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (0-based): base * 2^attempt, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Backend accepted the delta
    Delivered { attempts: u32 },
    /// No API key configured, nothing sent
    Skipped,
}

/// Backend API client
pub struct CloudApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl CloudApiClient {
    /// Create new client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Create from application settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(&settings.api_url, &settings.api_key, settings.api_timeout())?
            .with_retry_policy(RetryPolicy::new(settings.push_max_retries)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Push a delta, retrying on network and HTTP errors
    ///
    /// Returns the last error once all attempts are used up.
    pub async fn push_delta(&self, delta: &InventoryDelta) -> Result<PushOutcome> {
        if self.api_key.is_empty() {
            tracing::warn!("No API key configured, skipping delta push");
            return Ok(PushOutcome::Skipped);
        }

        let url = format!("{}/inventory/update", self.base_url);
        let payload = serde_json::to_value(delta.to_payload())?;
        let mut attempt = 0;

        loop {
            match self.post_json(&url, &payload).await {
                Ok(()) => {
                    tracing::info!(
                        machine_id = %delta.machine_id,
                        events = delta.events.len(),
                        items = delta.inventory.len(),
                        attempts = attempt + 1,
                        "Delta pushed"
                    );
                    return Ok(PushOutcome::Delivered {
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Delta push failed"
                    );

                    if attempt + 1 >= self.retry.max_attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{} - {}", status, body)));
        }
        Ok(())
    }

    /// Check backend health
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Backend health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl DeltaSink for CloudApiClient {
    async fn deliver(&self, delta: InventoryDelta) {
        if let Err(e) = self.push_delta(&delta).await {
            tracing::error!(
                machine_id = %delta.machine_id,
                events = delta.events.len(),
                attempts = self.retry.max_attempts,
                error = %e,
                "Delta dropped after exhausting retries"
            );
        }
    }
}
