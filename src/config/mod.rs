//! Settings - application configuration
//!
//! ## Sources (later wins)
//!
//! 1. Platform profile defaults (RPi 4 / RPi 5 / desktop)
//! 2. JSON config file (`FOODINSIGHT_CONFIG`, default `/opt/foodinsight/config.json`)
//! 3. Environment variables (`MACHINE_ID`, `API_URL`, `API_KEY`, ...)

mod platform;

pub use platform::{Platform, PlatformProfile};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/opt/foodinsight/config.json";

/// Food-related COCO classes reported by default
const DEFAULT_ALLOWED_CLASSES: &[&str] = &[
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake",
];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Machine identification
    pub machine_id: String,

    /// Camera snapshot URL (JPEG)
    pub camera_url: String,
    /// Remote detector/tracker base URL
    pub tracker_url: String,
    /// Minimum detection confidence forwarded to the tracker
    pub confidence_threshold: f32,
    /// Tracker input resolution
    pub input_size: u32,
    /// Run detection on every Nth frame
    pub process_every_n_frames: u32,

    /// Consecutive absent frames before an item counts as taken
    pub debounce_frames: u32,
    /// Delta push interval in seconds
    pub batch_timeout_secs: f64,
    /// Only these classes are counted (empty = all classes)
    pub allowed_classes: Vec<String>,

    /// Backend API base URL
    pub api_url: String,
    /// Backend bearer token (empty = push disabled)
    pub api_key: String,
    /// Backend request timeout in seconds
    pub api_timeout_secs: u64,
    /// Delivery attempts per delta
    pub push_max_retries: u32,

    /// Status surface bind address
    pub admin_host: String,
    pub admin_port: u16,
}

impl Settings {
    /// Defaults for a given platform
    pub fn for_platform(platform: Platform) -> Self {
        let profile = platform.profile();
        Self {
            machine_id: "foodinsight-edge-001".to_string(),
            camera_url: "http://127.0.0.1:8554/snapshot.jpg".to_string(),
            tracker_url: "http://127.0.0.1:9000".to_string(),
            confidence_threshold: 0.4,
            input_size: profile.input_size,
            process_every_n_frames: profile.process_every_n_frames,
            debounce_frames: crate::inventory::DEFAULT_DEBOUNCE_FRAMES,
            batch_timeout_secs: profile.batch_timeout_secs,
            allowed_classes: DEFAULT_ALLOWED_CLASSES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            api_url: "https://foodinsight-api.run.app".to_string(),
            api_key: String::new(),
            api_timeout_secs: 10,
            push_max_retries: 3,
            admin_host: "0.0.0.0".to_string(),
            admin_port: 8080,
        }
    }

    /// Load settings: config file (if present) then environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var("FOODINSIGHT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut settings = Self::load_file(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from a JSON file; a missing file yields defaults
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), "Config file loaded");
        Ok(settings)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MACHINE_ID") {
            self.machine_id = v;
        }
        if let Some(v) = lookup("CAMERA_URL") {
            self.camera_url = v;
        }
        if let Some(v) = lookup("TRACKER_URL") {
            self.tracker_url = v;
        }
        if let Some(v) = lookup("API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("ADMIN_HOST") {
            self.admin_host = v;
        }
        if let Some(v) = lookup("ADMIN_PORT") {
            self.admin_port = v
                .parse()
                .map_err(|_| Error::Config(format!("ADMIN_PORT is not a port: {}", v)))?;
        }
        Ok(())
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.machine_id.trim().is_empty() {
            return Err(Error::Config("machine_id must not be empty".to_string()));
        }
        if self.debounce_frames == 0 {
            return Err(Error::Config("debounce_frames must be positive".to_string()));
        }
        if self.process_every_n_frames == 0 {
            return Err(Error::Config(
                "process_every_n_frames must be positive".to_string(),
            ));
        }
        if !(self.batch_timeout_secs.is_finite() && self.batch_timeout_secs > 0.0) {
            return Err(Error::Config(format!(
                "batch_timeout_secs must be positive, got {}",
                self.batch_timeout_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be within 0..=1, got {}",
                self.confidence_threshold
            )));
        }
        if self.push_max_retries == 0 {
            return Err(Error::Config("push_max_retries must be positive".to_string()));
        }
        Ok(())
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs_f64(self.batch_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_platform(Platform::detect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_platform_defaults() {
        let rpi4 = Settings::for_platform(Platform::Rpi4);
        assert_eq!(rpi4.input_size, 320);
        assert_eq!(rpi4.process_every_n_frames, 3);
        assert_eq!(rpi4.batch_interval(), Duration::from_secs(2));
        assert_eq!(rpi4.debounce_frames, 10);
        assert!(rpi4.allowed_classes.iter().any(|c| c == "hot dog"));
        assert!(rpi4.validate().is_ok());

        let rpi5 = Settings::for_platform(Platform::Rpi5);
        assert_eq!(rpi5.process_every_n_frames, 1);
        assert_eq!(rpi5.batch_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let json = r#"{"machine_id": "shelf-7", "debounce_frames": 5, "allowed_classes": []}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.machine_id, "shelf-7");
        assert_eq!(settings.debounce_frames, 5);
        assert!(settings.allowed_classes.is_empty());
        assert_eq!(settings.push_max_retries, 3);
        assert_eq!(settings.api_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("foodinsight-no-such-config.json");
        let settings = Settings::load_file(&path).unwrap();
        assert_eq!(settings.machine_id, "foodinsight-edge-001");
    }

    #[test]
    fn test_load_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "foodinsight-config-{}.json",
            std::process::id()
        ));
        let mut settings = Settings::for_platform(Platform::Desktop);
        settings.machine_id = "shelf-9".to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("MACHINE_ID", "edge-42"),
            ("API_KEY", "secret"),
            ("ADMIN_PORT", "9090"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::for_platform(Platform::Desktop);
        settings
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.machine_id, "edge-42");
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.admin_port, 9090);
        assert_eq!(settings.api_url, "https://foodinsight-api.run.app");
    }

    #[test]
    fn test_bad_port_override_rejected() {
        let mut settings = Settings::for_platform(Platform::Desktop);
        let err = settings
            .apply_overrides(|k| (k == "ADMIN_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = Settings::for_platform(Platform::Desktop);

        let mut s = base.clone();
        s.debounce_frames = 0;
        assert!(matches!(s.validate(), Err(Error::Config(_))));

        let mut s = base.clone();
        s.process_every_n_frames = 0;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.batch_timeout_secs = 0.0;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.confidence_threshold = 1.5;
        assert!(s.validate().is_err());

        let mut s = base;
        s.machine_id = "  ".to_string();
        assert!(s.validate().is_err());
    }
}
