//! Platform detection (Raspberry Pi 4 / 5, desktop)

use serde::{Deserialize, Serialize};

const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";

/// Hardware platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Rpi5,
    Rpi4,
    Desktop,
    Unknown,
}

/// Platform-specific detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformProfile {
    /// Tracker input resolution
    pub input_size: u32,
    /// Frame skipping
    pub process_every_n_frames: u32,
    /// Delta push interval (seconds)
    pub batch_timeout_secs: f64,
}

impl Platform {
    /// Detect the platform we are running on
    pub fn detect() -> Self {
        if std::env::consts::OS == "macos" {
            return Self::Desktop;
        }

        if let Ok(model) = std::fs::read_to_string(DEVICE_TREE_MODEL) {
            if let Some(platform) = Self::from_model(&model) {
                return platform;
            }
        }

        if std::env::consts::OS == "linux" {
            Self::Desktop
        } else {
            Self::Unknown
        }
    }

    /// Map a device-tree model string to a Raspberry Pi platform
    pub fn from_model(model: &str) -> Option<Self> {
        let model = model.to_lowercase();
        if model.contains("raspberry pi 5") {
            Some(Self::Rpi5)
        } else if model.contains("raspberry pi 4") {
            Some(Self::Rpi4)
        } else {
            None
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        match self {
            Self::Rpi5 | Self::Desktop => PlatformProfile {
                input_size: 640,
                process_every_n_frames: 1,
                batch_timeout_secs: 1.0,
            },
            Self::Rpi4 => PlatformProfile {
                input_size: 320,
                process_every_n_frames: 3,
                batch_timeout_secs: 2.0,
            },
            Self::Unknown => PlatformProfile {
                input_size: 320,
                process_every_n_frames: 2,
                batch_timeout_secs: 1.5,
            },
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rpi5 => write!(f, "rpi5"),
            Self::Rpi4 => write!(f, "rpi4"),
            Self::Desktop => write!(f, "desktop"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_model() {
        assert_eq!(
            Platform::from_model("Raspberry Pi 5 Model B Rev 1.0\0"),
            Some(Platform::Rpi5)
        );
        assert_eq!(
            Platform::from_model("Raspberry Pi 4 Model B Rev 1.4"),
            Some(Platform::Rpi4)
        );
        assert_eq!(Platform::from_model("Raspberry Pi 3 Model B"), None);
    }

    #[test]
    fn test_unknown_profile_is_conservative() {
        let profile = Platform::Unknown.profile();
        assert_eq!(profile.input_size, 320);
        assert_eq!(profile.process_every_n_frames, 2);
        assert_eq!(profile.batch_timeout_secs, 1.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(Platform::Rpi4.to_string(), "rpi4");
        assert_eq!(Platform::Desktop.to_string(), "desktop");
    }
}
