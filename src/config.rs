//! Settings persistence for the receipt validator

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CameraPosition, SessionConfig};
use crate::detection::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE};

/// Validator settings persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Minimum candidate confidence counted as a receipt (0.0-1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Edge of the square scorer input in pixels
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// How long a photo request may take before it is abandoned
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
    /// Camera to open for capture
    #[serde(default)]
    pub camera_position: CameraPosition,
    /// Release the camera as soon as a photo was taken
    #[serde(default = "default_stop_session_after_capture")]
    pub stop_session_after_capture: bool,
    /// On-device model file (None = no model configured)
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

fn default_capture_timeout_ms() -> u64 {
    5_000
}

fn default_stop_session_after_capture() -> bool {
    true
}

impl Settings {
    /// Directory name under the user config dir
    pub const APP_DIR: &'static str = "receipt-validator";

    /// Location of the settings file
    pub fn path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("No user config directory available")?;
        Ok(dir.join(Self::APP_DIR).join("settings.json"))
    }

    /// Load settings from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let loaded = Self::path().and_then(|path| Self::load_from(&path));
        match loaded {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Error loading settings, using defaults: {:#}", err);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Read settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("Malformed settings file: {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            log::warn!(
                "Confidence threshold {} out of range, using {}",
                self.confidence_threshold,
                DEFAULT_CONFIDENCE_THRESHOLD
            );
            self.confidence_threshold = DEFAULT_CONFIDENCE_THRESHOLD;
        }
        if self.input_size == 0 {
            log::warn!("Scorer input size 0 is invalid, using {}", DEFAULT_INPUT_SIZE);
            self.input_size = DEFAULT_INPUT_SIZE;
        }
        if self.capture_timeout_ms == 0 {
            log::warn!("Capture timeout 0 is invalid, using default");
            self.capture_timeout_ms = default_capture_timeout_ms();
        }
        self
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            camera_position: self.camera_position,
            capture_timeout: self.capture_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            input_size: default_input_size(),
            capture_timeout_ms: default_capture_timeout_ms(),
            camera_position: CameraPosition::Back,
            stop_session_after_capture: default_stop_session_after_capture(),
            model_path: None,
        }
    }
}
