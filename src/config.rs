//! Configuration management for rtcplay
//!
//! Handles settings file loading/saving and environment overrides.
//! Settings are stored at ~/.config/rtcplay/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging;
use crate::models::PlaybackConfig;

/// Environment variable that replaces the configured stream source
pub const SOURCE_ENV: &str = "RTCPLAY_SOURCE";

/// Controller timings, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Delay before reconnecting after a stream-not-found failure
    pub retry_delay_ms: u64,
    /// Delay between creating a session and asking the target to play
    pub present_delay_ms: u64,
    /// How often to check whether the transport has loaded
    pub poll_interval_ms: u64,
    /// Give up polling for the transport after this long
    pub poll_timeout_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            retry_delay_ms: 100,
            present_delay_ms: 250,
            poll_interval_ms: 800,
            poll_timeout_ms: 5000,
        }
    }
}

impl Timings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn present_delay(&self) -> Duration {
        Duration::from_millis(self.present_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Output format: text or json
    pub format: String,
}

impl LoggingSettings {
    /// Reject levels and formats the subscriber would not understand
    pub fn validate(&self) -> Result<()> {
        if !logging::is_valid_level(&self.level) {
            anyhow::bail!("Invalid log level '{}'", self.level);
        }
        if !logging::is_valid_format(&self.format) {
            anyhow::bail!("Invalid log format '{}' (expected text or json)", self.format);
        }
        Ok(())
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timings: Timings,
    /// Default playback options, layered under whatever a caller passes
    pub playback: PlaybackConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Get settings file path (~/.config/rtcplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rtcplay").join("config.toml"))
    }

    /// Load settings from the default path, or return defaults if not found
    /// or invalid. Environment overrides are applied either way.
    pub fn load() -> Self {
        let mut settings = Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| Self::from_toml(&s).ok())
            .unwrap_or_default();
        settings.apply_env();
        settings
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text).context("Failed to parse settings")?;
        settings.logging.validate()?;
        Ok(settings)
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides (currently only the stream source)
    pub fn apply_env(&mut self) {
        if let Ok(source) = std::env::var(SOURCE_ENV) {
            self.playback.source = Some(source);
        }
    }

    /// Layer a caller's playback options over the configured defaults
    pub fn playback_for(&self, overrides: &PlaybackConfig) -> PlaybackConfig {
        overrides.merged_over(&self.playback)
    }
}
