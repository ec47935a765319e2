//! Application configuration
//!
//! Stored as TOML in the platform config directory (or any explicit path).
//! Every field has a default, so a partial or empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::scheduler::PlaybackStrategy;
use crate::constants::*;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub transport: TransportConfig,
}

/// Microphone side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input device name; `None` selects the system default
    pub device: Option<String>,
    /// Accumulation window per outgoing chunk
    pub chunk_ms: u32,
    /// Upstream wire rate
    pub wire_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            chunk_ms: DEFAULT_CHUNK_MS,
            wire_rate: WIRE_INPUT_RATE,
        }
    }
}

impl CaptureConfig {
    /// Native-rate samples per outgoing chunk
    pub fn window_samples(&self, native_rate: u32) -> usize {
        ((u64::from(native_rate) * u64::from(self.chunk_ms)) / 1000).max(1) as usize
    }
}

/// Speaker side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output device name; `None` selects the system default
    pub device: Option<String>,
    pub strategy: PlaybackStrategy,
    /// Ring buffer capacity in seconds at the device rate
    pub buffer_seconds: f32,
    /// Margin before the first chunk of a run (clock strategy)
    pub lead_in_ms: u32,
    /// Fade applied to the tail of interrupted audio
    pub declick_ms: u32,
    /// Downstream wire rate
    pub wire_rate: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            device: None,
            strategy: PlaybackStrategy::default(),
            buffer_seconds: DEFAULT_PLAYBACK_BUFFER_SECONDS,
            lead_in_ms: DEFAULT_LEAD_IN_MS,
            declick_ms: DEFAULT_DECLICK_MS,
            wire_rate: WIRE_OUTPUT_RATE,
        }
    }
}

/// Peer connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// WebSocket URL; `{session_id}` is substituted at connect time
    pub url: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TRANSPORT_URL.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn url_for(&self, session_id: &str) -> String {
        self.url.replace(SESSION_ID_PLACEHOLDER, session_id)
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pcm-voice-bridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.chunk_ms == 0 {
            return Err(Error::Config("capture.chunk_ms must be positive".into()));
        }
        if self.capture.wire_rate == 0 || self.playback.wire_rate == 0 {
            return Err(Error::Config("wire rates must be positive".into()));
        }
        if !(self.playback.buffer_seconds > 0.0) {
            return Err(Error::Config("playback.buffer_seconds must be positive".into()));
        }
        if !self.transport.url.contains(SESSION_ID_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "transport.url must contain {}",
                SESSION_ID_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.capture.chunk_ms, 100);
        assert_eq!(config.capture.wire_rate, 16000);
        assert_eq!(config.playback.wire_rate, 24000);
        assert_eq!(config.playback.strategy, PlaybackStrategy::RingBuffer);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [capture]
            chunk_ms = 64

            [playback]
            strategy = "clock_scheduled"
            lead_in_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.capture.chunk_ms, 64);
        assert_eq!(config.capture.wire_rate, 16000);
        assert_eq!(config.playback.strategy, PlaybackStrategy::ClockScheduled);
        assert_eq!(config.playback.lead_in_ms, 20);
        assert_eq!(config.playback.declick_ms, DEFAULT_DECLICK_MS);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.capture.device = Some("USB Mic".to_string());
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(AppConfig::from_toml("[capture]\nchunk_ms = 0").is_err());
        assert!(AppConfig::from_toml("[playback]\nbuffer_seconds = 0.0").is_err());
        assert!(AppConfig::from_toml("[transport]\nurl = \"ws://x/voice\"").is_err());
        assert!(AppConfig::from_toml("capture = 3").is_err());
    }

    #[test]
    fn test_window_and_url() {
        let config = AppConfig::default();
        assert_eq!(config.capture.window_samples(48000), 4800);
        assert_eq!(
            config.transport.url_for("abc"),
            "ws://127.0.0.1:8000/ws/voice/abc"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("pcm-voice-bridge-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.playback.buffer_seconds = 30.0;
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(dir);
    }
}
