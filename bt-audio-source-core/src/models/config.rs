use serde::{Deserialize, Serialize};

use super::format::AudioFormat;

/// Receive buffer size: 64 KiB, allocated once per source.
pub const RECEIVE_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a Bluetooth audio source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfiguration {
    /// Receive buffer capacity in bytes (default: 64 KiB).
    pub buffer_capacity: usize,

    /// Throttle reads to wall-clock time (default: true).
    ///
    /// Disabling this only skips the post-read wait; the media clock still advances.
    pub live_pacing: bool,

    /// Format assumed until `prepare` supplies one (default: 44.1 kHz, stereo, 16 bit).
    pub default_format: AudioFormat,
}

impl SourceConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_capacity < 4 {
            return Err(format!("buffer capacity too small: {}", self.buffer_capacity));
        }
        self.default_format.validate()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SourceConfiguration {
    fn default() -> Self {
        Self {
            buffer_capacity: RECEIVE_BUFFER_SIZE,
            live_pacing: true,
            default_format: AudioFormat::default(),
        }
    }
}
