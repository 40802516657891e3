//! Monitoring configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range ({min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Thresholds and intervention toggles, read on every sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Eye-aspect-ratio below which the eyes count as closed
    pub ear_threshold: f64,

    /// Mouth-aspect-ratio above which the mouth counts as open
    pub mar_threshold: f64,

    /// Eyes-closed duration before the driver counts as sleeping (seconds)
    pub wait_time_s: f64,

    /// Play alert tones
    pub sound_enabled: bool,

    /// Adjust already-playing music to the fatigue level
    pub auto_music: bool,

    /// Speak psychological and warning messages
    pub psych_messages: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            mar_threshold: 0.6,
            wait_time_s: 3.0,
            sound_enabled: true,
            auto_music: true,
            psych_messages: true,
        }
    }
}

impl MonitorConfig {
    /// Create strict config (eyes count as closed earlier, shorter wait)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.28,
            mar_threshold: 0.5,
            wait_time_s: 2.0,
            ..Default::default()
        }
    }

    /// Create lenient config
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.2,
            mar_threshold: 0.7,
            wait_time_s: 4.0,
            ..Default::default()
        }
    }

    /// Reject values that would produce meaningless or negative timers
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("ear_threshold", self.ear_threshold, 0.0, 1.0)?;
        check_range("mar_threshold", self.mar_threshold, 0.0, 2.0)?;
        check_range("wait_time_s", self.wait_time_s, 0.0, 60.0)?;
        Ok(())
    }

    /// Wait time in milliseconds
    pub fn wait_time_ms(&self) -> u64 {
        (self.wait_time_s * 1000.0).round() as u64
    }
}

/// Lower bound exclusive, upper bound inclusive; NaN never passes
fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value > min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
