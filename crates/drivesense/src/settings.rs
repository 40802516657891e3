//! Application settings
//!
//! Layered from an optional TOML file and `DRIVESENSE__*` environment
//! variables, e.g. `DRIVESENSE__MONITOR__EAR_THRESHOLD=0.22`.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use dms::MonitorConfig;
use kinematics::{KinematicConfig, SimulatorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default settings file, looked up in the working directory
const DEFAULT_SETTINGS_FILE: &str = "drivesense";

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Emit JSON log lines
    pub json: bool,
}

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub kinematics: KinematicConfig,
    pub simulator: SimulatorConfig,
    pub logging: LoggingSettings,
    /// Seed for message selection
    pub message_seed: Option<u64>,
}

impl Settings {
    /// Load settings from `path` (required) or `drivesense.toml` (optional),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("DRIVESENSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.monitor
            .validate()
            .context("Invalid monitor settings")?;
        self.kinematics
            .validate()
            .context("Invalid kinematics settings")?;
        anyhow::ensure!(
            self.simulator.period_ms > 0,
            "Simulator period must be positive"
        );
        Ok(())
    }
}
