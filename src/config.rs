//! Design configuration.
//!
//! Every input of a design lives in one [`DesignConfig`], which can be
//! loaded from a TOML file. Missing sections fall back to their defaults.

use crate::asset::DoorStyle;
use crate::gas::{DEFAULT_TEMPERATURE, ExtinctionSizing};
use crate::layout::UseCase;
use crate::pick::SnapSettings;
use crate::room::{Layer, RoomSpec};
use crate::route::AgentSource;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSystem {
    /// Only manually placed point detectors.
    #[default]
    PointDetectors,
    /// Aspirating sampling lines piped to line-detection units.
    Aspirating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub system: DetectionSystem,
    /// Layers monitored by sampling lines.
    pub layers: Vec<Layer>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            system: DetectionSystem::default(),
            layers: vec![Layer::Ceiling, Layer::Occupied, Layer::RaisedFloor],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtinguishingSystem {
    #[default]
    None,
    /// IG-55 cylinder bank
    InertGas,
    /// Hi-Fog water-mist tank
    WaterMist,
}

impl ExtinguishingSystem {
    pub fn label(&self) -> &'static str {
        match self {
            ExtinguishingSystem::None => "None",
            ExtinguishingSystem::InertGas => "IG55 (inert gas)",
            ExtinguishingSystem::WaterMist => "Hi-Fog (water mist)",
        }
    }

    /// Agent source to route from, or `None` when nothing is installed.
    pub fn source(&self, sizing: &ExtinctionSizing) -> Option<AgentSource> {
        match self {
            ExtinguishingSystem::None => None,
            ExtinguishingSystem::InertGas => Some(AgentSource::CylinderBank {
                count: sizing.ig55_cylinders,
            }),
            ExtinguishingSystem::WaterMist => Some(AgentSource::Tank),
        }
    }
}

/// Complete set of design inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Design temperature in °C for agent sizing.
    pub temperature: f64,
    pub door_style: DoorStyle,
    pub extinguishing: ExtinguishingSystem,
    pub room: RoomSpec,
    pub use_case: UseCase,
    pub detection: DetectionConfig,
    pub snapping: SnapSettings,
}

impl DesignConfig {
    pub fn new() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            door_style: DoorStyle::default(),
            extinguishing: ExtinguishingSystem::default(),
            room: RoomSpec::default(),
            use_case: UseCase::default(),
            detection: DetectionConfig::default(),
            snapping: SnapSettings::default(),
        }
    }

    /// Checks every numeric parameter.
    pub fn validate(&self) -> Result<()> {
        self.room.validate()?;
        self.use_case.validate()?;
        if !self.temperature.is_finite() {
            bail!("Temperature must be a finite number, got {}", self.temperature);
        }
        if !self.snapping.step.is_finite() || self.snapping.step <= 0.0 {
            bail!("Snap step must be positive, got {}", self.snapping.step);
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Example
    /// ```
    /// use firesafe3d::config::DesignConfig;
    ///
    /// let config = DesignConfig::from_toml_str("[room]\nlength = 12.0\nwidth = 8.0\nheight_fp = 0.4\nheight_amb = 2.8\nheight_fc = 0.6\n").unwrap();
    /// assert_eq!(config.room.length, 12.0);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse design config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize design config")
    }

    /// Reads a design config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Writes the config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_toml_string()?;
        fs::write(path, text).with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self::new()
    }
}
