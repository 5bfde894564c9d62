use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{FieldError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub surface: SurfaceConfig,
    pub friendship: FriendshipConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Fields that are absent keep their
    /// default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::info!(?path, "loaded configuration");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(FieldError::InvalidInput("display size must be non-zero"));
        }
        if self.display.refresh_hz == 0 {
            return Err(FieldError::InvalidInput("refresh rate must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.friendship.coupling) {
            return Err(FieldError::InvalidInput("coupling must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Size and cadence of the host display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub refresh_hz: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 640,
            refresh_hz: 60,
        }
    }
}

/// Configuration contract handed down by the host for each surface. The
/// engine only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub complexity: Complexity,
    pub interaction_enabled: bool,
    pub reduced_motion: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            complexity: Complexity::Medium,
            interaction_enabled: true,
            reduced_motion: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendshipConfig {
    /// Initial coupling `K` between the two agents.
    pub coupling: f64,
}

impl Default for FriendshipConfig {
    fn default() -> Self {
        Self { coupling: 0.5 }
    }
}

/// Rendering density and effect level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for Complexity {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(FieldError::msg(format!("unknown complexity `{other}`"))),
        }
    }
}
