//! Kernel configuration file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tube_kernel_deform::EngineSettings;
use tube_kernel_segment::ConnectSettings;
use tube_kernel_tube::MeshOptions;

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML is malformed or has wrong types.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed values are out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable of the kernel, as one TOML document.
///
/// All tables and keys are optional:
///
/// ```toml
/// [connect]
/// scale_factor = 0.9
///
/// [mesh]
/// cap_ends = true
///
/// [deform]
/// smoothing_enabled = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Lateral edge construction.
    pub connect: ConnectSettings,
    /// Mesh assembly.
    pub mesh: MeshOptions,
    /// Deformation engine.
    pub deform: EngineSettings,
}

impl KernelConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connect
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.deform
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}
