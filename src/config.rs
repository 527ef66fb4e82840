//! Optional JSON configuration for the command line tool.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Command line flags take precedence over the file.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thales_import::compensation::{DEFAULT_SMOOTHING_POLY_ORDER, DEFAULT_SMOOTHING_WINDOW};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Savitzky-Golay window for smoothing and measured calibration data.
    pub smoothing_window: usize,
    pub smoothing_poly_order: usize,
    /// Conjugate the short term during compensation.
    pub conjugate_short: bool,
    pub output_format: OutputFormat,
    /// Report every stored sample instead of the normalized sweep.
    pub full_span: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            smoothing_poly_order: DEFAULT_SMOOTHING_POLY_ORDER,
            conjugate_short: false,
            output_format: OutputFormat::Text,
            full_span: false,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Config file if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
