//! Calculator settings loading from config.toml
//!
//! All settings are optional. A missing file yields the defaults; a present file is
//! parsed and validated. The path can be overridden with `JUBILACION_CONFIG`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default UD value offered when a new calculation is started
pub const DEFAULT_UD_VALUE: f64 = 1.0;
/// Default upper bound on the number of months a period may expand to
pub const DEFAULT_MAX_MONTHS: usize = 600;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Calculator behaviour
    #[serde(default)]
    pub calculator: CalculatorSettings,
}

/// The `[calculator]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    /// UD value pre-filled in the parameters step
    pub default_ud_value: f64,
    /// Largest period, in months, accepted by the parameters step
    pub max_months: usize,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            default_ud_value: DEFAULT_UD_VALUE,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

impl Settings {
    fn validate(self) -> Result<Self> {
        let ud = self.calculator.default_ud_value;
        if !ud.is_finite() || ud <= 0.0 {
            return Err(Error::Config {
                message: format!("default_ud_value must be positive, got {ud}"),
            });
        }
        if self.calculator.max_months == 0 {
            return Err(Error::Config {
                message: "max_months must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value is out of range.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    settings.validate()
}

/// Loads settings from a TOML file, returning defaults when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, parsed or validated.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        info!("No settings file at {:?}, using defaults.", path_ref);
        return Ok(Settings::default());
    }

    debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `JUBILACION_CONFIG` or `./config.toml`.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("JUBILACION_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_settings(path)
}
