//! FILENAME: app/src/config.rs
//! Dashboard configuration.
//!
//! # Priority Order
//!
//! 1. Environment variables `DASHBOARD_*` (highest)
//! 2. JSON configuration file
//! 3. Defaults

use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use pivot_engine::{try_resolve, ShippingDimension, DEFAULT_MEASURE};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const ENV_PREFIX: &str = "DASHBOARD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Maritime traffic document (default: data/shipping.json)
    #[serde(default = "default_shipping_path")]
    pub shipping_path: PathBuf,

    /// Grid capacity document (default: data/grid_capacity.json)
    #[serde(default = "default_grid_path")]
    pub grid_path: PathBuf,

    /// Unified log file; console only when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// One of off, error, warn, info, debug, trace (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_to_console")]
    pub log_to_console: bool,

    /// Results kept per memo cache (default: 64)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_measure")]
    pub default_measure: String,

    #[serde(default = "default_primary")]
    pub default_primary: ShippingDimension,

    #[serde(default = "default_secondary")]
    pub default_secondary: ShippingDimension,
}

fn default_shipping_path() -> PathBuf {
    PathBuf::from("data/shipping.json")
}

fn default_grid_path() -> PathBuf {
    PathBuf::from("data/grid_capacity.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_console() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    pivot_engine::cache::DEFAULT_CAPACITY
}

fn default_measure() -> String {
    DEFAULT_MEASURE.to_string()
}

fn default_primary() -> ShippingDimension {
    ShippingDimension::VesselType
}

fn default_secondary() -> ShippingDimension {
    ShippingDimension::GtGroup
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            shipping_path: default_shipping_path(),
            grid_path: default_grid_path(),
            log_file: None,
            log_level: default_log_level(),
            log_to_console: default_log_to_console(),
            cache_capacity: default_cache_capacity(),
            default_measure: default_measure(),
            default_primary: default_primary(),
            default_secondary: default_secondary(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// File (if any), then the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        base.with_overrides(std::env::vars())
    }

    /// Applies `DASHBOARD_*` pairs from `vars`. Unrelated keys are ignored.
    pub fn with_overrides<I>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "SHIPPING_PATH" => self.shipping_path = PathBuf::from(value),
                "GRID_PATH" => self.grid_path = PathBuf::from(value),
                "LOG_FILE" => {
                    self.log_file = if value.trim().is_empty() { None } else { Some(PathBuf::from(value)) }
                }
                "LOG_LEVEL" => self.log_level = value,
                "LOG_TO_CONSOLE" => self.log_to_console = parse_flag(&value),
                "CACHE_CAPACITY" => {
                    self.cache_capacity = value.trim().parse().map_err(|_| {
                        AppError::Config(format!("{}CACHE_CAPACITY is not a number: {}", ENV_PREFIX, value))
                    })?
                }
                "DEFAULT_MEASURE" => self.default_measure = value,
                "DEFAULT_PRIMARY" => self.default_primary = parse_dimension(&value)?,
                "DEFAULT_SECONDARY" => self.default_secondary = parse_dimension(&value)?,
                other => log::debug!("ignoring unknown setting {}{}", ENV_PREFIX, other),
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if try_resolve(&self.default_measure).is_none() {
            return Err(AppError::UnknownMeasure(self.default_measure.clone()));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config("cacheCapacity must be at least 1".to_string()));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| AppError::Config(format!("unknown log level: {}", self.log_level)))
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value != "0" && !value.eq_ignore_ascii_case("false")
}

fn parse_dimension(value: &str) -> Result<ShippingDimension> {
    ShippingDimension::from_str(value.trim()).map_err(AppError::Config)
}
