// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use crate::store::SortKey;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use strum::{Display, EnumIter, EnumString};

fn default_weekly_cap() -> f64 {
    40.0
}

fn default_debounce_ms() -> u64 {
    200
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimeUnit {
    #[default]
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Renders a duration stored in minutes in this unit.
    pub fn format(&self, minutes: f64) -> String {
        match self {
            TimeUnit::Minutes => format!("{} min", crate::model::item::format_minutes(minutes)),
            TimeUnit::Hours => format!("{:.1} h", minutes / 60.0),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub time_unit: TimeUnit,
    /// Weekly budget, in hours.
    #[serde(default = "default_weekly_cap")]
    pub weekly_cap: f64,

    #[serde(default)]
    pub case_sensitive_search: bool,
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default)]
    pub default_sort: SortKey,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::default(),
            // Match the serde defaults
            weekly_cap: 40.0,
            case_sensitive_search: false,
            search_debounce_ms: 200,
            default_sort: SortKey::default(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Loads the config, falling back to defaults when none was saved yet.
    /// Other failures (unreadable or malformed file) are still reported.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Helper to detect whether an anyhow::Error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        // Walk the error chain and look for an underlying IO NotFound.
        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Share of the weekly cap used by `weekly_hours`, as a percentage
    /// clamped to 100.
    pub fn cap_percentage(&self, weekly_hours: f64) -> f64 {
        if self.weekly_cap <= 0.0 {
            return if weekly_hours > 0.0 { 100.0 } else { 0.0 };
        }
        (weekly_hours / self.weekly_cap * 100.0).min(100.0)
    }
}
