//! Dashboard configuration
//!
//! Defaults, overridden by an optional JSON file named in
//! `RACECAPTURE_CONFIG`, then by individual `RACECAPTURE_*` variables.

use crate::recorder::MAX_RECORDED_ROWS;
use crate::telemetry::{StoreOptions, HISTORY_CAPACITY};
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_ENV: &str = "RACECAPTURE_CONFIG";
pub const BIND_ENV: &str = "RACECAPTURE_BIND";
pub const TICK_ENV: &str = "RACECAPTURE_TICK_MS";
pub const HISTORY_ENV: &str = "RACECAPTURE_HISTORY";
pub const MAX_ROWS_ENV: &str = "RACECAPTURE_MAX_ROWS";
pub const EXPORT_DIR_ENV: &str = "RACECAPTURE_EXPORT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Sampling period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Samples kept per channel for charting
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Row cap for one recording session
    #[serde(default = "default_max_recorded_rows")]
    pub max_recorded_rows: usize,

    /// Initial directory for "save to SD" exports
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_history_capacity() -> usize {
    HISTORY_CAPACITY
}

fn default_max_recorded_rows() -> usize {
    MAX_RECORDED_ROWS
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("recordings")
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tick_interval_ms: default_tick_interval_ms(),
            history_capacity: default_history_capacity(),
            max_recorded_rows: default_max_recorded_rows(),
            export_dir: default_export_dir(),
        }
    }
}

impl DashboardConfig {
    /// Load from the process environment
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve environment variables
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    AppError::Config(format!("Failed to read config file {}: {}", path, e))
                })?;
                tracing::debug!("Loaded configuration from {}", path);
                serde_json::from_str(&content)?
            }
            None => Self::default(),
        };

        if let Some(bind) = lookup(BIND_ENV) {
            config.bind_addr = bind;
        }
        if let Some(tick) = lookup(TICK_ENV) {
            config.tick_interval_ms = parse_number(TICK_ENV, &tick)?;
        }
        if let Some(history) = lookup(HISTORY_ENV) {
            config.history_capacity = parse_number(HISTORY_ENV, &history)?;
        }
        if let Some(rows) = lookup(MAX_ROWS_ENV) {
            config.max_recorded_rows = parse_number(MAX_ROWS_ENV, &rows)?;
        }
        if let Some(dir) = lookup(EXPORT_DIR_ENV) {
            config.export_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.socket_addr()?;

        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("tick interval must be positive".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(AppError::Config("history capacity must be positive".to_string()));
        }
        if self.max_recorded_rows == 0 {
            return Err(AppError::Config("recording row cap must be positive".to_string()));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address {}: {}", self.bind_addr, e)))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            history_capacity: self.history_capacity,
            max_recorded_rows: self.max_recorded_rows,
        }
    }
}

fn parse_number<T>(key: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: {} ({})", key, value, e)))
}
