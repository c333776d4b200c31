//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable naming the address to listen on.
pub const BIND_ADDR_VAR: &str = "TRANSIT_BIND_ADDR";
/// Environment variable naming the directory feed files are imported from.
pub const DATA_DIR_VAR: &str = "TRANSIT_DATA_DIR";
/// Environment variable naming the directory feeds are exported to.
pub const EXPORT_DIR_VAR: &str = "TRANSIT_EXPORT_DIR";

/// Error returned when a configuration value cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var} '{value}': {reason}")]
pub struct ConfigError {
    var: &'static str,
    value: String,
    reason: &'static str,
}

/// Configuration for the transit server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,

    /// Directory that import requests name files in.
    /// Every supported feed file found here is loaded at startup.
    pub data_dir: PathBuf,

    /// Directory the export endpoint writes to.
    pub export_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = value.trim().parse().map_err(|_| ConfigError {
                var: BIND_ADDR_VAR,
                value: value.clone(),
                reason: "expected host:port, e.g. 127.0.0.1:3000",
            })?;
        }
        if let Some(value) = lookup(DATA_DIR_VAR) {
            config.data_dir = non_empty_path(DATA_DIR_VAR, value)?;
        }
        if let Some(value) = lookup(EXPORT_DIR_VAR) {
            config.export_dir = non_empty_path(EXPORT_DIR_VAR, value)?;
        }

        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

fn non_empty_path(var: &'static str, value: String) -> Result<PathBuf, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError {
            var,
            value,
            reason: "must not be empty",
        });
    }
    Ok(PathBuf::from(value))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            export_dir: PathBuf::from("export"),
        }
    }
}
