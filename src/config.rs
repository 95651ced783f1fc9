//! Configuration Module
//!
//! Loads service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{DEFAULT_TTL, DEFAULT_VERSION};
use crate::storage::DEFAULT_QUOTA_BYTES;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in milliseconds for writes that do not specify one
    pub default_ttl_ms: u64,
    /// Version tag for cache keys
    pub cache_version: String,
    /// Region bound when nothing else is known
    pub default_region: String,
    /// Backing file for persistent storage; in-memory if unset
    pub storage_path: Option<PathBuf>,
    /// Byte budget for the storage
    pub storage_quota_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default entry TTL in milliseconds (default: 600000)
    /// - `CACHE_VERSION` - Cache key version tag (default: v1)
    /// - `DEFAULT_REGION` - Fallback region code (default: US)
    /// - `STORAGE_PATH` - Storage file path (default: in-memory)
    /// - `STORAGE_QUOTA_BYTES` - Storage budget (default: 5 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expired-entry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_version),
            default_region: env::var("DEFAULT_REGION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_region),
            storage_path: env::var("STORAGE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            storage_quota_bytes: parse_var("STORAGE_QUOTA_BYTES")
                .unwrap_or(defaults.storage_quota_bytes),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL.as_millis() as u64,
            cache_version: DEFAULT_VERSION.to_string(),
            default_region: "US".to_string(),
            storage_path: None,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            server_port: 3000,
            sweep_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl_ms, 600_000);
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.default_region, "US");
        assert!(config.storage_path.is_none());
        assert_eq!(config.storage_quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 60);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for var in [
            "DEFAULT_TTL_MS",
            "CACHE_VERSION",
            "DEFAULT_REGION",
            "STORAGE_PATH",
            "STORAGE_QUOTA_BYTES",
            "SERVER_PORT",
            "SWEEP_INTERVAL",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();
        assert_eq!(config.default_ttl_ms, 600_000);
        assert_eq!(config.cache_version, "v1");
        assert!(config.storage_path.is_none());
        assert_eq!(config.server_port, 3000);
    }
}
