//! Configuration management for Space Nomad.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MISSION_STORE` - Optional. `sqlite` (default) or `memory`.
//! - `DATABASE_PATH` - Optional. SQLite database file. Defaults to `./space_nomad.db`.
//! - `SPACEX_API_URL` - Optional. Launch feed endpoint. Defaults to the SpaceX v4 launches API.
//! - `SYNC_INTERVAL_SECS` - Optional. Seconds between periodic syncs. Defaults to `3600`.
//! - `HTTP_TIMEOUT_SECS` - Optional. Timeout for launch feed requests. Defaults to `30`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api::mission_store::MissionStoreType;

pub const DEFAULT_SPACEX_API_URL: &str = "https://api.spacexdata.com/v4/launches";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Which mission store backend to use
    pub store_type: MissionStoreType,

    /// SQLite database file (ignored by the memory store)
    pub database_path: PathBuf,

    /// Launch feed endpoint
    pub spacex_api_url: String,

    /// Interval between periodic syncs
    pub sync_interval: Duration,

    /// Timeout for a single launch feed request
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            store_type: MissionStoreType::default(),
            database_path: PathBuf::from("space_nomad.db"),
            spacex_api_url: DEFAULT_SPACEX_API_URL.to_string(),
            sync_interval: Duration::from_secs(3600),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse
    /// or the sync interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?,
            None => defaults.port,
        };

        let store_type = lookup("MISSION_STORE")
            .map(|s| MissionStoreType::from_str(&s))
            .unwrap_or(defaults.store_type);

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let spacex_api_url = lookup("SPACEX_API_URL").unwrap_or(defaults.spacex_api_url);

        let sync_interval = match lookup("SYNC_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue("SYNC_INTERVAL_SECS".to_string(), format!("{}", e))
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "SYNC_INTERVAL_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.sync_interval,
        };

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue("HTTP_TIMEOUT_SECS".to_string(), format!("{}", e))
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "HTTP_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        Ok(Self {
            host,
            port,
            store_type,
            database_path,
            spacex_api_url,
            sync_interval,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.store_type, MissionStoreType::Sqlite);
        assert_eq!(config.sync_interval, Duration::from_secs(3600));
        assert_eq!(config.spacex_api_url, DEFAULT_SPACEX_API_URL);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9100"),
            ("MISSION_STORE", "memory"),
            ("SYNC_INTERVAL_SECS", "60"),
            ("DATABASE_PATH", "/tmp/missions.db"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.store_type, MissionStoreType::Memory);
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.database_path, PathBuf::from("/tmp/missions.db"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "PORT"));
    }

    #[test]
    fn test_zero_sync_interval_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SYNC_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue(ref key, _) if key == "SYNC_INTERVAL_SECS"
        ));
    }

    #[test]
    fn test_zero_http_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue(ref key, _) if key == "HTTP_TIMEOUT_SECS"
        ));

        let config = Config::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }
}
