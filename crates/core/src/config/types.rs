//! Configuration types.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required configuration: {0}")]
    MissingKey(&'static str),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub jackett: JackettSection,
    #[serde(default)]
    pub torbox: TorBoxSection,
    #[serde(default)]
    pub tmdb: TmdbSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Indexer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettSection {
    #[serde(default = "default_jackett_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for JackettSection {
    fn default() -> Self {
        Self {
            url: default_jackett_url(),
            api_key: String::new(),
        }
    }
}

fn default_jackett_url() -> String {
    "http://localhost:9117".to_string()
}

/// Debrid settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TorBoxSection {
    #[serde(default)]
    pub api_key: String,
}

/// Metadata settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TmdbSection {
    #[serde(default)]
    pub api_key: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().expect("static address")
}

fn default_port() -> u16 {
    8080
}

/// Cache settings. TTLs are whole minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_search_ttl_mins")]
    pub search_ttl_mins: u64,
    #[serde(default = "default_metadata_ttl_mins")]
    pub metadata_ttl_mins: u64,
    #[serde(default = "default_debrid_check_ttl_mins")]
    pub debrid_check_ttl_mins: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            search_ttl_mins: default_search_ttl_mins(),
            metadata_ttl_mins: default_metadata_ttl_mins(),
            debrid_check_ttl_mins: default_debrid_check_ttl_mins(),
        }
    }
}

impl CacheConfig {
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_mins * 60)
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_mins * 60)
    }

    pub fn debrid_check_ttl(&self) -> Duration {
        Duration::from_secs(self.debrid_check_ttl_mins * 60)
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(".cache.json")
}

fn default_search_ttl_mins() -> u64 {
    30
}

fn default_metadata_ttl_mins() -> u64 {
    24 * 60
}

fn default_debrid_check_ttl_mins() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.jackett.url, "http://localhost:9117");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.cache.search_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(
            config.cache.metadata_ttl(),
            Duration::from_secs(24 * 60 * 60)
        );
        assert_eq!(
            config.cache.debrid_check_ttl(),
            Duration::from_secs(10 * 60)
        );
        assert_eq!(config.cache.snapshot_path, PathBuf::from(".cache.json"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml = r#"
[torbox]
api_key = "tb-key"

[server]
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.torbox.api_key, "tb-key");
        assert_eq!(config.server.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(config.jackett.url, "http://localhost:9117");
        assert_eq!(config.cache.search_ttl_mins, 30);
    }

    #[test]
    fn test_ttl_minute_resolution() {
        let toml = r#"
[cache]
search_ttl_mins = 5
metadata_ttl_mins = 60
debrid_check_ttl_mins = 1
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.search_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.metadata_ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache.debrid_check_ttl(), Duration::from_secs(60));
    }
}
