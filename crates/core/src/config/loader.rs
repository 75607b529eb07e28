//! Configuration loading.
//!
//! An optional TOML file provides the base; `STREMBOX_`-prefixed
//! environment variables override it (`__` separates sections, e.g.
//! `STREMBOX_TORBOX__API_KEY`). Everything has a default except the three
//! API keys, which validation enforces.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "STREMBOX_";

/// Load configuration from an optional file plus environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string (useful for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
