//! Configuration loading and validation.

mod loader;
mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    CacheConfig, Config, ConfigError, JackettSection, ServerConfig, TmdbSection, TorBoxSection,
};

/// Check that every required credential is present.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.jackett.api_key.is_empty() {
        return Err(ConfigError::MissingKey("jackett.api_key"));
    }
    if config.torbox.api_key.is_empty() {
        return Err(ConfigError::MissingKey("torbox.api_key"));
    }
    if config.tmdb.api_key.is_empty() {
        return Err(ConfigError::MissingKey("tmdb.api_key"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_keys() {
        let mut config = Config::default();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingKey("jackett.api_key"))
        ));

        config.jackett.api_key = "j".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingKey("torbox.api_key"))
        ));

        config.torbox.api_key = "t".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingKey("tmdb.api_key"))
        ));

        config.tmdb.api_key = "m".into();
        assert!(validate_config(&config).is_ok());
    }
}
