//! Application configuration.
//!
//! Layers, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.{toml,yaml,json}` (optional)
//! 3. `config/{APP_ENV}.{toml,yaml,json}` (optional)
//! 4. environment variables `VITRINA__*` (e.g. `VITRINA__PORT=9000`)

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";
const ENV_PREFIX: &str = "VITRINA";

/// Secret used when none is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "vitrina-development-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// PostgreSQL URL; without one the in-memory store is used.
    pub database_url: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub database_max_connections: u32,

    #[validate(length(min = 16))]
    pub jwt_secret: String,

    #[validate(range(min = 60))]
    pub jwt_ttl_secs: i64,

    #[validate(custom(function = "validate_log_level"))]
    pub log_level: String,

    pub log_json: bool,

    /// Cache the product listings and the category list.
    pub cache_enabled: bool,

    #[validate(range(min = 1, max = 86400))]
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    /// Load for the environment named by `APP_ENV` (default `development`).
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
        Self::load_layers(&env, Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    fn load_layers(env: &str, overrides: Environment) -> Result<Self, ConfigError> {
        info!(environment = env, "loading configuration");

        let config = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_max_connections", 5)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_ttl_secs", 3600)?
            .set_default("log_level", "info")?
            .set_default("log_json", false)?
            .set_default("cache_enabled", true)?
            .set_default("cache_ttl_secs", 300)?
            .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
            .add_source(File::with_name(&format!("{CONFIG_DIR}/{env}")).required(false))
            .add_source(overrides)
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn jwt_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt_ttl_secs)
    }

    /// Cache lifetime, or `None` when caching is off.
    pub fn cache_ttl(&self) -> Option<std::time::Duration> {
        self.cache_enabled
            .then(|| std::time::Duration::from_secs(self.cache_ttl_secs))
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(source));
        AppConfig::load_layers("test", env)
    }

    #[test]
    fn defaults_load_and_use_the_dev_secret() {
        let cfg = load_with(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
        assert!(cfg.database_url.is_none());
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.jwt_ttl(), chrono::Duration::hours(1));
        assert_eq!(cfg.cache_ttl(), Some(std::time::Duration::from_secs(300)));
    }

    #[test]
    fn cache_can_be_switched_off() {
        let cfg = load_with(&[("VITRINA__CACHE_ENABLED", "false")]).unwrap();
        assert_eq!(cfg.cache_ttl(), None);

        let err = load_with(&[("VITRINA__CACHE_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = load_with(&[
            ("VITRINA__PORT", "9000"),
            ("VITRINA__DATABASE_URL", "postgres://localhost/vitrina"),
            ("VITRINA__LOG_JSON", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/vitrina"));
        assert!(cfg.log_json);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = load_with(&[("VITRINA__LOG_LEVEL", "loud")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load_with(&[("VITRINA__JWT_SECRET", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
