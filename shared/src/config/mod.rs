//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT secrets, token lifetimes and the session policy
//! - `cache` - Redis configuration for the shared session cache
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `store` - Token store backend selection

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, SessionPolicyConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use store::{DatabaseType, StoreConfig};

/// Prefix for environment variable overrides, e.g. `BLOG__AUTH__JWT__ISSUER`
pub const ENV_PREFIX: &str = "BLOG";

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Token store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                database_type: DatabaseType::Memory,
                ..Default::default()
            },
            logging: LoggingConfig::for_environment(Environment::Development),
            ..Default::default()
        }
    }

    /// Load configuration from an optional file plus environment overrides
    ///
    /// Sources, lowest priority first: built-in defaults, the TOML/YAML/JSON
    /// file at `path` (if it exists), then `BLOG__`-prefixed variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize::<AppConfig>()?)
    }

    /// Load configuration using the file that matches the current environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = Environment::from_env();
        let mut config = Self::load(Some(env.config_file()))?;
        config.environment = env;
        Ok(config)
    }
}
