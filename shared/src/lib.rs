//! Shared utilities and common types for the blog server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and loading
//! - Error response structures
//! - Utility functions (duration parsing)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, ConfigError, DatabaseConfig, DatabaseType, Environment,
    JwtConfig, LoggingConfig, SessionPolicyConfig, StoreConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::duration::{parse_duration, DurationParseError};
