//! # Infrastructure Layer
//!
//! Concrete adapters for the blog authentication core.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: MySQL token store using SQLx
//! - **Cache**: Redis client and the shared session cache
//! - **Backend**: resolution of the configured `DatabaseType` into trait objects
//! - **Bootstrap**: tracing setup, service construction, warm-up and cleanup
//!
//! Driver errors never leave this crate through the repository traits; they are
//! converted into `StoreError` at the adapter boundary.

use blog_core::errors::DomainError;

/// Backend selection
pub mod backend;

/// Service bootstrap
pub mod bootstrap;

/// Cache module - Redis client and session cache
pub mod cache;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// Tracing subscriber setup
pub mod telemetry;

/// Configuration types used by the adapters
pub mod config {
    pub use blog_shared::config::{
        AppConfig, CacheConfig, DatabaseConfig, DatabaseType, LoggingConfig, StoreConfig,
    };
}

pub use backend::{build_backends, Backends};
pub use bootstrap::{AuthRuntime, SharedTokenService};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Core construction or startup error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}
