//! Backend selection
//!
//! Resolves the configured `DatabaseType` once, at startup, into the pair of
//! trait objects the token service runs on. Nothing downstream inspects the
//! backend kind again.

use std::sync::Arc;

use tracing::info;

use blog_core::repositories::{
    InMemorySessionCache, InMemoryTokenRepository, SessionCache, TokenRepository,
};

use crate::cache::{RedisClient, RedisSessionCache};
use crate::config::{AppConfig, DatabaseType};
use crate::database::{DatabasePool, MySqlTokenRepository};
use crate::InfrastructureError;

/// Store and session cache chosen for this process
pub struct Backends {
    pub kind: DatabaseType,
    pub repository: Arc<dyn TokenRepository>,
    pub sessions: Arc<dyn SessionCache>,
    /// Pool behind the MySQL store, closed on shutdown
    pub database: Option<DatabasePool>,
    /// Concrete in-memory store, so development setups can seed users
    pub memory: Option<Arc<InMemoryTokenRepository>>,
}

impl Backends {
    /// Process-local store and session cache
    pub fn in_memory() -> Self {
        let memory = Arc::new(InMemoryTokenRepository::new());
        Self {
            kind: DatabaseType::Memory,
            repository: memory.clone(),
            sessions: Arc::new(InMemorySessionCache::new()),
            database: None,
            memory: Some(memory),
        }
    }

    /// MySQL token store with a Redis session cache
    pub async fn mysql(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let pool = DatabasePool::new(config.database.clone()).await?;
        pool.ping().await?;
        let repository = MySqlTokenRepository::new(pool.get_pool().clone());
        if config.store.ensure_schema {
            repository.ensure_schema().await?;
        }
        info!(pool = %pool.statistics(), "Token store reachable");

        let redis = RedisClient::new(config.cache.clone()).await?;
        redis.ping().await?;

        Ok(Self {
            kind: DatabaseType::Mysql,
            repository: Arc::new(repository),
            sessions: Arc::new(RedisSessionCache::new(redis)),
            database: Some(pool),
            memory: None,
        })
    }
}

/// Build the backends named by `config.store.database_type`
pub async fn build_backends(config: &AppConfig) -> Result<Backends, InfrastructureError> {
    let backends = match config.store.database_type {
        DatabaseType::Memory => Backends::in_memory(),
        DatabaseType::Mysql => Backends::mysql(config).await?,
    };
    info!(backend = %backends.kind, "Token store backend ready");
    Ok(backends)
}
