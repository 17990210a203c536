//! Service bootstrap
//!
//! Wires the selected backends into a token service, rebuilds the
//! in-process blacklist before any request is served, and owns the
//! background cleanup task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use blog_core::errors::DomainError;
use blog_core::repositories::{SessionCache, TokenRepository};
use blog_core::services::token::{
    RequestContext, TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig,
};

use crate::backend::{build_backends, Backends};
use crate::config::AppConfig;
use crate::database::DatabasePool;
use crate::InfrastructureError;

/// Token service over whichever backends were configured
pub type SharedTokenService = TokenService<dyn TokenRepository, dyn SessionCache>;

/// Upper bound for loading the blacklist at startup
const WARM_UP_TIMEOUT: Duration = Duration::from_secs(30);

/// Running authentication core
pub struct AuthRuntime {
    service: Arc<SharedTokenService>,
    shutdown: CancellationToken,
    cleanup: Option<JoinHandle<()>>,
    database: Option<DatabasePool>,
}

impl AuthRuntime {
    /// Connect the configured backends and start the core
    pub async fn start(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let backends = build_backends(config).await?;
        Self::with_backends(config, backends).await
    }

    /// Start the core on already connected backends
    ///
    /// Fails if the configuration is invalid or the blacklist cannot be
    /// loaded; serving traffic with a cold blacklist would accept revoked
    /// tokens.
    pub async fn with_backends(
        config: &AppConfig,
        backends: Backends,
    ) -> Result<Self, InfrastructureError> {
        if config.auth.jwt.is_using_default_secret() {
            if config.environment.is_production() {
                return Err(InfrastructureError::Config(
                    "default JWT secrets are not allowed in production".to_string(),
                ));
            }
            warn!("Using default JWT secrets; set BLOG__AUTH__JWT__* before deploying");
        }

        let service_config = TokenServiceConfig::try_from(&config.auth)?;
        let service = Arc::new(TokenService::new(
            Arc::clone(&backends.repository),
            Arc::clone(&backends.sessions),
            service_config,
        )?);

        let shutdown = CancellationToken::new();
        let ctx = RequestContext::new()
            .with_cancellation(shutdown.child_token())
            .with_timeout(WARM_UP_TIMEOUT);
        let loaded = service
            .warm_up_blacklist(&ctx)
            .await
            .map_err(DomainError::from)?;

        let cleanup = Arc::new(TokenCleanupService::new(
            Arc::clone(&backends.repository),
            TokenCleanupConfig::from(&config.store),
        ))
        .start_background_task(shutdown.child_token());

        info!(
            backend = %backends.kind,
            blacklisted = loaded,
            single_session = config.auth.session.single_session,
            "Authentication core started"
        );

        Ok(Self {
            service,
            shutdown,
            cleanup,
            database: backends.database,
        })
    }

    pub fn service(&self) -> &Arc<SharedTokenService> {
        &self.service
    }

    /// Token that is cancelled when the runtime shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the cleanup task and close the database pool
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Some(handle) = self.cleanup {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cleanup task ended abnormally");
            }
        }
        if let Some(pool) = self.database {
            pool.close().await;
        }
        info!("Authentication core stopped");
    }
}
