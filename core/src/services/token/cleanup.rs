//! Token cleanup service for periodic maintenance of the blacklist
//!
//! Expired blacklist rows carry no meaning, so they are purged on a fixed
//! interval. The in-process blacklist cache is left untouched.

use std::sync::Arc;
use std::time::Duration;

use blog_shared::config::StoreConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::repositories::TokenRepository;

/// Configuration for token cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

impl From<&StoreConfig> for TokenCleanupConfig {
    fn from(store: &StoreConfig) -> Self {
        Self {
            interval_seconds: store.cleanup_interval_seconds,
            enabled: store.cleanup_interval_seconds > 0,
        }
    }
}

/// Service for cleaning up expired blacklist entries
pub struct TokenCleanupService<R: TokenRepository + ?Sized + 'static> {
    repository: Arc<R>,
    config: TokenCleanupConfig,
}

impl<R: TokenRepository + ?Sized + 'static> TokenCleanupService<R> {
    /// Create a new token cleanup service
    pub fn new(repository: Arc<R>, config: TokenCleanupConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &TokenCleanupConfig {
        &self.config
    }

    /// Run a single cleanup cycle
    ///
    /// Store failures are recorded in [`CleanupResult::errors`]; the next
    /// cycle retries.
    pub async fn run_cleanup(&self) -> CleanupResult {
        if !self.config.enabled {
            return CleanupResult::default();
        }

        info!("Starting token cleanup cycle");

        let mut result = CleanupResult::default();

        match self.repository.clean_expired_tokens().await {
            Ok(count) => {
                result.blacklist_entries_deleted = count;
                info!(deleted = count, "Deleted expired blacklist entries");
            }
            Err(e) => {
                error!(error = %e, "Failed to clean up blacklist");
                result.errors.push(format!("Blacklist cleanup error: {}", e));
            }
        }

        result
    }

    /// Start the cleanup service as a background task
    ///
    /// The task ticks every `interval_seconds` until `shutdown` is cancelled.
    /// Returns `None` when cleanup is disabled.
    pub fn start_background_task(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return None;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                "Token cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Token cleanup service stopped");
                        break;
                    }
                    _ = interval_timer.tick() => {
                        let result = self.run_cleanup().await;
                        if !result.errors.is_empty() {
                            warn!(errors = ?result.errors, "Cleanup completed with errors");
                        }
                    }
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired blacklist entries deleted
    pub blacklist_entries_deleted: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of items cleaned up
    pub fn total_cleaned(&self) -> usize {
        self.blacklist_entries_deleted
    }
}
