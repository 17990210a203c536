//! Per-call cancellation, deadline and client metadata

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::StoreError;

/// Context a caller hands to every token service operation
///
/// Cancelling the token or passing the deadline makes any in-flight store
/// call return [`StoreError::Cancelled`] or [`StoreError::TimedOut`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    /// Client IP recorded on issued tokens
    pub client_ip: Option<String>,
    /// Client user agent recorded on issued tokens
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cancellation token, e.g. a child of the request's token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Absolute deadline for the whole operation
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach client metadata
    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.client_ip = ip;
        self.user_agent = user_agent;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a durable store call under `min(deadline, now + limit)`
    pub(crate) async fn guard_store<T, F>(&self, limit: Duration, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let budget = Instant::now() + limit;
        let until = match self.deadline {
            Some(deadline) if deadline < budget => deadline,
            _ => budget,
        };
        self.race(until, call).await
    }

    /// Run a session cache call under its own short limit
    pub(crate) async fn guard_cache<T, F>(&self, limit: Duration, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.race(Instant::now() + limit, call).await
    }

    async fn race<T, F>(&self, until: Instant, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            outcome = tokio::time::timeout_at(until, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(StoreError::TimedOut),
            },
        }
    }
}
