//! Process-local mirror of the durable token blacklist

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;
use tracing::{debug, warn};

/// Set of revoked token values consulted on every validation
///
/// Entries never expire here. The durable store is always written first, so
/// the cache can only lag behind it, never get ahead.
#[derive(Debug, Default)]
pub struct BlacklistCache {
    tokens: DashSet<String>,
    warmed: AtomicBool,
}

impl BlacklistCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every currently blacklisted value; returns how many were new
    pub fn warm_up<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        if self.warmed.swap(true, Ordering::AcqRel) {
            warn!("Blacklist cache warmed up more than once");
        }
        let added = entries
            .into_iter()
            .filter(|token| self.tokens.insert(token.clone()))
            .count();
        debug!(added, total = self.tokens.len(), "Blacklist cache warmed up");
        added
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Returns false if the token was already present
    pub fn add(&self, token: impl Into<String>) -> bool {
        self.tokens.insert(token.into())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_warm(&self) -> bool {
        self.warmed.load(Ordering::Acquire)
    }
}
