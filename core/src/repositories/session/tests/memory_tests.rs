//! Unit tests for the in-memory session cache

use std::time::Duration;

use uuid::Uuid;

use crate::errors::StoreError;
use crate::repositories::session::{InMemorySessionCache, SessionCache};

#[tokio::test]
async fn test_set_get_delete() {
    let cache = InMemorySessionCache::new();
    let user = Uuid::new_v4();

    assert_eq!(cache.get(user).await.unwrap(), None);

    cache.set(user, "t1", Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(user).await.unwrap().as_deref(), Some("t1"));

    cache.delete(user).await.unwrap();
    assert_eq!(cache.get(user).await.unwrap(), None);

    // Deleting a missing entry is fine
    cache.delete(user).await.unwrap();
}

#[tokio::test]
async fn test_last_write_wins() {
    let cache = InMemorySessionCache::new();
    let user = Uuid::new_v4();

    cache.set(user, "device-1", Duration::from_secs(60)).await.unwrap();
    cache.set(user, "device-2", Duration::from_secs(60)).await.unwrap();

    assert_eq!(cache.get(user).await.unwrap().as_deref(), Some("device-2"));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire() {
    let cache = InMemorySessionCache::new();
    let user = Uuid::new_v4();

    cache.set(user, "t1", Duration::from_secs(30)).await.unwrap();
    tokio::time::advance(Duration::from_secs(29)).await;
    assert!(cache.get(user).await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get(user).await.unwrap().is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_unrepresentable_ttl_is_rejected() {
    let cache = InMemorySessionCache::new();
    let user = Uuid::new_v4();

    let result = cache.set(user, "t1", Duration::MAX).await;
    assert!(matches!(result, Err(StoreError::Constraint { .. })));
    assert!(cache.is_empty());
}
