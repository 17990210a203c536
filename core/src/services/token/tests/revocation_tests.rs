//! Tests for logout, explicit revocation and blacklist warm-up

use std::sync::Arc;

use chrono::Duration;

use super::support::{config, harness, start_time, Faults, UnreachableSessionCache};
use crate::clock::FixedClock;
use crate::domain::entities::token::BlacklistEntry;
use crate::errors::TokenError;
use crate::repositories::{InMemoryTokenRepository, SessionCache, TokenRepository};
use crate::services::token::{RequestContext, TokenService};

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let h = harness(true);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    for _ in 0..3 {
        assert_eq!(
            h.service.refresh_access_token(&ctx, &issued.refresh_token).await,
            Err(TokenError::Revoked)
        );
    }
    assert!(h.store.inner.is_token_blacklisted(&issued.refresh_token).await.unwrap());
    assert!(h.service.blacklist_cache().contains(&issued.refresh_token));
    assert!(h.store.inner.token_record(&issued.refresh_token).unwrap().is_revoked);
    assert!(h.sessions.get(h.user.uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();
    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    assert_eq!(h.store.inner.blacklist_len(), 1);
    assert_eq!(h.service.blacklist_cache().len(), 1);
}

#[tokio::test]
async fn test_logout_surfaces_blacklist_failure() {
    let h = harness(true);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();
    Faults::set(&h.store.faults.fail_blacklist);

    let result = h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await;
    assert!(matches!(result, Err(TokenError::Internal { .. })));

    // The cache is never written ahead of the durable store
    assert!(!h.service.blacklist_cache().contains(&issued.refresh_token));
    assert!(h.service.refresh_access_token(&ctx, &issued.refresh_token).await.is_ok());

    // The session entry was still dropped
    assert!(h.sessions.get(h.user.uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_fails_open_on_session_cache() {
    let clock = FixedClock::new(start_time());
    let store = Arc::new(InMemoryTokenRepository::with_clock(Arc::new(clock.clone())));
    let user = super::support::alice();
    store.insert_user(user.clone());

    let issuer = TokenService::with_clock(
        Arc::clone(&store),
        Arc::new(crate::repositories::InMemorySessionCache::new()),
        config(false),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let ctx = RequestContext::new();
    let issued = issuer.issue_login_tokens(&ctx, &user).await.unwrap();

    let service = TokenService::with_clock(
        Arc::clone(&store),
        Arc::new(UnreachableSessionCache),
        config(false),
        Arc::new(clock),
    )
    .unwrap();

    service.logout(&ctx, user.uuid, &issued.refresh_token).await.unwrap();
    assert_eq!(
        service.refresh_access_token(&ctx, &issued.refresh_token).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_logout_tolerates_record_update_failure() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();
    Faults::set(&h.store.faults.fail_revoke);

    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    assert!(!h.store.inner.token_record(&issued.refresh_token).unwrap().is_revoked);
    assert_eq!(
        h.service.refresh_access_token(&ctx, &issued.refresh_token).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_logout_rejects_forged_token() {
    let h = harness(false);
    let ctx = RequestContext::new();

    assert_eq!(
        h.service.logout(&ctx, h.user.uuid, "forged.token.value").await,
        Err(TokenError::Malformed)
    );
    assert_eq!(h.store.inner.blacklist_len(), 0);
}

#[tokio::test]
async fn test_logout_with_expired_refresh_token() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    h.clock.advance(Duration::days(8));
    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    assert_eq!(h.store.inner.blacklist_len(), 0);
    assert!(h.store.inner.token_record(&issued.refresh_token).unwrap().is_revoked);
}

#[tokio::test]
async fn test_revoke_access_token() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    h.service
        .revoke_token(&ctx, &issued.access_token, "password changed")
        .await
        .unwrap();

    assert_eq!(
        h.service.validate_access(&ctx, &issued.access_token).await,
        Err(TokenError::Revoked)
    );
    assert!(h.store.inner.is_token_blacklisted(&issued.access_token).await.unwrap());

    // The refresh token is untouched
    assert!(h.service.refresh_access_token(&ctx, &issued.refresh_token).await.is_ok());
    assert_eq!(
        h.service.revoke_token(&ctx, "garbage", "test").await,
        Err(TokenError::Malformed)
    );
}

#[tokio::test]
async fn test_revoke_all_sessions() {
    let h = harness(true);
    let ctx = RequestContext::new();
    let mut refresh_tokens = Vec::new();
    for _ in 0..3 {
        let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();
        refresh_tokens.push(issued.refresh_token);
    }

    assert_eq!(h.service.revoke_all_sessions(&ctx, &h.user).await.unwrap(), 3);

    for token in &refresh_tokens {
        assert_eq!(
            h.service.refresh_access_token(&ctx, token).await,
            Err(TokenError::Revoked)
        );
    }
    assert!(h.service.active_sessions(&ctx, h.user.id).await.unwrap().is_empty());
    assert!(h.sessions.get(h.user.uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_warm_up_serves_revocations_without_store_calls() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    // Revoked by an earlier process, before this one started
    h.store
        .inner
        .add_to_blacklist(BlacklistEntry::new(
            issued.access_token.clone(),
            start_time() + Duration::minutes(15),
            "admin ban",
        ))
        .await
        .unwrap();

    assert_eq!(h.service.warm_up_blacklist(&ctx).await.unwrap(), 1);
    assert!(h.service.blacklist_cache().is_warm());

    let calls_before = h.store.calls();
    Faults::set(&h.store.faults.panic_on_call);

    assert_eq!(
        h.service.validate_access(&ctx, &issued.access_token).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(h.store.calls(), calls_before);
}

#[tokio::test]
async fn test_warm_up_failure_is_internal() {
    let h = harness(false);
    Faults::set(&h.store.faults.fail_scan);

    let result = h.service.warm_up_blacklist(&RequestContext::new()).await;
    assert!(matches!(result, Err(TokenError::Internal { .. })));
    assert!(!h.service.blacklist_cache().is_warm());
}

#[tokio::test]
async fn test_other_instance_sees_revocation_after_warm_up() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();

    let peer = TokenService::with_clock(
        Arc::clone(&h.store),
        Arc::clone(&h.sessions),
        config(false),
        Arc::new(h.clock.clone()),
    )
    .unwrap();

    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    // Each process keeps its own cache
    assert!(peer.refresh_access_token(&ctx, &issued.refresh_token).await.is_ok());

    peer.warm_up_blacklist(&ctx).await.unwrap();
    assert_eq!(
        peer.refresh_access_token(&ctx, &issued.refresh_token).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_cleanup_expired_purges_store_only() {
    let h = harness(false);
    let ctx = RequestContext::new();
    let issued = h.service.issue_login_tokens(&ctx, &h.user).await.unwrap();
    h.service.logout(&ctx, h.user.uuid, &issued.refresh_token).await.unwrap();

    assert_eq!(h.service.cleanup_expired(&ctx).await.unwrap(), 0);

    h.clock.advance(Duration::days(7));
    assert_eq!(h.service.cleanup_expired(&ctx).await.unwrap(), 1);
    assert_eq!(h.store.inner.blacklist_len(), 0);

    // The cache keeps the entry; the token is expired anyway
    assert!(h.service.blacklist_cache().contains(&issued.refresh_token));
    assert_eq!(
        h.service.refresh_access_token(&ctx, &issued.refresh_token).await,
        Err(TokenError::Expired)
    );
}
