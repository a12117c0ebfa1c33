use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use api::{ApiClient, ApiError, ApiRequest, ErrorKind};
use common::{ClientConfig, TokenPair, TokenStore};
use reqwest::StatusCode;
use test_utils::FakeBackend;

struct Harness {
    backend: FakeBackend,
    client: ApiClient,
    tokens: TokenStore,
    expired: Arc<AtomicUsize>,
    user: i64,
}

async fn harness() -> Harness {
    let backend = FakeBackend::start().await;
    let user = backend.seed_user("alice", "alice@example.com", "password123");

    let tokens = TokenStore::in_memory();
    tokens.save(&backend.issue_tokens(user)).unwrap();

    let expired = Arc::new(AtomicUsize::new(0));
    let counter = expired.clone();
    let config = ClientConfig::for_api(&backend.base_url).unwrap();
    let client = ApiClient::builder(config, tokens.clone())
        .on_session_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    Harness {
        backend,
        client,
        tokens,
        expired,
        user,
    }
}

#[tokio::test]
async fn test_stored_token_is_sent_as_bearer() {
    let h = harness().await;
    let access = h.tokens.access_token().unwrap().unwrap();

    let me: serde_json::Value = h
        .client
        .send_json(ApiRequest::get("/users/me/"))
        .await
        .unwrap();
    assert_eq!(me["id"], h.user);

    let seen = h.backend.requests_to("/users/me/");
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].authorization.as_deref(),
        Some(format!("Bearer {}", access).as_str())
    );
}

#[tokio::test]
async fn test_no_token_means_no_header() {
    let h = harness().await;
    h.tokens.clear().unwrap();

    let result = h.client.send(ApiRequest::get("/users/me/")).await;
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let seen = h.backend.requests_to("/users/me/");
    assert_eq!(seen[0].authorization, None);
    // Nothing to refresh with
    assert_eq!(h.backend.refresh_calls(), 0);
    assert_eq!(h.expired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let h = harness().await;
    let old_access = h.tokens.access_token().unwrap().unwrap();
    let refresh = h.tokens.refresh_token().unwrap().unwrap();
    h.backend.expire_access_tokens();

    let me: serde_json::Value = h
        .client
        .send_json(ApiRequest::get("/users/me/"))
        .await
        .unwrap();
    assert_eq!(me["username"], "alice");

    assert_eq!(h.backend.refresh_calls(), 1);
    let seen = h.backend.requests_to("/users/me/");
    assert_eq!(seen.len(), 2);

    let new_access = h.tokens.access_token().unwrap().unwrap();
    assert_ne!(new_access, old_access);
    assert_eq!(
        seen[1].authorization.as_deref(),
        Some(format!("Bearer {}", new_access).as_str())
    );
    // The refresh token is kept
    assert_eq!(h.tokens.refresh_token().unwrap(), Some(refresh));
    assert_eq!(h.expired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_request_carries_no_bearer() {
    let h = harness().await;
    h.backend.expire_access_tokens();

    h.client.send(ApiRequest::get("/users/me/")).await.unwrap();

    let refreshes = h.backend.requests_to("/auth/refresh/");
    assert_eq!(refreshes.len(), 1);
    assert_eq!(refreshes[0].authorization, None);
}

#[tokio::test]
async fn test_replayed_request_is_not_retried_again() {
    let h = harness().await;
    h.backend.reject_all_access();

    let result = h.client.send(ApiRequest::get("/users/me/")).await;
    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Authorization);

    assert_eq!(h.backend.refresh_calls(), 1);
    assert_eq!(h.backend.requests_to("/users/me/").len(), 2);
    // The refresh itself worked, so the session is kept
    assert!(h.tokens.has_session().unwrap());
    assert_eq!(h.expired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_refresh_clears_tokens_and_expires_session() {
    let h = harness().await;
    h.backend.expire_access_tokens();
    h.backend.fail_refresh();

    let result = h.client.send(ApiRequest::get("/users/me/")).await;
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    assert_eq!(h.tokens.access_token().unwrap(), None);
    assert_eq!(h.tokens.refresh_token().unwrap(), None);
    assert_eq!(h.expired.load(Ordering::SeqCst), 1);
    // No replay after a failed refresh
    assert_eq!(h.backend.requests_to("/users/me/").len(), 1);
}

#[tokio::test]
async fn test_other_statuses_pass_through_untouched() {
    let h = harness().await;
    h.backend.fail("GET", "/posts/", 500);

    let error = h
        .client
        .send(ApiRequest::get("/posts/").query("page", 1))
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(error.kind(), ErrorKind::Request);
    assert_eq!(h.backend.refresh_calls(), 0);

    h.backend.fail("GET", "/posts/", 403);
    let error = h.client.send(ApiRequest::get("/posts/")).await.unwrap_err();
    assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(h.backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_validation_errors_are_mapped_per_field() {
    let h = harness().await;
    h.backend.seed_group(h.user, "Close friends", Vec::new());

    let request = ApiRequest::post("/friend-groups/")
        .json(&serde_json::json!({"name": "Close friends"}))
        .unwrap();
    let error = h.client.send(request).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(
        error
            .field_errors()
            .and_then(|e| e.get("name"))
            .is_some()
    );
}

#[tokio::test]
async fn test_multipart_request_survives_replay() {
    let h = harness().await;
    h.backend.expire_access_tokens();

    let request = ApiRequest::post("/posts/").multipart(vec![
        api::FormField::text("content_type", "text"),
        api::FormField::text("text_content", "replayed"),
        api::FormField::text("audience_type", "everyone"),
    ]);
    let post: serde_json::Value = h.client.send_json(request).await.unwrap();

    assert_eq!(post["text_content"], "replayed");
    assert_eq!(h.backend.refresh_calls(), 1);
    assert_eq!(h.backend.requests_to("/posts/").len(), 2);
}

#[tokio::test]
async fn test_saved_pair_is_used_after_login_elsewhere() {
    let h = harness().await;
    let other = h.backend.seed_user("bob", "bob@example.com", "password123");
    let TokenPair { access, refresh } = h.backend.issue_tokens(other);
    h.tokens
        .save(&TokenPair {
            access,
            refresh,
        })
        .unwrap();

    let me: serde_json::Value = h
        .client
        .send_json(ApiRequest::get("/users/me/"))
        .await
        .unwrap();
    assert_eq!(me["username"], "bob");
}
