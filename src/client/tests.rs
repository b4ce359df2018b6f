//! Tests for the authenticated request executor

use super::*;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::session::{MemoryFlag, SessionIndicator};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mint an unsigned JWT-shaped token expiring `ttl_seconds` from now.
fn make_token(ttl_seconds: i64) -> String {
    let now = Utc::now();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "id": "user-42",
            "username": "ada",
            "role": "customer",
            "iat": now.timestamp(),
            "exp": (now + Duration::seconds(ttl_seconds)).timestamp(),
        })
        .to_string(),
    );
    format!("{header}.{payload}.signature")
}

fn client(server: &MockServer, session: Arc<dyn SessionIndicator>) -> ApiClient {
    ApiClient::new(ClientConfig::new(server.uri()), session).unwrap()
}

async fn mount_refresh(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "accessToken": token })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_valid_token_attached_without_refresh() {
    let mock_server = MockServer::start().await;
    let token = make_token(600);

    mount_refresh(&mock_server, &make_token(3600), 0).await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));
    client.token_store().set_raw(&token).await.unwrap();

    let response = client.get("/api/products").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_proactive_refresh_inside_skew_window() {
    let mock_server = MockServer::start().await;
    let renewed = make_token(3600);

    mount_refresh(&mock_server, &renewed, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(header("Authorization", format!("Bearer {renewed}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"orders": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));
    // Still valid for a minute, but inside the 300s renewal window.
    client.token_store().set_raw(&make_token(60)).await.unwrap();

    let response = client.get("/api/orders").await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(client.token_store().current().await.unwrap().raw(), renewed);
}

#[tokio::test]
async fn test_concurrent_executes_share_one_refresh() {
    let mock_server = MockServer::start().await;
    let renewed = make_token(3600);

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "accessToken": renewed }))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/vouchers"))
        .and(header("Authorization", format!("Bearer {renewed}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"vouchers": []})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));

    let (a, b, c) = tokio::join!(
        client.get("/api/vouchers"),
        client.get("/api/vouchers"),
        client.get("/api/vouchers"),
    );

    assert_eq!(a.unwrap().status(), 200);
    assert_eq!(b.unwrap().status(), 200);
    assert_eq!(c.unwrap().status(), 200);
}

#[tokio::test]
async fn test_refresh_failure_fans_out_and_blocks_resource_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_delay(std::time::Duration::from_millis(50)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/carts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));

    let (a, b, c) = tokio::join!(
        client.get("/api/carts"),
        client.get("/api/carts"),
        client.get("/api/carts"),
    );

    for outcome in [a, b, c] {
        assert!(matches!(
            outcome.unwrap_err(),
            Error::TokenRefreshFailed { .. }
        ));
    }
    assert!(client.token_store().current().await.is_none());
}

#[tokio::test]
async fn test_never_authenticated_fails_with_zero_network_calls() {
    let mock_server = MockServer::start().await;

    mount_refresh(&mock_server, &make_token(3600), 0).await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(false)));

    let err = client.get("/api/products").await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn test_refresh_failure_then_logout_classifies_separately() {
    let mock_server = MockServer::start().await;

    // One refresh attempt in total: the post-logout call must not hit the
    // network at all.
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let flag = Arc::new(MemoryFlag::new(true));
    let client = client(&mock_server, flag.clone());

    let err = client.get("/api/products").await.unwrap_err();
    assert!(matches!(err, Error::TokenRefreshFailed { .. }));

    flag.set(false);
    let err = client.get("/api/products").await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn test_post_refresh_401_surfaces_unmodified() {
    let mock_server = MockServer::start().await;
    let token = make_token(600);

    // A revoked-but-valid-looking token: the 401 is the caller's to handle,
    // and no refresh cycle fires in response to it.
    mount_refresh(&mock_server, &make_token(3600), 0).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));
    client.token_store().set_raw(&token).await.unwrap();

    let response = client.get("/api/admin/orders").await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_default_and_request_headers_and_query() {
    let mock_server = MockServer::start().await;
    let token = make_token(600);

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(header("X-Shop-Id", "main"))
        .and(header("X-Request-Id", "abc123"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder(mock_server.uri())
        .header("X-Shop-Id", "main")
        .build();
    let client = ApiClient::new(config, Arc::new(MemoryFlag::new(true))).unwrap();
    client.token_store().set_raw(&token).await.unwrap();

    let request = RequestConfig::new()
        .query("page", "2")
        .header("X-Request-Id", "abc123");
    let response = client.get_with_config("/api/products", request).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;
    let token = make_token(600);
    let body = serde_json::json!({"sku": "tea-001", "quantity": 2});

    Mock::given(method("POST"))
        .and(path("/api/carts/current/items"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));
    client.token_store().set_raw(&token).await.unwrap();

    let response = client.post("/api/carts/current/items", body).await.unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_get_json_parses_body() {
    let mock_server = MockServer::start().await;
    let token = make_token(600);

    Mock::given(method("GET"))
        .and(path("/api/products/tea-001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"sku": "tea-001", "price": 450})),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, Arc::new(MemoryFlag::new(true)));
    client.token_store().set_raw(&token).await.unwrap();

    let body: serde_json::Value = client.get_json("/api/products/tea-001").await.unwrap();
    assert_eq!(body["sku"], "tea-001");
    assert_eq!(body["price"], 450);
}
