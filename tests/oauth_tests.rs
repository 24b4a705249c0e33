//! Integration tests for the OAuth2 token lifecycle against a mock server.

use chrono::{Duration as ChronoDuration, Utc};
use drchrono_client::{ChronoConfig, DrChronoClient};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base_config(server: &MockServer) -> drchrono_client::ChronoConfigBuilder {
    ChronoConfig::builder()
        .base_url(&server.uri())
        .client_id("client-id")
        .client_secret("client-secret")
        .redirect_uri("https://app.example.com/callback")
}

#[tokio::test]
async fn test_exchange_code_stores_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "expires_in": 172800,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DrChronoClient::new(base_config(&server).build().unwrap()).unwrap();
    let response = client
        .oauth()
        .exchange_authorization_code("auth-code-1")
        .await
        .unwrap();

    assert_eq!(response.access_token, "new-access");
    assert_eq!(client.config().access_token().as_deref(), Some("new-access"));
    assert!(!client.config().is_token_expired());

    let expires_at = client.config().token_expires_at().unwrap();
    assert!(expires_at > Utc::now() + ChronoDuration::seconds(172000));
}

#[tokio::test]
async fn test_exchange_does_not_send_stale_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
        })))
        .mount(&server)
        .await;

    let config = base_config(&server).access_token("stale-token").build().unwrap();
    let client = DrChronoClient::new(config).unwrap();
    client
        .oauth()
        .exchange_authorization_code("auth-code-2")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_refresh_falls_back_to_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=stored-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "refreshed-access",
            "expires_in": 172800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("old-access")
        .refresh_token("stored-refresh")
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    client.oauth().refresh_access_token(None).await.unwrap();

    assert_eq!(
        client.config().access_token().as_deref(),
        Some("refreshed-access")
    );
    // The response carried no refresh token, so the stored one survives.
    let refresh = client.config().tokens().refresh_token().unwrap();
    assert_eq!(secrecy::ExposeSecret::expose_secret(&refresh), "stored-refresh");
}

#[tokio::test]
async fn test_revoke_clears_token_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/revoke_token/"))
        .and(body_string_contains("token=doomed-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("doomed-token")
        .refresh_token("doomed-refresh")
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    client.oauth().revoke_token(None).await.unwrap();

    assert!(client.config().access_token().is_none());
    assert!(client.config().tokens().refresh_token().is_none());
    assert!(client.config().token_expires_at().is_none());
}

#[tokio::test]
async fn test_revoke_ignores_non_json_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/revoke_token/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("doomed-token")
        .refresh_token("doomed-refresh")
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    client.oauth().revoke_token(None).await.unwrap();

    assert!(client.config().access_token().is_none());
    assert!(client.config().tokens().refresh_token().is_none());
}

#[tokio::test]
async fn test_token_endpoint_failure_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "upstream down"})),
        )
        .mount(&server)
        .await;

    let client = DrChronoClient::new(base_config(&server).build().unwrap()).unwrap();
    let err = client
        .oauth()
        .exchange_authorization_code("auth-code-3")
        .await
        .unwrap_err();

    assert_eq!(err.error_kind(), "token_request_failed");
    // The original server error rides along as the source.
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.to_string().contains("upstream down"));
}

#[tokio::test]
async fn test_ensure_valid_token_skips_network_when_fresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("fresh-token")
        .refresh_token("refresh")
        .token_expires_at(Utc::now() + ChronoDuration::hours(2))
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    assert!(client.oauth().ensure_valid_token().await.unwrap());
    assert!(client.oauth().ensure_valid_token().await.unwrap());
}

#[tokio::test]
async fn test_ensure_valid_token_refreshes_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "renewed",
            "expires_in": 172800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("expired-token")
        .refresh_token("refresh")
        .token_expires_at(Utc::now() - ChronoDuration::hours(1))
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    assert!(client.oauth().ensure_valid_token().await.unwrap());
    assert_eq!(client.config().access_token().as_deref(), Some("renewed"));
}

#[tokio::test]
async fn test_ensure_valid_token_swallows_refresh_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "error_description": "refresh token revoked"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("expired-token")
        .refresh_token("revoked-refresh")
        .token_expires_at(Utc::now() - ChronoDuration::hours(1))
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    assert!(!client.oauth().ensure_valid_token().await.unwrap());
}

#[tokio::test]
async fn test_ensure_valid_token_without_refresh_presumes_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = base_config(&server)
        .access_token("expired-token")
        .token_expires_at(Utc::now() - ChronoDuration::hours(1))
        .build()
        .unwrap();
    let client = DrChronoClient::new(config).unwrap();

    // Expired but with nothing to refresh with: treated as present.
    assert!(client.oauth().ensure_valid_token().await.unwrap());
}
