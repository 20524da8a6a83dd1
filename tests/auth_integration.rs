//! Integration tests for the client-credentials exchange and provider configuration.

use devcycle_provider::auth::get_auth_token_from;
use devcycle_provider::{AuthError, DevCycleProvider, ProviderError};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token_endpoint(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=my-client"))
        .and(body_string_contains("client_secret=my-secret"))
        .and(body_string_contains("audience=https%3A%2F%2Fapi.devcycle.com%2F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 86400
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_exchange_returns_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "issued-token").await;

    let token = get_auth_token_from(
        &format!("{}/oauth/token", server.uri()),
        "my-client",
        "my-secret",
    )
    .await
    .unwrap();

    assert_eq!(token.access_token, "issued-token");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 86400);
}

#[tokio::test]
async fn test_rejected_exchange_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "access_denied"})),
        )
        .mount(&server)
        .await;

    let err = get_auth_token_from(
        &format!("{}/oauth/token", server.uri()),
        "my-client",
        "wrong",
    )
    .await
    .unwrap_err();

    match err {
        AuthError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("access_denied"));
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_configure_authenticates_and_uses_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "issued-token").await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/web/environments/development"))
        .and(bearer_token("issued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "e1",
            "_project": "p1",
            "key": "development",
            "name": "Development",
            "description": "",
            "color": "#60a5fa",
            "type": "development"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = DevCycleProvider::configure(json!({
        "client_id": "my-client",
        "client_secret": "my-secret",
        "auth_url": format!("{}/oauth/token", server.uri()),
        "api_url": server.uri(),
    }))
    .await
    .unwrap();

    let response = provider
        .read_data_source(
            "devcycle_environment",
            json!({"key": "development", "project_key": "web"}),
        )
        .await;

    assert!(!response.has_errors());
    let state = response.state.unwrap();
    assert_eq!(state["id"], "e1");
    assert_eq!(state["sdk_keys"], json!([]));
}

#[tokio::test]
async fn test_configure_with_access_token_skips_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = DevCycleProvider::configure(json!({
        "access_token": "preissued",
        "auth_url": format!("{}/oauth/token", server.uri()),
        "api_url": server.uri(),
    }))
    .await;

    assert!(provider.is_ok());
}

#[tokio::test]
async fn test_configure_rejects_wrongly_typed_block() {
    let err = DevCycleProvider::configure(json!({"client_id": 7}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn test_configure_reports_failed_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = DevCycleProvider::configure(json!({
        "client_id": "my-client",
        "client_secret": "my-secret",
        "auth_url": format!("{}/oauth/token", server.uri()),
    }))
    .await
    .unwrap_err();

    assert!(matches!(err, ProviderError::Configuration(_)));
    assert!(err.message().contains("unable to authenticate"));
}
