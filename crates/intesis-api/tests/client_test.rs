#![allow(clippy::unwrap_used)]
// Integration tests for `IntesisClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intesis_api::{Error, GrantType, IntesisClient, ServiceChange, TokenRequest};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, IntesisClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = IntesisClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("access-1".to_owned())
}

fn password_grant() -> TokenRequest {
    TokenRequest::password(
        GrantType::Password,
        Some("client-id".into()),
        Some(SecretString::from("client-secret".to_owned())),
        "user@example.com".into(),
        SecretString::from("hunter2".to_owned()),
    )
}

// ── Token tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_password_grant_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user%40example.com"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client.request_token(&password_grant()).await.unwrap();

    assert_eq!(token.access_token.expose_secret(), "access-1");
    assert_eq!(token.refresh_token.unwrap().expose_secret(), "refresh-1");
    assert_eq!(token.expires_in.unwrap().as_secs(), 3600);
}

#[tokio::test]
async fn test_refresh_grant_sends_refresh_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "access_token": "access-2" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request =
        TokenRequest::refresh(None, None, SecretString::from("refresh-1".to_owned()));
    let token = client.request_token(&request).await.unwrap();

    assert_eq!(token.access_token.expose_secret(), "access-2");
}

#[tokio::test]
async fn test_token_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let result = client.request_token(&password_grant()).await;

    match result {
        Err(Error::Unauthorized { status, ref message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("invalid_grant"), "got: {message}");
        }
        other => panic!("expected Unauthorized error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_without_access_token_is_malformed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 60 })))
        .mount(&server)
        .await;

    let result = client.request_token(&password_grant()).await;

    assert!(
        matches!(result, Err(Error::Malformed { .. })),
        "expected Malformed error, got: {result:?}"
    );
}

// ── Config tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_config() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "devices": [{
                "device_id": "dev-1",
                "name": "Living Room",
                "services": {
                    "power": { "value": true },
                    "setpoint_temp": { "value": 22, "min": 18, "max": 30, "step": 0.5 }
                }
            }]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let config = client.fetch_config(&token()).await.unwrap();

    assert_eq!(config.devices.len(), 1);
    let device = &config.devices[0];
    assert_eq!(device.device_id, "dev-1");
    assert_eq!(device.name.as_deref(), Some("Living Room"));
    assert_eq!(device.services["setpoint_temp"].step, Some(0.5));
}

#[tokio::test]
async fn test_fetch_config_empty_array_is_malformed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = client.fetch_config(&token()).await;

    assert!(
        matches!(result, Err(Error::Malformed { .. })),
        "expected Malformed error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_config_ignores_trailing_elements() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "devices": [{ "device_id": "dev-1", "services": {} }] },
            "meta"
        ])))
        .mount(&server)
        .await;

    let config = client.fetch_config(&token()).await.unwrap();

    assert_eq!(config.devices.len(), 1);
    assert_eq!(config.devices[0].device_id, "dev-1");
}

#[tokio::test]
async fn test_fetch_config_expired_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.fetch_config(&token()).await;

    assert!(
        matches!(result, Err(Error::Unauthorized { status: 401, .. })),
        "expected Unauthorized error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_config_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/config"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = client.fetch_config(&token()).await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Set tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_value_returns_accepted_value() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/set"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_json(json!([{
            "device_id": "dev-1",
            "service_id": "fan_speed",
            "value": "position-two"
        }])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([["dev-1", "fan_speed", "position-two"]])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let change = ServiceChange::new("dev-1", "fan_speed", json!("position-two"));
    let accepted = client.set_value(&token(), &change).await.unwrap();

    assert_eq!(accepted, json!("position-two"));
}

#[tokio::test]
async fn test_set_value_ignores_trailing_elements() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/set"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([["dev-1", "power", true], { "status": "ok" }])),
        )
        .mount(&server)
        .await;

    let change = ServiceChange::new("dev-1", "power", json!(true));
    let accepted = client.set_value(&token(), &change).await.unwrap();

    assert_eq!(accepted, json!(true));
}

#[tokio::test]
async fn test_set_value_short_row_is_malformed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/set"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([["dev-1"]])))
        .mount(&server)
        .await;

    let change = ServiceChange::new("dev-1", "power", json!(false));
    let result = client.set_value(&token(), &change).await;

    assert!(
        matches!(result, Err(Error::Malformed { .. })),
        "expected Malformed error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_set_value_requires_ids() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let change = ServiceChange::new("", "power", json!(true));
    let result = client.set_value(&token(), &change).await;

    assert!(
        matches!(result, Err(Error::MissingField("device_id"))),
        "expected MissingField error, got: {result:?}"
    );
}
