//! Tests for the auth module

use super::*;
use crate::config::TapConfig;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let client = reqwest::Client::new();
    let built = auth
        .apply(client.get("https://example.com/api"))
        .build()
        .unwrap();

    assert!(built.headers().get("Authorization").is_none());
    assert!(auth.authorization_header().is_none());
}

#[test]
fn test_bearer_header() {
    let auth = Authenticator::new(AuthConfig::bearer("my-token"));
    let client = reqwest::Client::new();
    let built = auth
        .apply(client.get("https://example.com/api"))
        .build()
        .unwrap();

    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer my-token"
    );
}

#[test]
fn test_for_tap_uses_api_key() {
    let config = TapConfig::new("secret-key", "shop");
    let auth = Authenticator::for_tap(&config);
    assert_eq!(
        auth.authorization_header(),
        Some("Bearer secret-key".to_string())
    );
}

#[test]
fn test_debug_masks_token() {
    let rendered = format!("{:?}", AuthConfig::bearer("do-not-print"));
    assert!(!rendered.contains("do-not-print"));
}

#[tokio::test]
async fn test_bearer_reaches_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/protected"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::bearer("test-token"));
    let client = reqwest::Client::new();
    let response = auth
        .apply(client.get(format!("{}/api/protected", mock_server.uri())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}
