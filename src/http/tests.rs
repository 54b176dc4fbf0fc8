//! Tests for the HTTP client module

use super::*;
use crate::auth::{AuthConfig, Authenticator};
use crate::error::Error;
use crate::types::BackoffType;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(uri: String) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(uri)
        .max_retries(3)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build()
}

fn response_with(status: u16) -> HttpResponse {
    HttpResponse::new(
        StatusCode::from_u16(status).unwrap(),
        HeaderMap::new(),
        url::Url::parse("https://www.talkable.com/api/v2/campaigns?site_slug=shop").unwrap(),
        "",
    )
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 5);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("tap-talkable/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("page", "1")
        .header("X-Request-Id", "abc123")
        .timeout(Duration::from_secs(10))
        .retries(2);

    assert_eq!(config.query.get("page"), Some(&"1".to_string()));
    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(config.max_retries, Some(2));
}

#[test]
fn test_validate_status_classification() {
    assert!(validate_status(&response_with(200)).is_ok());
    assert!(validate_status(&response_with(302)).is_ok());

    let err = validate_status(&response_with(404)).unwrap_err();
    assert!(matches!(err, Error::FatalApi { status: 404, .. }));
    assert!(err.to_string().contains("/api/v2/campaigns?site_slug=shop"));

    let err = validate_status(&response_with(503)).unwrap_err();
    assert!(matches!(err, Error::RetriableApi { status: 503, .. }));

    // The default validator treats throttling as a client error
    let err = validate_status(&response_with(429)).unwrap_err();
    assert!(matches!(err, Error::FatalApi { status: 429, .. }));
}

#[test]
fn test_response_accessors() {
    let mut headers = HeaderMap::new();
    headers.insert("X-Next-Page", "3".parse().unwrap());
    let response = HttpResponse::new(
        StatusCode::OK,
        headers,
        url::Url::parse("https://example.com/metrics/offers/detalize?start_date=2024-01-01&end_date=2024-04-10")
            .unwrap(),
        r#"{"ok": true}"#,
    );

    assert_eq!(response.header("x-next-page"), Some("3"));
    assert_eq!(response.query_param("start_date"), Some("2024-01-01".to_string()));
    assert_eq!(response.query_param("end_date"), Some("2024-04-10".to_string()));
    assert_eq!(response.query_param("missing"), None);
    assert_eq!(response.json().unwrap()["ok"], true);
    assert_eq!(response.reason(), "OK");
}

#[tokio::test]
async fn test_http_client_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"campaigns": [{"id": 1}]}
        })))
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_config(fast_config(format!("{}/api/v2", mock_server.uri()))).unwrap();
    let response = client.get("/campaigns", RequestConfig::new()).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.json().unwrap()["result"]["campaigns"][0]["id"], 1);
}

#[tokio::test]
async fn test_http_client_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(query_param("site_slug", "shop"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client
        .get(
            "/campaigns",
            RequestConfig::new().query("site_slug", "shop").query("page", "2"),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.query_param("page"), Some("2".to_string()));
}

#[tokio::test]
async fn test_response_keeps_request_url_across_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/metrics/clicks/detalize"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/landing"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client
        .get(
            "/metrics/clicks/detalize",
            RequestConfig::new()
                .query("start_date", "2024-01-01")
                .query("end_date", "2024-01-14"),
        )
        .await
        .unwrap();

    assert_eq!(response.url().path(), "/metrics/clicks/detalize");
    assert_eq!(response.query_param("start_date"), Some("2024-01-01".to_string()));

    let paginator = crate::pagination::DateWindowPaginator::new(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    );
    assert_eq!(
        paginator.next_token(&response).unwrap(),
        Some(crate::pagination::PageToken::Date(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        ))
    );
}

#[tokio::test]
async fn test_http_client_default_headers_and_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(header("Authorization", "Bearer key-1"))
        .and(header("User-Agent", "custom-agent/2.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .header("User-Agent", "custom-agent/2.0")
        .no_rate_limit()
        .build();
    let client =
        HttpClient::with_auth(config, Authenticator::new(AuthConfig::bearer("key-1"))).unwrap();

    let response = client.get("/campaigns", RequestConfig::new()).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_404_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client
        .get("/missing", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FatalApi { status: 404, .. }));
}

#[tokio::test]
async fn test_http_client_retry_on_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client.get("/flaky", RequestConfig::new()).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_custom_validator_retries_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let validate = |response: &HttpResponse| {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::retriable_api(429, response.reason(), response.request_path()));
        }
        validate_status(response)
    };

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client
        .get_validated("/limited", RequestConfig::new(), &validate)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig {
        max_retries: 2,
        ..fast_config(mock_server.uri())
    };
    let client = HttpClient::with_config(config).unwrap();
    let err = client
        .get("/always-fail", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetriableApi { status: 500, .. }));
}

#[tokio::test]
async fn test_http_client_full_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();
    let client = HttpClient::with_config(config).unwrap();

    let response = client
        .get(&format!("{}/api/test", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[test]
fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://www.talkable.com/api/v2/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/metrics/offers/detalize"),
        "https://www.talkable.com/api/v2/metrics/offers/detalize"
    );
    assert_eq!(
        client.build_url("https://other.example.com/x"),
        "https://other.example.com/x"
    );
}

#[test]
fn test_calculate_backoff_constant() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_respects_max() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(10), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(client.has_rate_limiter());
}
