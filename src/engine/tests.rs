//! Tests for the sync engine

use super::*;
use crate::catalog::{Catalog, Selection};
use crate::error::Error;
use crate::http::HttpClientConfig;
use crate::streams::{all_streams, CampaignsStream, StreamSettings, TrafficSourcesStream};
use crate::types::BackoffType;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> StreamSettings {
    StreamSettings {
        site_slug: "shop".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        today: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    }
}

fn client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(10),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn only(streams: &[&str]) -> Selection {
    let entries: Vec<_> = streams
        .iter()
        .map(|s| {
            json!({
                "tap_stream_id": s,
                "metadata": [{"breadcrumb": [], "metadata": {"selected": true}}]
            })
        })
        .collect();
    Selection::Catalog(Catalog::from_json(&json!({ "streams": entries }).to_string()).unwrap())
}

async fn mount_campaigns(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(query_param("site_slug", "shop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"campaigns": [{"id": 42, "name": "Spring", "is_active": true}]}
        })))
        .mount(server)
        .await;
}

fn summary(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .map(|m| match m {
            Message::Schema { stream, .. } => format!("SCHEMA {stream}"),
            Message::Record { stream, .. } => format!("RECORD {stream}"),
            Message::State { .. } => "STATE".to_string(),
        })
        .collect()
}

fn records<'a>(messages: &'a [Message], name: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, record, .. } if stream == name => Some(record),
            _ => None,
        })
        .collect()
}

fn last_state(messages: &[Message]) -> Value {
    messages
        .iter()
        .rev()
        .find_map(|m| match m {
            Message::State { value } => Some(value.clone()),
            _ => None,
        })
        .unwrap()
}

#[tokio::test]
async fn test_full_refresh_streams_emit_in_order() {
    let server = MockServer::start().await;
    mount_campaigns(&server).await;
    Mock::given(method("GET"))
        .and(path("/traffic_sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"identifier": "email"}, {"identifier": "facebook"}]
        })))
        .mount(&server)
        .await;

    let streams: Vec<Box<dyn StreamStrategy>> = vec![
        Box::new(CampaignsStream::new(settings())),
        Box::new(TrafficSourcesStream::new(settings())),
    ];
    let mut engine = SyncEngine::new(
        client(&server),
        streams,
        StateManager::in_memory(),
        CollectingWriter::new(),
    );
    let stats = engine.sync_all().await.unwrap();

    assert_eq!(stats.records_synced, 3);
    assert_eq!(stats.pages_fetched, 2);
    let messages = engine.into_writer().into_messages();
    assert_eq!(
        summary(&messages),
        vec![
            "SCHEMA campaigns",
            "RECORD campaigns",
            "STATE",
            "SCHEMA traffic_sources",
            "RECORD traffic_sources",
            "RECORD traffic_sources",
            "STATE",
        ]
    );
    assert_eq!(records(&messages, "traffic_sources")[1]["identifier"], "facebook");
    assert_eq!(last_state(&messages), json!({"bookmarks": {}}));
}

#[tokio::test]
async fn test_next_page_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"campaigns": [{"id": 2}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"campaigns": [{"id": 1}]},
            "next_page": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let streams: Vec<Box<dyn StreamStrategy>> = vec![Box::new(CampaignsStream::new(settings()))];
    let mut engine = SyncEngine::new(
        client(&server),
        streams,
        StateManager::in_memory(),
        CollectingWriter::new(),
    );
    engine.sync_all().await.unwrap();

    let messages = engine.into_writer().into_messages();
    let ids: Vec<_> = records(&messages, "campaigns")
        .iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_repeated_next_page_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Next-Page", "2")
                .set_body_json(json!({"result": {"campaigns": []}})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let streams: Vec<Box<dyn StreamStrategy>> = vec![Box::new(CampaignsStream::new(settings()))];
    let mut engine = SyncEngine::new(
        client(&server),
        streams,
        StateManager::in_memory(),
        CollectingWriter::new(),
    );
    let err = engine.sync_all().await.unwrap_err();
    assert!(matches!(err, Error::PaginationLoop { ref stream, ref token } if stream == "campaigns" && token == "2"));
}

#[tokio::test]
async fn test_client_error_aborts_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(
        client(&server),
        all_streams(&settings()),
        StateManager::in_memory(),
        CollectingWriter::new(),
    );
    let err = engine.sync_all().await.unwrap_err();
    assert!(matches!(err, Error::FatalApi { status: 401, .. }));
}

#[tokio::test]
async fn test_child_runs_for_unselected_parent() {
    let server = MockServer::start().await;
    mount_campaigns(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/detalize$"))
        .and(query_param("campaign_ids", "42"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-01-14"))
        .and(query_param("detalize_by[period]", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"detalized": [{
                "plain": 1,
                "formatted": "1",
                "period": "01/01/24 - 01/14/24",
                "start_date": "2024-01-01T00:00:00Z",
                "end_date": "2024-01-14T00:00:00Z"
            }]}
        })))
        .expect(53)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/detalize$"))
        .and(query_param("start_date", "2024-01-14"))
        .and(query_param("end_date", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"detalized": []}
        })))
        .expect(53)
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(
        client(&server),
        all_streams(&settings()),
        StateManager::in_memory(),
        CollectingWriter::new(),
    )
    .with_selection(only(&["campaign_metrics"]));
    let stats = engine.sync_all().await.unwrap();
    assert_eq!(stats.pages_fetched, 1 + 106);

    let messages = engine.into_writer().into_messages();
    assert!(records(&messages, "campaigns").is_empty());
    assert!(!messages.iter().any(|m| m.stream() == Some("campaigns")));
    assert_eq!(messages[0].stream(), Some("campaign_metrics"));
    assert!(messages[0].is_schema());

    let metric_records = records(&messages, "campaign_metrics");
    assert_eq!(metric_records.len(), 53);
    assert_eq!(metric_records[0]["campaign_id"], 42);
    assert_eq!(metric_records[0]["metric"], "sign_up_percentage");
    assert_eq!(metric_records[52]["metric"], "total_first_time_sales_sum");

    assert_eq!(
        last_state(&messages),
        json!({"bookmarks": {"campaign_metrics": {"partitions": [{
            "context": {"campaign_id": 42},
            "replication_key": "start_date",
            "replication_key_value": "2024-01-01T00:00:00Z"
        }]}}})
    );
}

#[tokio::test]
async fn test_bookmark_starts_first_window() {
    let server = MockServer::start().await;
    mount_campaigns(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/detalize$"))
        .and(query_param("start_date", "2024-01-10"))
        .and(query_param("end_date", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"detalized": []}
        })))
        .expect(53)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/detalize$"))
        .and(query_param("start_date", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"detalized": []}
        })))
        .expect(53)
        .mount(&server)
        .await;

    let initial = json!({"bookmarks": {"campaign_metrics": {"partitions": [{
        "context": {"campaign_id": 42},
        "replication_key": "start_date",
        "replication_key_value": "2024-01-10T00:00:00Z"
    }]}}});
    let state = StateManager::from_json(&initial.to_string()).unwrap();

    let mut engine = SyncEngine::new(
        client(&server),
        all_streams(&settings()),
        state,
        CollectingWriter::new(),
    )
    .with_selection(only(&["campaign_metrics"]));
    engine.sync_all().await.unwrap();

    // Nothing newer was seen, so the bookmark stands
    assert_eq!(engine.state().to_value().await, initial);
}

#[tokio::test]
async fn test_segmented_stream_retries_throttling() {
    let server = MockServer::start().await;
    mount_campaigns(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/segment$"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/segment$"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("segment_by[period]", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"segmented": [
                {"plain": 2, "period": "01/02/24 00:00"},
                {"plain": 5, "period": "01/03/24 00:00"}
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/metrics/[a-z_]+/segment$"))
        .and(query_param("start_date", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"segmented": []}
        })))
        .mount(&server)
        .await;

    let mut engine = SyncEngine::new(
        client(&server),
        all_streams(&settings()),
        StateManager::in_memory(),
        CollectingWriter::new(),
    )
    .with_selection(only(&["segmented_campaign_metrics"]));
    engine.sync_all().await.unwrap();

    let messages = engine.into_writer().into_messages();
    let segmented = records(&messages, "segmented_campaign_metrics");
    assert_eq!(segmented.len(), 106);
    assert_eq!(segmented[0]["date"], "2024-01-02");
    assert_eq!(segmented[0]["metric"], "sign_up_percentage");
    assert_eq!(segmented[0]["campaign_id"], 42);

    let state = last_state(&messages);
    let partitions = state["bookmarks"]["segmented_campaign_metrics"]["partitions"]
        .as_array()
        .unwrap();
    assert_eq!(partitions.len(), 53);
    assert_eq!(
        partitions[0],
        json!({
            "context": {"campaign_id": 42, "metric": "sign_up_percentage"},
            "replication_key": "date",
            "replication_key_value": "2024-01-03"
        })
    );

    // One STATE per completed partition
    let states = messages.iter().filter(|m| m.is_state()).count();
    assert_eq!(states, 53);
}

#[test]
fn test_inject_context_keeps_record_values() {
    let mut record = json!({"metric": "from_api", "plain": 1});
    let ctx = Context::new().with("campaign_id", 42).with("metric", "offers");
    inject_context(&mut record, &ctx);
    assert_eq!(
        record,
        json!({"metric": "from_api", "plain": 1, "campaign_id": 42})
    );
}
