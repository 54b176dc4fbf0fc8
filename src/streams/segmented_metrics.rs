//! Segmented campaign metrics stream
//!
//! Daily segments per metric. Each `(campaign_id, metric)` pair is its own
//! state partition, so metrics advance independently.

use super::metrics::{metric_path, metric_schema, metrics, window_params};
use super::{StreamSettings, StreamStrategy};
use crate::error::{Error, Result};
use crate::http::{validate_status, HttpResponse};
use crate::pagination::{DateWindowPaginator, PageToken};
use crate::schema::{JsonSchema, Property};
use crate::types::{Context, StringMap};
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;

/// `GET /metrics/{metric}/segment` per campaign and metric
#[derive(Debug, Clone)]
pub struct SegmentedCampaignMetricsStream {
    settings: StreamSettings,
    paginator: DateWindowPaginator,
}

impl SegmentedCampaignMetricsStream {
    /// Create the stream
    pub fn new(settings: StreamSettings) -> Self {
        let paginator = DateWindowPaginator::new(settings.today);
        Self {
            settings,
            paginator,
        }
    }
}

/// Day named by the first token of a `period` such as `03/15/24 00:00`
pub fn period_date(period: &str) -> Option<NaiveDate> {
    let first = period.split_whitespace().next()?;
    NaiveDate::parse_from_str(first, "%m/%d/%y").ok()
}

impl StreamStrategy for SegmentedCampaignMetricsStream {
    fn name(&self) -> &'static str {
        "segmented_campaign_metrics"
    }

    fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn path(&self, context: &Context) -> Result<String> {
        metric_path(self.name(), context, "segment")
    }

    fn schema(&self) -> JsonSchema {
        metric_schema().property("date", Property::date())
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["campaign_id", "metric", "date"]
    }

    fn records_jsonpath(&self) -> &'static str {
        "$.result.segmented[*]"
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("date")
    }

    fn parent_stream(&self) -> Option<&'static str> {
        Some("campaigns")
    }

    fn url_params(
        &self,
        context: &Context,
        token: Option<&PageToken>,
        starting_value: Option<&str>,
    ) -> Result<StringMap> {
        window_params(
            self.name(),
            &self.settings,
            context,
            token,
            starting_value,
            "segment_by[period]",
        )
    }

    fn next_page_token(&self, response: &HttpResponse, _body: &Value) -> Result<Option<PageToken>> {
        self.paginator.next_token(response)
    }

    /// Throttling and server errors are retried, other client errors abort
    fn validate_response(&self, response: &HttpResponse) -> Result<()> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::retriable_api(
                status.as_u16(),
                response.reason(),
                response.request_path(),
            ));
        }
        validate_status(response)
    }

    fn post_process(&self, mut record: Value, _context: &Context) -> Option<Value> {
        let period = record.get("period").and_then(Value::as_str).map(str::to_owned);
        match period.as_deref().map(|p| (p, period_date(p))) {
            Some((_, Some(day))) => {
                if let Some(obj) = record.as_object_mut() {
                    obj.insert(
                        "date".to_string(),
                        Value::String(day.format("%Y-%m-%d").to_string()),
                    );
                }
            }
            Some((raw, None)) => warn!("Unparseable period '{raw}' in {}", self.name()),
            None => {}
        }
        Some(record)
    }

    fn partitions(&self, parent: Option<&Context>) -> Vec<Context> {
        let base = parent
            .map(|ctx| ctx.project(&["campaign_id"]))
            .unwrap_or_default();
        metrics()
            .map(|metric| base.clone().with("metric", metric))
            .collect()
    }
}
