//! Detailed campaign metrics stream
//!
//! One state partition per campaign. Within it every metric is walked from
//! the campaign's bookmark to yesterday in windows of at most 100 days.

use super::metrics::{metric_path, metric_schema, metrics, window_params};
use super::{StreamSettings, StreamStrategy};
use crate::error::Result;
use crate::http::HttpResponse;
use crate::pagination::{DateWindowPaginator, PageToken};
use crate::schema::{JsonSchema, Property};
use crate::types::{Context, StringMap};
use serde_json::Value;

/// `GET /metrics/{metric}/detalize` per campaign
#[derive(Debug, Clone)]
pub struct CampaignMetricsStream {
    settings: StreamSettings,
    paginator: DateWindowPaginator,
}

impl CampaignMetricsStream {
    /// Create the stream
    pub fn new(settings: StreamSettings) -> Self {
        let paginator = DateWindowPaginator::new(settings.today);
        Self {
            settings,
            paginator,
        }
    }
}

impl StreamStrategy for CampaignMetricsStream {
    fn name(&self) -> &'static str {
        "campaign_metrics"
    }

    fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn path(&self, context: &Context) -> Result<String> {
        metric_path(self.name(), context, "detalize")
    }

    fn schema(&self) -> JsonSchema {
        metric_schema()
            .property("start_date", Property::date_time())
            .property("end_date", Property::date_time())
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["campaign_id", "metric", "start_date"]
    }

    fn records_jsonpath(&self) -> &'static str {
        "$.result.detalized[*]"
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("start_date")
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
            "detalize_by[period]",
        )
    }

    fn next_page_token(&self, response: &HttpResponse, _body: &Value) -> Result<Option<PageToken>> {
        self.paginator.next_token(response)
    }

    fn partitions(&self, parent: Option<&Context>) -> Vec<Context> {
        vec![parent
            .map(|ctx| ctx.project(&["campaign_id"]))
            .unwrap_or_default()]
    }

    fn request_contexts(&self, partition: &Context) -> Vec<Context> {
        metrics()
            .map(|metric| partition.clone().with("metric", metric))
            .collect()
    }
}
