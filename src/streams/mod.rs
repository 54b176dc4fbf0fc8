//! Talkable endpoint streams
//!
//! Each endpoint implements [`StreamStrategy`]. The engine drives every
//! strategy the same way: it asks for partitions and request contexts,
//! builds URL parameters, validates and decodes responses, and feeds the
//! returned page token into the next request.

mod campaign_metrics;
mod campaigns;
mod metrics;
mod segmented_metrics;
mod traffic_sources;

pub use campaign_metrics::CampaignMetricsStream;
pub use campaigns::CampaignsStream;
pub use metrics::{
    metrics, ADVOCATE_SALES_METRICS, FRIEND_SALES_METRICS, MATH_METRICS, METRIC_GROUPS,
    PREDEFINED_METRICS,
};
pub use segmented_metrics::SegmentedCampaignMetricsStream;
pub use traffic_sources::TrafficSourcesStream;

use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{validate_status, HttpResponse};
use crate::pagination::{NextPageTokenPaginator, PageToken};
use crate::schema::JsonSchema;
use crate::types::{Context, ReplicationMethod, StringMap};
use chrono::{NaiveDate, Utc};
use serde_json::Value;

/// Values every stream reads from the tap configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Site the API calls are made for
    pub site_slug: String,
    /// First day fetched when no bookmark exists
    pub start_date: NaiveDate,
    /// Day the run treats as today (UTC)
    pub today: NaiveDate,
}

impl StreamSettings {
    /// Settings for a run starting now
    pub fn from_config(config: &TapConfig) -> Self {
        Self {
            site_slug: config.site_slug.clone(),
            start_date: config.start_day(),
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the run date
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Extension points of one endpoint stream
pub trait StreamStrategy: Send + Sync {
    /// Stream name as emitted in messages
    fn name(&self) -> &'static str;

    /// Shared stream settings
    fn settings(&self) -> &StreamSettings;

    /// Request path for a request context, relative to the API base URL
    fn path(&self, context: &Context) -> Result<String>;

    /// Record schema
    fn schema(&self) -> JsonSchema;

    /// Primary key properties
    fn primary_keys(&self) -> &'static [&'static str];

    /// JSONPath locating records in a response body
    fn records_jsonpath(&self) -> &'static str;

    /// Incremental replication key
    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    /// Replication method implied by the replication key
    fn replication_method(&self) -> ReplicationMethod {
        if self.replication_key().is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }
    }

    /// Name of the stream whose records drive this one
    fn parent_stream(&self) -> Option<&'static str> {
        None
    }

    /// Query parameters for the next request
    ///
    /// `starting_value` is the bookmark committed for the partition when the
    /// run began.
    fn url_params(
        &self,
        _context: &Context,
        token: Option<&PageToken>,
        _starting_value: Option<&str>,
    ) -> Result<StringMap> {
        Ok(default_url_params(
            self.settings(),
            self.replication_key(),
            token,
        ))
    }

    /// Token for the page after `response`
    fn next_page_token(&self, response: &HttpResponse, body: &Value) -> Result<Option<PageToken>> {
        NextPageTokenPaginator::default().next_token(response, body)
    }

    /// Classify a response as usable, retriable or fatal
    fn validate_response(&self, response: &HttpResponse) -> Result<()> {
        validate_status(response)
    }

    /// Transform a record before it is emitted; `None` drops it
    fn post_process(&self, record: Value, _context: &Context) -> Option<Value> {
        Some(record)
    }

    /// Context handed to child streams for a record
    fn child_context(&self, _record: &Value) -> Option<Context> {
        None
    }

    /// State partitions for one parent context
    fn partitions(&self, parent: Option<&Context>) -> Vec<Context> {
        vec![parent.cloned().unwrap_or_default()]
    }

    /// Request contexts paginated within one partition
    fn request_contexts(&self, partition: &Context) -> Vec<Context> {
        vec![partition.clone()]
    }
}

/// `site_slug`, the page token, and ascending order on the replication key
pub fn default_url_params(
    settings: &StreamSettings,
    replication_key: Option<&str>,
    token: Option<&PageToken>,
) -> StringMap {
    let mut params = StringMap::new();
    params.insert("site_slug".to_string(), settings.site_slug.clone());
    if let Some(token) = token {
        params.insert("page".to_string(), token.to_string());
    }
    if let Some(key) = replication_key {
        params.insert("sort".to_string(), "asc".to_string());
        params.insert("order_by".to_string(), key.to_string());
    }
    params
}

/// All Talkable streams, parents before their children
pub fn all_streams(settings: &StreamSettings) -> Vec<Box<dyn StreamStrategy>> {
    vec![
        Box::new(CampaignsStream::new(settings.clone())),
        Box::new(CampaignMetricsStream::new(settings.clone())),
        Box::new(SegmentedCampaignMetricsStream::new(settings.clone())),
        Box::new(TrafficSourcesStream::new(settings.clone())),
    ]
}
