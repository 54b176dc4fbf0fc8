//! Campaigns stream

use super::{StreamSettings, StreamStrategy};
use crate::error::Result;
use crate::schema::{JsonSchema, Property};
use crate::types::Context;
use serde_json::Value;
use tracing::warn;

/// `GET /campaigns`, parent of the metric streams
#[derive(Debug, Clone)]
pub struct CampaignsStream {
    settings: StreamSettings,
}

impl CampaignsStream {
    /// Create the stream
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }
}

impl StreamStrategy for CampaignsStream {
    fn name(&self) -> &'static str {
        "campaigns"
    }

    fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn path(&self, _context: &Context) -> Result<String> {
        Ok("/campaigns".to_string())
    }

    fn schema(&self) -> JsonSchema {
        JsonSchema::new()
            .property("id", Property::number())
            .property("slug", Property::number())
            .property("is_active", Property::boolean())
            .property("appearance", Property::string())
            .property(
                "joinable_category_names",
                Property::array(Property::string()),
            )
            .property("name", Property::string())
            .property("status", Property::string())
            .property("tag_names", Property::array(Property::string()))
            .property("new_customer", Property::string())
            .property("origin_min_age", Property::number())
            .property("origin_max_age", Property::number())
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn records_jsonpath(&self) -> &'static str {
        "$.result.campaigns[*]"
    }

    fn child_context(&self, record: &Value) -> Option<Context> {
        match record.get("id") {
            Some(id) if !id.is_null() => Some(Context::new().with("campaign_id", id.clone())),
            _ => {
                warn!("Campaign record without id, skipping its metrics");
                None
            }
        }
    }
}
