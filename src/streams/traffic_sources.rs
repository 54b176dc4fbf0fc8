//! Traffic sources stream

use super::{StreamSettings, StreamStrategy};
use crate::error::Result;
use crate::schema::{JsonSchema, Property};
use crate::types::Context;

/// `GET /traffic_sources`, full refresh
#[derive(Debug, Clone)]
pub struct TrafficSourcesStream {
    settings: StreamSettings,
}

impl TrafficSourcesStream {
    /// Create the stream
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }
}

impl StreamStrategy for TrafficSourcesStream {
    fn name(&self) -> &'static str {
        "traffic_sources"
    }

    fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn path(&self, _context: &Context) -> Result<String> {
        Ok("/traffic_sources".to_string())
    }

    fn schema(&self) -> JsonSchema {
        JsonSchema::new().property("identifier", Property::string())
    }

    fn primary_keys(&self) -> &'static [&'static str] {
        &["identifier"]
    }

    fn records_jsonpath(&self) -> &'static str {
        "$.result[*]"
    }
}
