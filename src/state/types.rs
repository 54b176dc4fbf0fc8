//! Singer state types
//!
//! ```json
//! {"bookmarks": {"campaign_metrics": {"partitions": [
//!     {"context": {"campaign_id": 42},
//!      "replication_key": "start_date",
//!      "replication_key_value": "2024-04-10T00:00:00Z"}
//! ]}}}
//! ```

use crate::config::parse_start_date;
use crate::types::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Bookmark for a stream partition; an empty context means the stream itself
    pub fn bookmark(&self, stream: &str, context: &Context) -> Option<&Bookmark> {
        self.get_stream(stream)?.bookmark_for(context)
    }

    /// Replace the bookmark for a stream partition
    pub fn set_bookmark(&mut self, stream: &str, context: &Context, bookmark: Bookmark) {
        *self.get_stream_mut(stream).bookmark_for_mut(context) = bookmark;
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Stored replication position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Field the value was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Highest replication value committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<Value>,
}

impl Bookmark {
    /// Create a bookmark
    pub fn new(replication_key: impl Into<String>, value: Value) -> Self {
        Self {
            replication_key: Some(replication_key.into()),
            replication_key_value: Some(value),
        }
    }

    /// Value rendered as a string, for building requests
    pub fn value_str(&self) -> Option<String> {
        match self.replication_key_value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Bookmarks of one stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Stream-level bookmark, used when the stream is not partitioned
    #[serde(flatten)]
    pub bookmark: Bookmark,

    /// Per-partition bookmarks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionState>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get partition state
    pub fn get_partition(&self, context: &Context) -> Option<&PartitionState> {
        self.partitions.iter().find(|p| &p.context == context)
    }

    /// Get mutable partition state, creating if needed
    pub fn get_partition_mut(&mut self, context: &Context) -> &mut PartitionState {
        let index = match self.partitions.iter().position(|p| &p.context == context) {
            Some(index) => index,
            None => {
                self.partitions.push(PartitionState::new(context.clone()));
                self.partitions.len() - 1
            }
        };
        &mut self.partitions[index]
    }

    fn bookmark_for(&self, context: &Context) -> Option<&Bookmark> {
        if context.is_empty() {
            return Some(&self.bookmark);
        }
        self.get_partition(context).map(|p| &p.bookmark)
    }

    fn bookmark_for_mut(&mut self, context: &Context) -> &mut Bookmark {
        if context.is_empty() {
            return &mut self.bookmark;
        }
        &mut self.get_partition_mut(context).bookmark
    }
}

/// Bookmark of one partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Context identifying the partition
    pub context: Context,

    /// Partition bookmark
    #[serde(flatten)]
    pub bookmark: Bookmark,
}

impl PartitionState {
    /// Create an empty partition state
    pub fn new(context: Context) -> Self {
        Self {
            context,
            bookmark: Bookmark::default(),
        }
    }
}

/// Running maximum of the replication values seen in a partition
#[derive(Debug, Clone, Default)]
pub struct ProgressMarker {
    max: Option<Value>,
}

impl ProgressMarker {
    /// Create an empty marker
    pub fn new() -> Self {
        Self::default()
    }

    /// Take `value` into account
    pub fn observe(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        let newer = match &self.max {
            Some(current) => compare_replication_values(value, current) == Ordering::Greater,
            None => true,
        };
        if newer {
            self.max = Some(value.clone());
        }
    }

    /// Highest value seen
    pub fn value(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    /// Whether the marker is ahead of a committed bookmark
    pub fn is_ahead_of(&self, bookmark: Option<&Bookmark>) -> bool {
        match (
            &self.max,
            bookmark.and_then(|b| b.replication_key_value.as_ref()),
        ) {
            (Some(max), Some(committed)) => {
                compare_replication_values(max, committed) == Ordering::Greater
            }
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Order replication values: dates chronologically, numbers numerically,
/// anything else by text
pub fn compare_replication_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => match (parse_start_date(x), parse_start_date(y)) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}
