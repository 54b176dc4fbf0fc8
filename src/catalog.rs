//! Singer catalog
//!
//! `--discover` prints a catalog built from the stream definitions. A
//! catalog given with `--catalog` selects which streams run.

use crate::error::{Error, Result};
use crate::streams::StreamStrategy;
use crate::types::{JsonObject, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// A Singer catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries, one per stream
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

/// One stream in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    #[serde(default)]
    pub stream: String,
    /// Record schema
    #[serde(default)]
    pub schema: Value,
    /// Primary key properties
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Incremental replication key
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,
    /// Metadata entries addressed by breadcrumb
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Metadata for one breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path to the node: `[]` for the stream, `["properties", name]` for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    /// Metadata values
    #[serde(default)]
    pub metadata: JsonObject,
}

impl CatalogEntry {
    /// Entry describing a stream, selected by default
    pub fn from_stream(stream: &dyn StreamStrategy) -> Self {
        let schema = stream.schema();
        let key_properties: Vec<String> =
            stream.primary_keys().iter().map(ToString::to_string).collect();
        let replication_key = stream.replication_key().map(ToString::to_string);
        let replication_method = stream.replication_method();

        let mut stream_metadata = JsonObject::new();
        stream_metadata.insert("inclusion".into(), json!("available"));
        stream_metadata.insert("selected".into(), json!(true));
        stream_metadata.insert("selected-by-default".into(), json!(true));
        stream_metadata.insert("table-key-properties".into(), json!(key_properties));
        stream_metadata.insert(
            "forced-replication-method".into(),
            json!(replication_method),
        );
        if let Some(key) = &replication_key {
            stream_metadata.insert("valid-replication-keys".into(), json!([key]));
        }
        if let Some(parent) = stream.parent_stream() {
            stream_metadata.insert("parent-tap-stream-id".into(), json!(parent));
        }

        let mut metadata = vec![MetadataEntry {
            breadcrumb: Vec::new(),
            metadata: stream_metadata,
        }];
        for name in schema.property_names() {
            let automatic = key_properties.iter().any(|k| k == name)
                || replication_key.as_deref() == Some(name);
            let mut field = JsonObject::new();
            field.insert(
                "inclusion".into(),
                json!(if automatic { "automatic" } else { "available" }),
            );
            metadata.push(MetadataEntry {
                breadcrumb: vec!["properties".to_string(), name.to_string()],
                metadata: field,
            });
        }

        Self {
            tap_stream_id: stream.name().to_string(),
            stream: stream.name().to_string(),
            schema: schema.to_json(),
            key_properties,
            replication_key,
            replication_method,
            metadata,
        }
    }

    /// Stream-level metadata (breadcrumb `[]`)
    pub fn stream_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Whether the stream-level metadata selects this stream
    ///
    /// An explicit `selected` wins; otherwise `selected-by-default`.
    pub fn is_selected(&self) -> bool {
        let Some(meta) = self.stream_metadata() else {
            return false;
        };
        meta.get("selected")
            .or_else(|| meta.get("selected-by-default"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl Catalog {
    /// Catalog for a set of streams
    pub fn discover(streams: &[Box<dyn StreamStrategy>]) -> Self {
        Self {
            streams: streams
                .iter()
                .map(|s| CatalogEntry::from_stream(s.as_ref()))
                .collect(),
        }
    }

    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog(format!("Invalid catalog: {e}")))
    }

    /// Read a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Entry for a stream
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.tap_stream_id == stream)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Which streams a run emits
#[derive(Debug, Clone, Default)]
pub enum Selection {
    /// No catalog given: every stream
    #[default]
    All,
    /// Streams selected in an input catalog
    Catalog(Catalog),
}

impl Selection {
    /// Whether records of `stream` are emitted
    pub fn is_selected(&self, stream: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Catalog(catalog) => catalog.get(stream).is_some_and(CatalogEntry::is_selected),
        }
    }
}
