//! JSON record extraction

use crate::error::{Error, Result};
use serde_json::Value;

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the response body into a list of records
    fn decode(&self, body: &str) -> Result<Vec<Value>>;

    /// Extract records from an already parsed body
    fn decode_value(&self, value: &Value) -> Result<Vec<Value>>;
}

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// The configured record path
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;
        self.decode_value(&value)
    }

    fn decode_value(&self, value: &Value) -> Result<Vec<Value>> {
        match &self.record_path {
            // Wildcards go through jsonpath-rust, plain paths are walked directly
            Some(path) if path.contains('*') => extract_with_jsonpath(value, path),
            Some(path) => match extract_simple_path(value, path) {
                Some(Value::Array(arr)) => Ok(arr),
                Some(Value::Null) | None => Ok(vec![]),
                Some(v) => Ok(vec![v]),
            },
            None => match value {
                Value::Array(arr) => Ok(arr.clone()),
                _ => Ok(vec![value.clone()]),
            },
        }
    }
}

/// First value matched by `path`, if any
///
/// A match that is JSON `null` counts as no match.
pub fn first_match(value: &Value, path: &str) -> Result<Option<Value>> {
    let found = if path.contains('*') {
        extract_with_jsonpath(value, path)?.into_iter().next()
    } else {
        extract_simple_path(value, path)
    };
    Ok(found.filter(|v| !v.is_null()))
}

/// Walk a dot-notation path such as `$.result.campaigns` or `items[0]`
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path == "$" || path.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index = index_str.parse::<i64>().ok()?;
            let arr = current.as_array()?;
            let idx = if index < 0 {
                arr.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                usize::try_from(index).ok()?
            };
            current = arr.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
