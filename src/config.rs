//! Tap configuration
//!
//! Settings are read from one or more JSON files and merged left to right,
//! then validated into a [`TapConfig`].

use crate::error::{Error, Result};
use crate::schema::{JsonSchema, Property};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Default value for `start_date`
pub const DEFAULT_START_DATE: &str = "2019-01-01T00:00:00Z";

/// Validated tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// The token to authenticate against the API service
    pub api_key: String,

    /// The slug name for your site
    pub site_slug: String,

    /// Date to start collecting metrics from
    #[serde(default = "default_start_date")]
    pub start_date: DateTime<Utc>,

    /// Optional User-Agent header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_start_date() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(DEFAULT_START_DATE)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

impl TapConfig {
    /// Create a config with the default start date
    pub fn new(api_key: impl Into<String>, site_slug: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            site_slug: site_slug.into(),
            start_date: default_start_date(),
            user_agent: None,
        }
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = start_date;
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Start date as a calendar day
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    /// Build a config from a raw JSON object, checking required fields
    ///
    /// `start_date` may be RFC 3339 or a plain `YYYY-MM-DD`; null or absent
    /// means the default.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(Error::config("Config must be a JSON object"));
        };

        for field in ["api_key", "site_slug"] {
            match obj.get(field) {
                None | Some(Value::Null) => return Err(Error::missing_field(field)),
                Some(Value::String(s)) if s.is_empty() => {
                    return Err(Error::invalid_value(field, "must not be empty"))
                }
                Some(Value::String(_)) => {}
                Some(_) => return Err(Error::invalid_value(field, "must be a string")),
            }
        }

        let start_date = match obj.remove("start_date") {
            None | Some(Value::Null) => default_start_date(),
            Some(Value::String(raw)) => parse_start_date(&raw)?,
            Some(_) => return Err(Error::invalid_value("start_date", "must be a string")),
        };

        let config: Self = serde_json::from_value(Value::Object(obj))
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        Ok(config.with_start_date(start_date))
    }

    /// Load and merge config files, later files overriding earlier ones
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::config("No config file given (use --config)"));
        }

        let mut merged = serde_json::Map::new();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("Failed to read config file {}: {e}", path.display()))
            })?;
            let value: Value = serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
            match value {
                Value::Object(map) => merged.extend(map),
                _ => return Err(Error::config("Config must be a JSON object")),
            }
        }

        Self::from_value(Value::Object(merged))
    }

    /// JSON schema describing the accepted settings
    pub fn json_schema() -> Value {
        JsonSchema::new()
            .property(
                "api_key",
                Property::string()
                    .required()
                    .secret()
                    .with_description("The token to authenticate against the API service"),
            )
            .property(
                "site_slug",
                Property::string()
                    .required()
                    .with_description("The slug name for your site"),
            )
            .property(
                "start_date",
                Property::date_time()
                    .with_default(Value::String(DEFAULT_START_DATE.to_string()))
                    .with_description("Date to start collecting metrics from"),
            )
            .property(
                "user_agent",
                Property::string().with_description("User-Agent header sent with every request"),
            )
            .to_json()
    }
}

/// Parse a start date given either as RFC 3339 or as a plain `YYYY-MM-DD`
pub fn parse_start_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::invalid_value("start_date", format!("not a date-time: {raw}")))
}
