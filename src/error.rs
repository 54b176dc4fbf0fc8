//! Error types for tap-talkable
//!
//! This module defines the error hierarchy for the whole tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for tap-talkable
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} Client Error: {reason} for path: {url}")]
    FatalApi {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("{status} Server Error: {reason} for path: {url}")]
    RetriableApi {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error(
        "Loop detected in pagination for stream '{stream}'. \
         Pagination token {token} is identical to prior token."
    )]
    PaginationLoop { stream: String, token: String },

    #[error("Stream '{stream}' needs '{key}' in its request context")]
    MissingContext { stream: String, key: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a fatal API error
    pub fn fatal_api(status: u16, reason: impl Into<String>, url: impl Into<String>) -> Self {
        Self::FatalApi {
            status,
            reason: reason.into(),
            url: url.into(),
        }
    }

    /// Create a retriable API error
    pub fn retriable_api(status: u16, reason: impl Into<String>, url: impl Into<String>) -> Self {
        Self::RetriableApi {
            status,
            reason: reason.into(),
            url: url.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a pagination loop error
    pub fn pagination_loop(stream: impl Into<String>, token: impl std::fmt::Display) -> Self {
        Self::PaginationLoop {
            stream: stream.into(),
            token: token.to_string(),
        }
    }

    /// Create a missing context key error
    pub fn missing_context(stream: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingContext {
            stream: stream.into(),
            key: key.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::RetriableApi { .. } | Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::FatalApi { status, .. } | Error::RetriableApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for tap-talkable
pub type Result<T> = std::result::Result<T, Error>;
