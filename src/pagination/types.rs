//! Pagination types
//!
//! Page tokens and the loop guard shared by every stream.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde_json::Value;

/// Token identifying the next page to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Opaque page value from the API (`next_page` or `X-Next-Page`)
    Page(String),
    /// Start day of the next dated window
    Date(NaiveDate),
}

impl PageToken {
    /// Build a page token from a JSON scalar
    ///
    /// Returns `None` for null, empty strings and non-scalar values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Page(s.clone())),
            Value::Number(n) => Some(Self::Page(n.to_string())),
            _ => None,
        }
    }

    /// Day carried by a date token
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Page(_) => None,
        }
    }

    /// Raw page value of a page token
    pub fn as_page(&self) -> Option<&str> {
        match self {
            Self::Page(p) => Some(p),
            Self::Date(_) => None,
        }
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page(p) => write!(f, "{p}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Fail when a freshly computed token repeats the previous one
pub fn check_for_loop(
    stream: &str,
    previous: Option<&PageToken>,
    next: Option<&PageToken>,
) -> Result<()> {
    match (previous, next) {
        (Some(prev), Some(next)) if prev == next => Err(Error::pagination_loop(stream, next)),
        _ => Ok(()),
    }
}

/// Tracks pagination progress for one request context
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    token: Option<PageToken>,
    pages: u32,
    done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for the next request, `None` before the first page
    pub fn token(&self) -> Option<&PageToken> {
        self.token.as_ref()
    }

    /// Number of pages consumed so far
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Is pagination complete?
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Record a consumed page and the token computed from it
    pub fn advance(&mut self, stream: &str, next: Option<PageToken>) -> Result<()> {
        self.pages += 1;
        check_for_loop(stream, self.token.as_ref(), next.as_ref())?;
        self.done = next.is_none();
        self.token = next;
        Ok(())
    }
}
