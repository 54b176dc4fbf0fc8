//! Pagination strategy implementations

use super::types::PageToken;
use crate::decode::first_match;
use crate::error::{Error, Result};
use crate::http::HttpResponse;
use chrono::{Days, NaiveDate};
use serde_json::Value;

/// Longest span a single metrics request may cover
pub const WINDOW_DAYS: u64 = 100;

/// The day before `today`
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

// ============================================================================
// Next-page token
// ============================================================================

/// Reads the next page from the response body, falling back to a header
#[derive(Debug, Clone)]
pub struct NextPageTokenPaginator {
    /// JSONPath to the next page value in the body
    pub jsonpath: String,
    /// Header consulted when the body has no value
    pub header: String,
}

impl Default for NextPageTokenPaginator {
    fn default() -> Self {
        Self::new("$.next_page", "X-Next-Page")
    }
}

impl NextPageTokenPaginator {
    /// Create a paginator reading `jsonpath` then `header`
    pub fn new(jsonpath: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            jsonpath: jsonpath.into(),
            header: header.into(),
        }
    }

    /// Token for the page after `response`, if any
    pub fn next_token(&self, response: &HttpResponse, body: &Value) -> Result<Option<PageToken>> {
        if let Some(token) = first_match(body, &self.jsonpath)?
            .as_ref()
            .and_then(PageToken::from_json)
        {
            return Ok(Some(token));
        }

        Ok(response
            .header(&self.header)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| PageToken::Page(v.to_string())))
    }
}

// ============================================================================
// Dated windows
// ============================================================================

/// Inclusive request range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day requested
    pub start: NaiveDate,
    /// Last day requested
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window beginning at `start`, capped at [`WINDOW_DAYS`] and at yesterday
    pub fn starting_at(start: NaiveDate, today: NaiveDate) -> Self {
        let capped = start
            .checked_add_days(Days::new(WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start,
            end: capped.min(yesterday(today)),
        }
    }

    /// True when another window follows this one
    pub fn has_next(&self) -> bool {
        self.start < self.end
    }

    /// `start_date` query value
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `end_date` query value
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Walks consecutive date windows up to yesterday
///
/// Each window starts at the end day of the request that was just sent,
/// read back from the request URL.
#[derive(Debug, Clone, Copy)]
pub struct DateWindowPaginator {
    today: NaiveDate,
}

impl DateWindowPaginator {
    /// Create a paginator anchored at `today` (UTC)
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Window for a request starting at `start`
    pub fn window(&self, start: NaiveDate) -> DateWindow {
        DateWindow::starting_at(start, self.today)
    }

    /// Token for the window after the one `response` answered
    pub fn next_token(&self, response: &HttpResponse) -> Result<Option<PageToken>> {
        let window = DateWindow {
            start: query_date(response, "start_date")?,
            end: query_date(response, "end_date")?,
        };
        Ok(window.has_next().then_some(PageToken::Date(window.end)))
    }
}

fn query_date(response: &HttpResponse, key: &str) -> Result<NaiveDate> {
    let raw = response.query_param(key).ok_or_else(|| {
        Error::decode(format!(
            "Request {} has no {key} parameter",
            response.request_path()
        ))
    })?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| Error::decode(format!("Invalid {key} '{raw}': {e}")))
}
