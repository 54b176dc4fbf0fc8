//! Pagination module
//!
//! Supports: next-page token (body path or header), dated windows
//!
//! # Overview
//!
//! Streams compute a [`PageToken`] from each response. The engine feeds the
//! token back into the next request and stops when none is returned.
//! [`PaginationState`] guards against a token that never advances.

mod strategies;
mod types;

pub use strategies::{yesterday, DateWindow, DateWindowPaginator, NextPageTokenPaginator, WINDOW_DAYS};
pub use types::{check_for_loop, PageToken, PaginationState};
