// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-talkable
//!
//! A Singer tap that extracts campaigns, campaign metrics and traffic
//! sources from the Talkable referral marketing API.
//!
//! ## Features
//!
//! - **Bearer Auth**: `api_key` sent on every request
//! - **Dated Windows**: metric history fetched in 100-day windows up to yesterday
//! - **Incremental Sync**: per-partition bookmarks in Singer state
//! - **Catalog**: `--discover` output and catalog-driven stream selection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_talkable::{JsonLinesWriter, Selection, StateManager, TapConfig, TapTalkable};
//!
//! #[tokio::main]
//! async fn main() -> tap_talkable::Result<()> {
//!     let tap = TapTalkable::new(TapConfig::new("api-key", "my-site"));
//!     let client = tap.http_client()?;
//!     let mut engine = tap.engine(
//!         client,
//!         StateManager::in_memory(),
//!         Selection::All,
//!         JsonLinesWriter::stdout(),
//!     );
//!     engine.sync_all().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TapTalkable                             │
//! │  about() → settings    discover() → Catalog    engine() → sync  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Streams  │   HTTP    │   Paginate    │   State   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Campaign │ Retry     │ next_page     │ Bookmarks │ SCHEMA      │
//! │ Metrics  │ Rate Limit│ Date windows  │ Partitions│ RECORD      │
//! │ Traffic  │ Backoff   │ Loop check    │           │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoders
pub mod decode;

/// State management and checkpointing
pub mod state;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Singer catalog and stream selection
pub mod catalog;

/// Endpoint streams
pub mod streams;

/// Connector entry point
pub mod tap;

/// Command-line interface
pub mod cli;

/// JSON schema builder
pub mod schema;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{Catalog, Selection};
pub use config::TapConfig;
pub use engine::{JsonLinesWriter, Message, SyncEngine};
pub use state::StateManager;
pub use tap::TapTalkable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
