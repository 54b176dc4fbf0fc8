//! Record schema module
//!
//! Builders for the JSON schemas attached to Singer SCHEMA messages and to
//! the tap's settings description.
//!
//! Properties are nullable unless marked required, matching what Singer
//! targets expect from tap-declared schemas.

mod types;

pub use types::{JsonSchema, JsonType, JsonTypeOrArray, Property};
