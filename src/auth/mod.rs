//! Authentication module
//!
//! The Talkable API authenticates with a bearer token derived from the
//! configured `api_key`. The `Authenticator` applies it to every request.

mod authenticator;

pub use authenticator::{AuthConfig, Authenticator};

#[cfg(test)]
mod tests;
