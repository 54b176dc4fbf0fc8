//! State manager implementation
//!
//! Holds the bookmarks for a run. The initial state comes from the
//! `--state` file; progress is reported through STATE messages.

use super::types::{Bookmark, State};
use crate::error::{Error, Result};
use crate::types::Context;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared handle to the run's state
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an empty in-memory state manager
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Wrap an existing state
    pub fn from_state(state: State) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load state from a file; a missing file starts empty
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("State file {} not found, starting fresh", path.display());
            return Ok(Self::in_memory());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        if contents.trim().is_empty() {
            return Ok(Self::in_memory());
        }
        Self::from_json(&contents)
    }

    /// Create a state manager from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::from_state(state))
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Current state as a JSON value
    pub async fn to_value(&self) -> Value {
        self.state.read().await.to_value()
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Bookmark for a stream partition
    pub async fn bookmark(&self, stream: &str, context: &Context) -> Option<Bookmark> {
        self.state.read().await.bookmark(stream, context).cloned()
    }

    /// Bookmark value for a stream partition, as a string
    pub async fn bookmark_value(&self, stream: &str, context: &Context) -> Option<String> {
        self.bookmark(stream, context)
            .await
            .and_then(|b| b.value_str())
    }

    /// Commit a bookmark for a stream partition
    pub async fn set_bookmark(
        &self,
        stream: &str,
        context: &Context,
        replication_key: &str,
        value: Value,
    ) {
        let mut state = self.state.write().await;
        state.set_bookmark(stream, context, Bookmark::new(replication_key, value));
    }
}
