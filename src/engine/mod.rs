//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - runs streams against the API and emits Singer messages
//! - `MessageWriter` - where the messages go (stdout, or memory in tests)
//! - Message types for output (Schema, Record, State)
//!
//! Streams run one at a time. A parent stream consumes all pages of a
//! partition first, then runs its children once per child context.

mod types;
mod writer;

pub use types::{Message, SyncStats};
pub use writer::{CollectingWriter, JsonLinesWriter, MessageWriter};

use crate::catalog::Selection;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::{HttpClient, HttpResponse, RequestConfig};
use crate::pagination::PaginationState;
use crate::state::{ProgressMarker, StateManager};
use crate::streams::StreamStrategy;
use crate::types::Context;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

type SyncFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<W: MessageWriter> {
    /// HTTP client
    client: HttpClient,
    /// Streams in run order
    streams: Vec<Arc<dyn StreamStrategy>>,
    /// State manager
    state: StateManager,
    /// Streams whose records are emitted
    selection: Selection,
    /// Message destination
    writer: W,
    /// Statistics
    stats: SyncStats,
    schemas_sent: HashSet<&'static str>,
    /// Set while the most recent message is a STATE
    last_state: Option<Value>,
}

impl<W: MessageWriter> SyncEngine<W> {
    /// Create a new sync engine
    pub fn new(
        client: HttpClient,
        streams: Vec<Box<dyn StreamStrategy>>,
        state: StateManager,
        writer: W,
    ) -> Self {
        Self {
            client,
            streams: streams.into_iter().map(Arc::from).collect(),
            state,
            selection: Selection::All,
            writer,
            stats: SyncStats::default(),
            schemas_sent: HashSet::new(),
            last_state: None,
        }
    }

    /// Restrict emitted streams
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Get the writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the engine, returning its writer
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Run every top-level stream that is selected or has selected children
    pub async fn sync_all(&mut self) -> Result<SyncStats> {
        let start = Instant::now();

        let roots: Vec<usize> = (0..self.streams.len())
            .filter(|&i| self.streams[i].parent_stream().is_none())
            .collect();

        for index in roots {
            let name = self.streams[index].name();
            if self.needs_sync(name) {
                self.sync_stream(index, None).await?;
            } else {
                debug!("Skipping unselected stream {name}");
            }
        }

        self.writer.flush().await?;
        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Sync completed: {} records, {} pages in {}ms",
            self.stats.records_synced, self.stats.pages_fetched, self.stats.duration_ms
        );
        Ok(self.stats.clone())
    }

    /// Whether a stream or any of its descendants is selected
    fn needs_sync(&self, name: &str) -> bool {
        self.selection.is_selected(name)
            || self
                .streams
                .iter()
                .filter(|s| s.parent_stream() == Some(name))
                .any(|s| self.needs_sync(s.name()))
    }

    fn children_of(&self, name: &str) -> Vec<usize> {
        (0..self.streams.len())
            .filter(|&i| self.streams[i].parent_stream() == Some(name))
            .filter(|&i| self.needs_sync(self.streams[i].name()))
            .collect()
    }

    /// Sync one stream for one parent context, then its children
    fn sync_stream<'a>(&'a mut self, index: usize, parent: Option<&'a Context>) -> SyncFuture<'a> {
        Box::pin(async move {
            let stream = Arc::clone(&self.streams[index]);
            let name = stream.name();
            let emit = self.selection.is_selected(name);
            let children = self.children_of(name);

            match parent {
                Some(ctx) => debug!("Syncing {name} for {ctx}"),
                None => info!("Starting sync for stream: {name}"),
            }

            if emit {
                self.emit_schema(stream.as_ref()).await?;
            }

            for partition in stream.partitions(parent) {
                let child_contexts = self
                    .sync_partition(stream.as_ref(), &partition, emit, !children.is_empty())
                    .await?;

                for context in &child_contexts {
                    for &child in &children {
                        self.sync_stream(child, Some(context)).await?;
                    }
                }
            }

            if emit {
                self.emit_state().await?;
            }
            self.stats.add_stream();

            if parent.is_none() {
                info!("Completed sync for {name}");
            }
            Ok(())
        })
    }

    /// Page through every request context of a partition
    ///
    /// Returns the child contexts of the records seen.
    async fn sync_partition(
        &mut self,
        stream: &dyn StreamStrategy,
        partition: &Context,
        emit: bool,
        collect_children: bool,
    ) -> Result<Vec<Context>> {
        let name = stream.name();
        let replication_key = stream.replication_key();
        let decoder = JsonDecoder::with_path(stream.records_jsonpath());
        let validate = |response: &HttpResponse| stream.validate_response(response);

        // Bookmark as committed when the partition starts
        let starting_value = match replication_key {
            Some(_) => self.state.bookmark_value(name, partition).await,
            None => None,
        };
        let mut progress = ProgressMarker::new();
        let mut child_contexts = Vec::new();
        let mut records = 0usize;

        for request_context in stream.request_contexts(partition) {
            let path = stream.path(&request_context)?;
            let mut pagination = PaginationState::new();

            loop {
                let params = stream.url_params(
                    &request_context,
                    pagination.token(),
                    starting_value.as_deref(),
                )?;
                let response = self
                    .client
                    .get_validated(&path, RequestConfig::new().queries(params), &validate)
                    .await?;
                self.stats.add_page();

                let body = response.json()?;
                let page = decoder.decode_value(&body)?;
                debug!(
                    "{name} page {}: {} records from {}",
                    pagination.pages() + 1,
                    page.len(),
                    response.request_path()
                );

                for record in page {
                    let Some(mut record) = stream.post_process(record, &request_context) else {
                        continue;
                    };
                    inject_context(&mut record, &request_context);

                    if let Some(value) = replication_key.and_then(|key| record.get(key)) {
                        progress.observe(value);
                    }
                    if collect_children {
                        if let Some(context) = stream.child_context(&record) {
                            child_contexts.push(context);
                        }
                    }
                    if emit {
                        self.write(&Message::record(name, record)).await?;
                        records += 1;
                    }
                }

                let next = stream.next_page_token(&response, &body)?;
                pagination.advance(name, next)?;
                if pagination.is_done() {
                    break;
                }
            }
        }

        if let Some(key) = replication_key {
            let committed = self.state.bookmark(name, partition).await;
            if progress.is_ahead_of(committed.as_ref()) {
                if let Some(value) = progress.value() {
                    self.state
                        .set_bookmark(name, partition, key, value.clone())
                        .await;
                }
            }
        }

        self.stats.add_records(records);
        self.stats.add_partition();
        if emit && replication_key.is_some() {
            self.emit_state().await?;
        }
        Ok(child_contexts)
    }

    async fn emit_schema(&mut self, stream: &dyn StreamStrategy) -> Result<()> {
        if !self.schemas_sent.insert(stream.name()) {
            return Ok(());
        }
        let message = Message::schema(
            stream.name(),
            stream.schema().to_json(),
            stream.primary_keys().iter().map(ToString::to_string).collect(),
            stream.replication_key().map(ToString::to_string).into_iter().collect(),
        );
        self.write(&message).await
    }

    /// Emit STATE unless the previous message was the same STATE
    async fn emit_state(&mut self) -> Result<()> {
        let value = self.state.to_value().await;
        if self.last_state.as_ref() == Some(&value) {
            return Ok(());
        }
        self.write(&Message::state(value.clone())).await?;
        self.last_state = Some(value);
        Ok(())
    }

    async fn write(&mut self, message: &Message) -> Result<()> {
        self.last_state = None;
        self.writer.write(message).await
    }
}

/// Copy context keys the record does not carry
fn inject_context(record: &mut Value, context: &Context) {
    if let Some(obj) = record.as_object_mut() {
        for (key, value) in context.iter() {
            if !obj.contains_key(key) {
                obj.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests;
