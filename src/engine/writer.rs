//! Message writers

use super::types::Message;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};

/// Destination for Singer messages
#[async_trait]
pub trait MessageWriter: Send {
    /// Write one message
    async fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON message per line to any async sink
pub struct JsonLinesWriter<W> {
    out: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesWriter<W> {
    /// Wrap a sink
    pub fn new(sink: W) -> Self {
        Self {
            out: BufWriter::new(sink),
        }
    }

    /// Unwrap the sink, discarding unflushed output
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl JsonLinesWriter<Stdout> {
    /// Writer for the process standard output
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageWriter for JsonLinesWriter<W> {
    async fn write(&mut self, message: &Message) -> Result<()> {
        let mut line = serde_json::to_vec(message)
            .map_err(|e| Error::Other(format!("Failed to serialize message: {e}")))?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        // STATE lines must reach the target before anything that follows them
        if message.is_state() {
            self.out.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.out.flush().await?;
        Ok(())
    }
}

/// Keeps messages in memory
#[derive(Debug, Default)]
pub struct CollectingWriter {
    messages: Vec<Message>,
}

impl CollectingWriter {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages written so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Take the collected messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[async_trait]
impl MessageWriter for CollectingWriter {
    async fn write(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
