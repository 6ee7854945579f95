//! Chat transport interface and streaming chunk plumbing

use crate::types::Message;
use crate::{AmicusError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A citation offered by the transport alongside a text fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationCandidate {
    /// Candidate URL; an empty URL is discarded downstream
    pub url: String,
    /// Optional display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One incremental unit of a streamed response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Text fragment, possibly empty
    pub text: String,
    /// Citation candidates attached to this chunk
    pub citations: Vec<CitationCandidate>,
}

impl StreamChunk {
    /// Create a text-only chunk
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }
}

/// Stream of chunks from a transport; finite and non-restartable
pub type ChunkStream = mpsc::Receiver<Result<StreamChunk>>;

/// Sending half of a chunk stream
pub type ChunkSender = mpsc::Sender<Result<StreamChunk>>;

/// Create a new chunk stream
pub fn create_chunk_stream(buffer_size: usize) -> (ChunkSender, ChunkStream) {
    mpsc::channel(buffer_size)
}

/// Convenience wrapper a transport uses to feed a chunk stream
pub struct ChunkHandler {
    sender: ChunkSender,
}

impl ChunkHandler {
    /// Create a new chunk handler
    pub fn new(sender: ChunkSender) -> Self {
        Self { sender }
    }

    /// Send a chunk
    pub async fn send_chunk(&self, chunk: StreamChunk) -> Result<()> {
        self.sender
            .send(Ok(chunk))
            .await
            .map_err(|e| AmicusError::other(format!("Failed to send chunk: {}", e)))
    }

    /// Send a text-only chunk
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_chunk(StreamChunk::text(text)).await
    }

    /// Send an error, terminating the stream from the consumer's view
    pub async fn send_error(&self, error: AmicusError) -> Result<()> {
        self.sender
            .send(Err(error))
            .await
            .map_err(|e| AmicusError::other(format!("Failed to send error: {}", e)))
    }
}

/// A hosted conversational AI endpoint
///
/// Implementations accept the full prior conversation plus the new user text
/// and return a finite stream of chunks. The stream may terminate with an
/// error carrying a human-readable description.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport name, for logging and diagnostics
    fn name(&self) -> &str;

    /// Start one streamed exchange
    async fn start_stream(
        &self,
        system_instruction: &str,
        prior_messages: &[Message],
        new_user_text: &str,
    ) -> Result<ChunkStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunk_stream_delivery() {
        let (sender, mut receiver) = create_chunk_stream(10);
        let handler = ChunkHandler::new(sender);

        handler.send_text("Hello").await.unwrap();
        handler
            .send_chunk(StreamChunk {
                text: " world".to_string(),
                citations: vec![CitationCandidate {
                    url: "http://a".to_string(),
                    title: Some("A".to_string()),
                }],
            })
            .await
            .unwrap();
        drop(handler);

        let first = receiver.recv().await.unwrap().unwrap();
        assert_eq!(first.text, "Hello");
        assert!(first.citations.is_empty());

        let second = receiver.recv().await.unwrap().unwrap();
        assert_eq!(second.text, " world");
        assert_eq!(second.citations[0].url, "http://a");

        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_chunk_stream_error() {
        let (sender, mut receiver) = create_chunk_stream(10);
        let handler = ChunkHandler::new(sender);

        handler
            .send_error(AmicusError::transport("connection reset"))
            .await
            .unwrap();

        let item = receiver.recv().await.unwrap();
        assert!(item.is_err());
    }
}
