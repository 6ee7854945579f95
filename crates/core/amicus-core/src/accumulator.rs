//! Streamed-response accumulation and citation deduplication
//!
//! Turns the transport's chunk sequence into a monotonically growing message
//! text and an ordered, URL-deduplicated citation list, surfacing the updated
//! text to the caller after every chunk.

use crate::transport::{ChunkStream, StreamChunk};
use crate::types::{Source, TurnStatus};
use std::collections::HashSet;

/// Accumulates one streamed assistant turn
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    sources: Vec<Source>,
    seen_uris: HashSet<String>,
}

impl StreamAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Citations accumulated so far, in first-seen order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Fold one chunk into the running state
    ///
    /// The text fragment is appended even when empty. A citation candidate is
    /// kept only when its URL is non-empty and not seen before in this turn;
    /// a missing or empty title falls back to the URL itself.
    pub fn push_chunk(&mut self, chunk: &StreamChunk) {
        self.text.push_str(&chunk.text);

        for candidate in &chunk.citations {
            if candidate.url.is_empty() {
                continue;
            }
            if !self.seen_uris.insert(candidate.url.clone()) {
                continue;
            }
            let title = candidate
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| candidate.url.clone());
            self.sources.push(Source {
                uri: candidate.url.clone(),
                title,
            });
        }
    }

    /// Append the user-visible notice for a mid-stream failure
    ///
    /// Everything accumulated so far is kept.
    pub fn fail(&mut self, description: &str) {
        self.text
            .push_str(&format!("\n\nSorry, something went wrong: {}", description));
    }

    /// Finish the turn, consuming the accumulator
    pub fn into_outcome(self, error: Option<String>) -> TurnOutcome {
        let status = if error.is_some() {
            TurnStatus::Error
        } else {
            TurnStatus::Complete
        };
        TurnOutcome {
            text: self.text,
            sources: self.sources,
            status,
            error,
        }
    }
}

/// Final result of one streamed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final message text, including the error notice on failure
    pub text: String,
    /// Final ordered citation list, possibly empty
    pub sources: Vec<Source>,
    /// `Complete` or `Error`
    pub status: TurnStatus,
    /// Description of the transport failure, if any
    pub error: Option<String>,
}

/// Drive a chunk stream to completion
///
/// `on_update` receives the full accumulated text after every chunk, and once
/// more with the appended notice when the stream fails. A failure terminates
/// consumption; nothing accumulated before it is discarded.
pub async fn drive<F>(mut stream: ChunkStream, mut on_update: F) -> TurnOutcome
where
    F: FnMut(&str),
{
    let mut accumulator = StreamAccumulator::new();

    while let Some(item) = stream.recv().await {
        match item {
            Ok(chunk) => {
                accumulator.push_chunk(&chunk);
                on_update(accumulator.text());
            }
            Err(e) => {
                let description = e.to_string();
                accumulator.fail(&description);
                on_update(accumulator.text());
                return accumulator.into_outcome(Some(description));
            }
        }
    }

    accumulator.into_outcome(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{create_chunk_stream, ChunkHandler, CitationCandidate};
    use crate::AmicusError;

    fn candidate(url: &str, title: Option<&str>) -> CitationCandidate {
        CitationCandidate {
            url: url.to_string(),
            title: title.map(|t| t.to_string()),
        }
    }

    #[tokio::test]
    async fn test_text_is_concatenation_of_fragments() {
        let (sender, receiver) = create_chunk_stream(10);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            for fragment in ["In ", "", "the case of ", "*Onyango v. Matatu Express*"] {
                handler.send_text(fragment).await.unwrap();
            }
        });

        let mut updates = Vec::new();
        let outcome = drive(receiver, |text| updates.push(text.to_string())).await;

        assert_eq!(outcome.text, "In the case of *Onyango v. Matatu Express*");
        assert_eq!(outcome.status, TurnStatus::Complete);
        assert!(outcome.error.is_none());
        // One update per chunk, empty fragments included.
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0], "In ");
        assert_eq!(updates[1], "In ");
    }

    #[tokio::test]
    async fn test_citation_dedup_and_title_fallback() {
        let (sender, receiver) = create_chunk_stream(10);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            handler
                .send_chunk(StreamChunk {
                    text: "Hello".to_string(),
                    citations: vec![candidate("http://a", Some("A"))],
                })
                .await
                .unwrap();
            handler
                .send_chunk(StreamChunk {
                    text: " world".to_string(),
                    citations: vec![candidate("http://a", None), candidate("http://b", None)],
                })
                .await
                .unwrap();
        });

        let outcome = drive(receiver, |_| {}).await;

        assert_eq!(outcome.text, "Hello world");
        assert_eq!(
            outcome.sources,
            vec![
                Source {
                    uri: "http://a".to_string(),
                    title: "A".to_string()
                },
                Source {
                    uri: "http://b".to_string(),
                    title: "http://b".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_recurring_urls_kept_once_in_first_seen_order() {
        let (sender, receiver) = create_chunk_stream(10);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            for urls in [
                vec!["http://c", "http://a"],
                vec!["http://a", "http://b", "http://c"],
                vec!["http://b"],
            ] {
                handler
                    .send_chunk(StreamChunk {
                        text: String::new(),
                        citations: urls.into_iter().map(|u| candidate(u, None)).collect(),
                    })
                    .await
                    .unwrap();
            }
        });

        let outcome = drive(receiver, |_| {}).await;
        let uris: Vec<&str> = outcome.sources.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["http://c", "http://a", "http://b"]);
    }

    #[tokio::test]
    async fn test_empty_url_and_empty_title() {
        let (sender, receiver) = create_chunk_stream(10);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            handler
                .send_chunk(StreamChunk {
                    text: "x".to_string(),
                    citations: vec![candidate("", Some("No url")), candidate("http://a", Some(""))],
                })
                .await
                .unwrap();
        });

        let outcome = drive(receiver, |_| {}).await;
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].uri, "http://a");
        // An empty title falls back to the URL, same as a missing one.
        assert_eq!(outcome.sources[0].title, "http://a");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_state() {
        let (sender, receiver) = create_chunk_stream(10);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            handler
                .send_chunk(StreamChunk {
                    text: "Partial ".to_string(),
                    citations: vec![candidate("http://a", Some("A"))],
                })
                .await
                .unwrap();
            handler.send_text("answer").await.unwrap();
            handler
                .send_error(AmicusError::transport("connection reset"))
                .await
                .unwrap();
            // Anything after the error must never be observed.
            let _ = handler.send_text("ignored").await;
        });

        let outcome = drive(receiver, |_| {}).await;

        assert!(outcome.text.starts_with("Partial answer"));
        assert!(outcome.text.len() > "Partial answer".len());
        assert!(outcome.text.contains("Transport error: connection reset"));
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.status, TurnStatus::Error);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Transport error: connection reset")
        );
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_outcome() {
        let (sender, receiver) = create_chunk_stream(1);
        drop(sender);

        let outcome = drive(receiver, |_| {}).await;
        assert!(outcome.text.is_empty());
        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.status, TurnStatus::Complete);
    }
}
