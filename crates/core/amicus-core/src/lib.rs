//! Amicus core
//!
//! This crate provides the core types and logic for the Amicus legal-assistant
//! chat service:
//!
//! - Conversation data model (messages, roles, citation sources)
//! - Stream accumulator that turns incremental model chunks into a growing
//!   message text and a deduplicated citation list
//! - Turn orchestrator driving one user-to-assistant exchange end to end
//! - Chat transport and history store interfaces implemented by the
//!   provider and storage crates
//!
//! # Example: accumulating a streamed turn
//!
//! ```no_run
//! use amicus_core::{create_chunk_stream, drive};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sender, receiver) = create_chunk_stream(16);
//!     drop(sender);
//!     let outcome = drive(receiver, |_text| {}).await;
//!     assert!(outcome.error.is_none());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export commonly used types
pub use uuid::Uuid;

// Core modules
pub mod accumulator;
pub mod config;
pub mod error;
pub mod prompt;
pub mod render;
pub mod store;
pub mod transport;
pub mod turn;
pub mod types;

// Re-export main types
pub use accumulator::{drive, StreamAccumulator, TurnOutcome};
pub use config::{
    get_env_bool, get_env_int, get_env_or, get_required_env, load_env, load_env_from_path,
};
pub use error::{AmicusError, Result};
pub use render::{markdown_to_html, source_display_title};
pub use store::{HistoryStore, MemoryStore};
pub use transport::{
    create_chunk_stream, ChatTransport, ChunkHandler, ChunkSender, ChunkStream,
    CitationCandidate, StreamChunk,
};
pub use turn::TurnOrchestrator;
pub use types::{Conversation, Message, Role, Source, TurnStatus};
