//! Conversation history persistence

use crate::types::Message;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A mapping from user key to that user's ordered message list
///
/// Keys are opaque strings (emails in practice). Which backend sits behind
/// the trait is a deployment choice; no data compatibility across backends
/// is assumed.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store name, for logging and diagnostics
    fn name(&self) -> &str;

    /// Get a user's stored messages; empty if the key is absent
    async fn get(&self, user_key: &str) -> Result<Vec<Message>>;

    /// Replace a user's stored messages
    async fn set(&self, user_key: &str, messages: &[Message]) -> Result<()>;

    /// All stored histories, keyed by user (admin read surface)
    async fn all(&self) -> Result<HashMap<String, Vec<Message>>>;
}

/// In-memory history store
///
/// Default backend for tests and single-process deployments; contents are
/// lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    histories: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, user_key: &str) -> Result<Vec<Message>> {
        let histories = self.histories.read().await;
        Ok(histories.get(user_key).cloned().unwrap_or_default())
    }

    async fn set(&self, user_key: &str, messages: &[Message]) -> Result<()> {
        let mut histories = self.histories.write().await;
        histories.insert(user_key.to_string(), messages.to_vec());
        Ok(())
    }

    async fn all(&self) -> Result<HashMap<String, Vec<Message>>> {
        let histories = self.histories.read().await;
        Ok(histories.clone())
    }
}
