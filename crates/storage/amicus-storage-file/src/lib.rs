//! Flat JSON file history store for Amicus
//!
//! Persists every user's conversation in a single JSON document shaped
//! `{ "chatHistories": { "<user key>": [ ...messages ] } }`. Each write
//! rewrites the whole document through a temp file and rename, serialized by
//! a mutex, so a crashed write never leaves a torn file behind.

#![warn(missing_docs)]
#![warn(clippy::all)]

use amicus_core::{AmicusError, HistoryStore, Message, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Default database file path when `AMICUS_DB_PATH` is not set
pub const DEFAULT_DB_PATH: &str = "db.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DbDocument {
    #[serde(default)]
    chat_histories: HashMap<String, Vec<Message>>,
}

/// History store backed by one JSON file on disk
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store over the given file; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store from `AMICUS_DB_PATH`
    pub fn from_env() -> Self {
        Self::new(amicus_core::get_env_or("AMICUS_DB_PATH", DEFAULT_DB_PATH))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<DbDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let document = serde_json::from_str(&contents).map_err(|e| {
                    AmicusError::store(format!(
                        "Corrupt history file {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                Ok(document)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DbDocument::default()),
            Err(e) => Err(AmicusError::store(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_document(&self, document: &DbDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents).await.map_err(|e| {
            AmicusError::store(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AmicusError::store(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Wrote history file {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, user_key: &str) -> Result<Vec<Message>> {
        let document = self.read_document().await?;
        Ok(document
            .chat_histories
            .get(user_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, user_key: &str, messages: &[Message]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document
            .chat_histories
            .insert(user_key.to_string(), messages.to_vec());
        self.write_document(&document).await
    }

    async fn all(&self) -> Result<HashMap<String, Vec<Message>>> {
        Ok(self.read_document().await?.chat_histories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("db.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.get("user@example.com").await.unwrap().is_empty());
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let messages = vec![Message::user("hi"), Message::assistant("hello")];

        store.set("user@example.com", &messages).await.unwrap();
        assert_eq!(store.get("user@example.com").await.unwrap(), messages);
    }

    #[tokio::test]
    async fn test_persists_across_store_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let messages = vec![Message::user("hi")];

        FileStore::new(&path)
            .set("user@example.com", &messages)
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("user@example.com").await.unwrap(), messages);
    }

    #[tokio::test]
    async fn test_file_shape_matches_chat_histories_document() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store
            .set("user@example.com", &[Message::user("hi")])
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["chatHistories"]["user@example.com"].is_array());
    }

    #[tokio::test]
    async fn test_set_keeps_other_users() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store
            .set("a@example.com", &[Message::user("a")])
            .await
            .unwrap();
        store
            .set("b@example.com", &[Message::user("b")])
            .await
            .unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = FileStore::new(&path);
        assert!(store.get("user@example.com").await.is_err());
    }
}
