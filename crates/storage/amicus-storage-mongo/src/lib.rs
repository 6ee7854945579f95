//! MongoDB history store for Amicus
//!
//! One document per user key in the `chat_histories` collection, replaced by
//! upsert on every write.

#![warn(missing_docs)]
#![warn(clippy::all)]

use amicus_core::{AmicusError, HistoryStore, Message, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{ClientOptions, IndexOptions, UpdateOptions},
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

const COLLECTION: &str = "chat_histories";

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    user_key: String,
    messages: Vec<Message>,
}

/// History store backed by MongoDB
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect and verify the connection with a ping
    pub async fn new(connection_string: &str, database_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB database: {}", database_name);

        let client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| AmicusError::store(format!("Failed to parse MongoDB URI: {}", e)))?;

        let client = Client::with_options(client_options)
            .map_err(|e| AmicusError::store(format!("Failed to create MongoDB client: {}", e)))?;

        let db = client.database(database_name);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AmicusError::store(format!("Failed to connect to MongoDB: {}", e)))?;

        info!("Successfully connected to MongoDB");

        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    fn collection(&self) -> Collection<HistoryDocument> {
        self.db.collection(COLLECTION)
    }

    async fn init_schema(&self) -> Result<()> {
        let indexes = vec![IndexModel::builder()
            .keys(doc! { "user_key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build()];
        self.collection().create_indexes(indexes).await.ok();
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MongoStore {
    fn name(&self) -> &str {
        "mongo"
    }

    async fn get(&self, user_key: &str) -> Result<Vec<Message>> {
        let result = self
            .collection()
            .find_one(doc! { "user_key": user_key })
            .await
            .map_err(|e| AmicusError::store(format!("Failed to get history: {}", e)))?;

        Ok(result.map(|d| d.messages).unwrap_or_default())
    }

    async fn set(&self, user_key: &str, messages: &[Message]) -> Result<()> {
        let messages_bson = to_bson(messages)
            .map_err(|e| AmicusError::store(format!("Failed to encode history: {}", e)))?;

        let options = UpdateOptions::builder().upsert(true).build();
        self.collection()
            .update_one(
                doc! { "user_key": user_key },
                doc! { "$set": { "user_key": user_key, "messages": messages_bson } },
            )
            .with_options(options)
            .await
            .map_err(|e| AmicusError::store(format!("Failed to set history: {}", e)))?;

        Ok(())
    }

    async fn all(&self) -> Result<HashMap<String, Vec<Message>>> {
        let mut cursor = self
            .collection()
            .find(doc! {})
            .await
            .map_err(|e| AmicusError::store(format!("Failed to list histories: {}", e)))?;

        let mut histories = HashMap::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| AmicusError::store(format!("Failed to read history: {}", e)))?
        {
            histories.insert(document.user_key, document.messages);
        }
        Ok(histories)
    }
}
