//! MongoDB integration tests
//!
//! These tests require a running MongoDB instance.
//! Set MONGODB_URL environment variable to run these tests.
//!
//! Run with: cargo test -p amicus-storage-mongo --test mongo_integration_tests -- --ignored

use amicus_core::{HistoryStore, Message};
use amicus_storage_mongo::MongoStore;

async fn setup_store() -> Option<MongoStore> {
    let mongodb_url = std::env::var("MONGODB_URL").ok()?;
    let db_name = format!(
        "amicus_test_{}",
        &uuid::Uuid::new_v4().to_string().replace('-', "")[..8]
    );
    MongoStore::new(&mongodb_url, &db_name).await.ok()
}

#[tokio::test]
#[ignore = "Requires MongoDB instance"]
async fn test_history_round_trip() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    let messages = vec![Message::user("hi"), Message::assistant("hello")];
    store.set("user@example.com", &messages).await.unwrap();

    let back = store.get("user@example.com").await.unwrap();
    assert_eq!(back, messages);
}

#[tokio::test]
#[ignore = "Requires MongoDB instance"]
async fn test_absent_user_is_empty() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    assert!(store.get("nobody@example.com").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires MongoDB instance"]
async fn test_set_upserts_and_replaces() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    store
        .set("user@example.com", &[Message::user("first")])
        .await
        .unwrap();
    let replacement = vec![Message::user("first"), Message::assistant("reply")];
    store.set("user@example.com", &replacement).await.unwrap();

    assert_eq!(store.get("user@example.com").await.unwrap(), replacement);

    let all = store.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["user@example.com"].len(), 2);
}
