//! Amicus server binary
//!
//! Wires configuration, the selected history store backend, the Gemini
//! transport, and the web API together, then runs until interrupted.

use amicus_adaptor_web::{AppState, WebServer, WebServerConfig};
use amicus_core::{prompt::SYSTEM_INSTRUCTION, HistoryStore, MemoryStore};
use amicus_provider_gemini::GeminiTransport;
use amicus_storage_file::FileStore;
use amicus_storage_mongo::MongoStore;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

async fn build_store() -> anyhow::Result<Arc<dyn HistoryStore>> {
    let backend = amicus_core::get_env_or("AMICUS_STORE", "memory");
    let store: Arc<dyn HistoryStore> = match backend.as_str() {
        "memory" => Arc::new(MemoryStore::new()),
        "file" => Arc::new(FileStore::from_env()),
        "mongo" => {
            let url = amicus_core::get_required_env("MONGODB_URL")?;
            let database = amicus_core::get_env_or("MONGODB_DATABASE", "amicus");
            Arc::new(
                MongoStore::new(&url, &database)
                    .await
                    .context("Failed to connect to MongoDB")?,
            )
        }
        other => anyhow::bail!("Unknown AMICUS_STORE backend: {}", other),
    };
    info!("Using {} history store", store.name());
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amicus_core::load_env().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = build_store().await?;
    let transport = Arc::new(GeminiTransport::from_env().context("Gemini configuration")?);

    let state = AppState::new(store, transport, SYSTEM_INSTRUCTION);
    let config = WebServerConfig::from_env();
    let addr = format!("{}:{}", config.host, config.port);

    let mut server = WebServer::new(config, state);
    server.start().await?;
    info!("Amicus listening on {}", addr);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");
    server.stop().await?;

    Ok(())
}
