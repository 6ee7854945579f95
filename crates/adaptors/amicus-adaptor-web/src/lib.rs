//! HTTP API for Amicus
//!
//! Provides the web surface over the core orchestrator and stores:
//! - Per-user conversation history read/write
//! - Admin view over all stored conversations
//! - Analytics event sink
//! - Streaming chat over SSE
//! - CORS support

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handlers;

use amicus_core::{AmicusError, ChatTransport, HistoryStore, Result};
use axum::{
    routing::{get, post},
    Router,
};
use handlers::{
    admin_histories_handler, analytics_handler, chat_stream_handler, get_history_handler,
    health_check, set_history_handler,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Web server configuration
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
        }
    }
}

impl WebServerConfig {
    /// Build a config from `AMICUS_HOST` and `AMICUS_PORT`
    pub fn from_env() -> Self {
        Self {
            host: amicus_core::get_env_or("AMICUS_HOST", "127.0.0.1"),
            port: amicus_core::get_env_int("AMICUS_PORT", 3000),
            enable_cors: amicus_core::get_env_bool("AMICUS_CORS", true),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Conversation history backend
    pub store: Arc<dyn HistoryStore>,

    /// Streaming chat transport
    pub transport: Arc<dyn ChatTransport>,

    /// System instruction sent with every turn
    pub system_instruction: Arc<String>,

    /// User keys with a turn currently in flight
    pub active_turns: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    /// Create handler state over a store and transport
    pub fn new(
        store: Arc<dyn HistoryStore>,
        transport: Arc<dyn ChatTransport>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            system_instruction: Arc::new(system_instruction.into()),
            active_turns: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

/// Build the Axum router over the given state
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/history/:user_key", get(get_history_handler))
        .route("/api/history", post(set_history_handler))
        .route("/api/admin/histories", get(admin_histories_handler))
        .route("/api/analytics", post(analytics_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Amicus web server
pub struct WebServer {
    config: WebServerConfig,
    state: AppState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    running: bool,
}

impl WebServer {
    /// Create a new server over the given state
    pub fn new(config: WebServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            shutdown_tx: None,
            running: false,
        }
    }

    /// Start the server
    pub async fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(AmicusError::config("Server already running"));
        }

        let router = build_router(self.state.clone(), self.config.enable_cors);

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting Amicus web server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AmicusError::config(format!("Failed to bind to {}: {}", addr, e)))?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.shutdown_tx = Some(tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                error!("Server error: {}", e);
            }
        });

        self.running = true;
        Ok(())
    }

    /// Stop the server
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        self.running = false;
        info!("Amicus web server stopped");
        Ok(())
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}
