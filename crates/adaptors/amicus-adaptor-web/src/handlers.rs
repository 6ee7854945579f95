//! Request handlers for the Amicus web API

use crate::AppState;
use amicus_core::{
    prompt::WELCOME_MESSAGE, AmicusError, Conversation, Message, Role, Source, TurnOrchestrator,
    TurnStatus,
};
use axum::response::sse::{Event, Sse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::convert::Infallible;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};

/// API error responses
pub enum ApiError {
    /// Malformed or invalid request
    BadRequest(String),
    /// Requested resource does not exist
    NotFound(String),
    /// Request conflicts with in-flight work
    Conflict(String),
    /// Unexpected server-side failure
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<AmicusError> for ApiError {
    fn from(err: AmicusError) -> Self {
        error!("AmicusError: {}", err);
        match err {
            AmicusError::Validation(msg) => ApiError::BadRequest(msg),
            AmicusError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Liveness check
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/history/:user_key`
pub async fn get_history_handler(
    State(state): State<AppState>,
    Path(user_key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.store.get(&user_key).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "history": history,
    })))
}

/// Body of `POST /api/history`
#[derive(Debug, Deserialize)]
pub struct SetHistoryRequest {
    email: Option<String>,
    history: Option<Vec<Message>>,
}

/// `POST /api/history`
pub async fn set_history_handler(
    State(state): State<AppState>,
    Json(request): Json<SetHistoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = match request.email {
        Some(e) if !e.trim().is_empty() => e,
        _ => return Err(ApiError::BadRequest("Email is required".to_string())),
    };
    let Some(history) = request.history else {
        return Err(ApiError::BadRequest("History is required".to_string()));
    };

    state.store.set(&email, &history).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `GET /api/admin/histories`
pub async fn admin_histories_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let histories = state.store.all().await?;
    let total_messages: usize = histories.values().map(|m| m.len()).sum();
    Ok(Json(serde_json::json!({
        "success": true,
        "users": histories.len(),
        "totalMessages": total_messages,
        "histories": histories,
    })))
}

/// `POST /api/analytics`
///
/// Accepts an arbitrary event payload and logs it. Nothing is stored.
pub async fn analytics_handler(Json(event): Json<JsonValue>) -> impl IntoResponse {
    info!("Analytics event: {}", event);
    Json(serde_json::json!({ "success": true }))
}

/// Body of `POST /api/chat/stream`
#[derive(Debug, Deserialize)]
pub struct ChatStreamRequest {
    email: String,
    text: String,
}

enum StreamEvent {
    Chunk(String),
    Complete { text: String, sources: Vec<Source> },
    Error(String),
}

/// `POST /api/chat/stream` (SSE)
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatStreamRequest>,
) -> Response {
    if request.email.trim().is_empty() {
        return ApiError::BadRequest("Email is required".to_string()).into_response();
    }
    if request.text.trim().is_empty() {
        return ApiError::BadRequest("Message text cannot be empty".to_string()).into_response();
    }

    // One turn per user at a time.
    {
        let mut active = match state.active_turns.lock() {
            Ok(a) => a,
            Err(e) => {
                return ApiError::Internal(format!("Turn registry poisoned: {}", e))
                    .into_response()
            }
        };
        if !active.insert(request.email.clone()) {
            return ApiError::Conflict(
                "A turn is already in flight for this conversation".to_string(),
            )
            .into_response();
        }
    }

    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel::<StreamEvent>();

    let store = state.store.clone();
    let transport = state.transport.clone();
    let system_instruction = state.system_instruction.clone();
    let active_turns = state.active_turns.clone();
    let email = request.email.clone();
    let text = request.text.clone();

    tokio::spawn(async move {
        let outcome = async {
            let mut prior = store.get(&email).await?;
            // A brand-new conversation opens with the canned greeting.
            if prior.is_empty() {
                prior.push(Message::assistant(WELCOME_MESSAGE));
            }
            let mut conversation = Conversation::with_messages(email.clone(), prior);
            let orchestrator =
                TurnOrchestrator::new(transport, store, system_instruction.as_str());

            let snapshot_sender = sender.clone();
            orchestrator
                .run_turn(&mut conversation, &text, |c| {
                    if let Some(message) = c.messages.last() {
                        if message.role == Role::Assistant && message.status == TurnStatus::Streaming
                        {
                            let _ = snapshot_sender.send(StreamEvent::Chunk(message.content.clone()));
                        }
                    }
                })
                .await
        }
        .await;

        match outcome {
            Ok(outcome) if outcome.status == TurnStatus::Error => {
                let _ = sender.send(StreamEvent::Error(
                    outcome.error.unwrap_or_else(|| outcome.text.clone()),
                ));
            }
            Ok(outcome) => {
                let _ = sender.send(StreamEvent::Complete {
                    text: outcome.text,
                    sources: outcome.sources,
                });
            }
            Err(e) => {
                warn!("Chat turn for {} failed: {}", email, e);
                let _ = sender.send(StreamEvent::Error(e.to_string()));
            }
        }

        if let Ok(mut active) = active_turns.lock() {
            active.remove(&email);
        }
    });

    let sse_stream: BoxStream<'static, Result<Event, Infallible>> =
        UnboundedReceiverStream::new(receiver)
            .map(|event| {
                Ok(match event {
                    StreamEvent::Chunk(text) => {
                        let data = serde_json::json!({ "text": text });
                        Event::default().event("chunk").data(data.to_string())
                    }
                    StreamEvent::Complete { text, sources } => {
                        let data = serde_json::json!({ "text": text, "sources": sources });
                        Event::default().event("complete").data(data.to_string())
                    }
                    StreamEvent::Error(message) => {
                        let data = serde_json::json!({ "error": message });
                        Event::default().event("error").data(data.to_string())
                    }
                })
            })
            .boxed();

    Sse::new(sse_stream).into_response()
}
