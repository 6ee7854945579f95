//! Gemini streaming chat transport for Amicus
//!
//! Talks to the Generative Language API's `streamGenerateContent` endpoint
//! with SSE framing and the `googleSearch` grounding tool enabled, and feeds
//! the parsed text fragments and grounding citations into a chunk stream.

#![warn(missing_docs)]
#![warn(clippy::all)]

use amicus_core::{
    create_chunk_stream, AmicusError, ChatTransport, ChunkHandler, ChunkStream,
    CitationCandidate, Message, Result, Role, StreamChunk,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Default model when `GEMINI_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or initialize the shared HTTP client
fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_max_idle_per_host(50)
                .pool_idle_timeout(std::time::Duration::from_secs(300))
                .tcp_keepalive(std::time::Duration::from_secs(60))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default()
        })
        .clone()
}

/// Gemini chat transport
pub struct GeminiTransport {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTransport {
    /// Create a transport with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a transport for a specific model
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: get_http_client(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a transport from `GEMINI_API_KEY` and `GEMINI_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = amicus_core::get_required_env("GEMINI_API_KEY")?;
        let model = amicus_core::get_env_or("GEMINI_MODEL", DEFAULT_MODEL);
        Ok(Self::with_model(api_key, model))
    }

    /// Override the API base URL (tests point this at a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(
        &self,
        system_instruction: &str,
        prior_messages: &[Message],
        new_user_text: &str,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = prior_messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .map(|m| Content {
                role: match m.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: new_user_text.to_string(),
            }],
        });

        GenerateContentRequest {
            system_instruction: Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
            contents,
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[async_trait]
impl ChatTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn start_stream(
        &self,
        system_instruction: &str,
        prior_messages: &[Message],
        new_user_text: &str,
    ) -> Result<ChunkStream> {
        if self.api_key.is_empty() {
            return Err(AmicusError::config("GEMINI_API_KEY is not set"));
        }

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let request = self.build_request(system_instruction, prior_messages, new_user_text);

        let mut resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("accept", "text/event-stream")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AmicusError::transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(AmicusError::transport(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        debug!("Gemini stream opened for model {}", self.model);

        let (sender, receiver) = create_chunk_stream(32);
        tokio::spawn(async move {
            let handler = ChunkHandler::new(sender);
            let mut buffer = String::new();

            loop {
                let chunk = match resp.chunk().await {
                    Ok(Some(c)) => c,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Gemini stream read failed: {}", e);
                        let _ = handler
                            .send_error(AmicusError::transport(e.to_string()))
                            .await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                let mut lines: Vec<String> = buffer.split('\n').map(|s| s.to_string()).collect();
                buffer = lines.pop().unwrap_or_default();
                for line in lines {
                    if let Some(parsed) = parse_sse_line(&line) {
                        if handler.send_chunk(parsed).await.is_err() {
                            // Receiver dropped; the turn was abandoned.
                            return;
                        }
                    }
                }
            }

            // A complete trailing line may remain when the body does not end
            // with a newline.
            if let Some(parsed) = parse_sse_line(&buffer) {
                let _ = handler.send_chunk(parsed).await;
            }
        });

        Ok(receiver)
    }
}

/// Parse one SSE line into a chunk; non-data and unparseable lines yield None
fn parse_sse_line(line: &str) -> Option<StreamChunk> {
    let l = line.trim();
    if !l.starts_with("data:") {
        return None;
    }
    let payload = l.trim_start_matches("data:").trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    let response: GenerateContentResponse = match serde_json::from_str(payload) {
        Ok(r) => r,
        Err(e) => {
            warn!("Skipping unparseable Gemini event: {}", e);
            return None;
        }
    };
    Some(response_to_chunk(response))
}

fn response_to_chunk(response: GenerateContentResponse) -> StreamChunk {
    let mut chunk = StreamChunk::default();
    let Some(candidate) = response.candidates.into_iter().next() else {
        return chunk;
    };

    if let Some(content) = candidate.content {
        for part in content.parts {
            chunk.text.push_str(&part.text);
        }
    }
    if let Some(metadata) = candidate.grounding_metadata {
        for grounding in metadata.grounding_chunks {
            if let Some(web) = grounding.web {
                chunk.citations.push(CitationCandidate {
                    url: web.uri,
                    title: web.title,
                });
            }
        }
    }
    chunk
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: Option<String>,
}
