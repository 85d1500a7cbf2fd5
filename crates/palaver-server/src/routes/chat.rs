use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{self, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use palaver::completion::RequestContext;
use palaver::errors::CompletionError;
use palaver::models::message::Message;
use palaver::normalize::{decode_message, WireMessage};
use palaver::relay::{paced_chunks, Pacing};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

// Types matching the incoming JSON structure
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<WireMessage>,
    model: String,
    #[serde(default)]
    role: String,
    #[serde(default, rename = "apiKey")]
    api_key: String,
}

/// Streamed relay reply: raw text chunks with a typing cadence.
struct ChunkedTextResponse {
    stream: BoxStream<'static, Bytes>,
}

impl ChunkedTextResponse {
    fn new(text: String, pacing: Pacing) -> Self {
        Self {
            stream: paced_chunks(text, pacing),
        }
    }
}

impl IntoResponse for ChunkedTextResponse {
    fn into_response(self) -> axum::response::Response {
        let body = Body::from_stream(self.stream.map(Ok::<_, Infallible>));

        http::Response::builder()
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .unwrap()
    }
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> axum::response::Response {
    // Convert incoming messages, dropping anything with an unknown role
    let messages: Vec<Message> = request.messages.iter().filter_map(decode_message).collect();

    // A request without a key falls back to the server-configured one; the
    // completer still rejects placeholders before any upstream call.
    let api_key = if request.api_key.is_empty() {
        state.fallback_api_key.clone().unwrap_or_default()
    } else {
        request.api_key
    };

    let ctx = RequestContext {
        model: request.model,
        role: request.role,
        api_key,
    };

    match state.completer.complete(&ctx, &messages).await {
        Ok(text) => ChunkedTextResponse::new(text, state.pacing).into_response(),
        Err(err) => {
            tracing::error!("chat relay error: {}", err);
            match err {
                CompletionError::InvalidCredential => {
                    error_response(StatusCode::BAD_REQUEST, err.to_string())
                }
                CompletionError::Upstream { status, .. } => {
                    let status = StatusCode::from_u16(status)
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    error_response(status, err.to_string())
                }
                _ => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while processing your request.".to_string(),
                ),
            }
        }
    }
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .with_state(state)
}
