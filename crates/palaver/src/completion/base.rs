use serde_json::Value;

use crate::models::message::Message;

/// Per-send parameters for one relay exchange. Built from current settings
/// when a send starts and dropped with it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub model: String,
    /// System role text. An empty string means no system message is sent.
    pub role: String,
    pub api_key: String,
}

/// One concrete way of invoking the upstream completion API, with its own
/// request and response shapes.
pub trait CompletionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the strategy can carry image parts
    fn supports_images(&self) -> bool;

    fn endpoint(&self, host: &str) -> String;

    /// Assemble the outbound request body. Input messages are not mutated.
    fn build_request(&self, model: &str, system: &str, messages: &[Message]) -> Value;

    /// Pull the answer text out of a successful response. Unexpected shapes
    /// degrade to a placeholder string rather than an error, matching what
    /// the relay has always surfaced for them.
    fn extract_text(&self, response: &Value) -> String;
}
