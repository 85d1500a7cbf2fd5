use serde_json::{json, Value};

use super::base::CompletionStrategy;
use crate::models::message::Message;
use crate::models::role::Role;

/// Text-only strategy against the `/v1/responses` endpoint. The conversation
/// is flattened into a single transcript string; image parts cannot be
/// carried, so this strategy is only a candidate for text-only sends.
pub struct TextCompletionStrategy;

impl CompletionStrategy for TextCompletionStrategy {
    fn name(&self) -> &'static str {
        "text-completion"
    }

    fn supports_images(&self) -> bool {
        false
    }

    fn endpoint(&self, host: &str) -> String {
        format!("{}/v1/responses", host.trim_end_matches('/'))
    }

    fn build_request(&self, model: &str, system: &str, messages: &[Message]) -> Value {
        json!({
            "model": model,
            "input": transcript(system, messages),
            "text": {
                "verbosity": "low",
            },
        })
    }

    fn extract_text(&self, response: &Value) -> String {
        let Some(output) = response.get("output").and_then(|o| o.as_array()) else {
            // other response formats carry the text at the top level
            return response
                .get("text")
                .or_else(|| response.get("response"))
                .and_then(|t| t.as_str())
                .unwrap_or("No response received")
                .to_string();
        };

        let message_output = output
            .iter()
            .find(|item| item.get("type").and_then(|t| t.as_str()) == Some("message"));

        match message_output.and_then(|m| m.get("content")).and_then(|c| c.as_array()) {
            Some(content) => content
                .iter()
                .find(|item| item.get("type").and_then(|t| t.as_str()) == Some("output_text"))
                .and_then(|item| item.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or("No text content found")
                .to_string(),
            None => "No message output found".to_string(),
        }
    }
}

/// Flatten the conversation into the `System:/User:/Assistant:` transcript
/// the responses endpoint takes as input.
fn transcript(system: &str, messages: &[Message]) -> String {
    let mut input = String::new();

    if !system.is_empty() {
        input.push_str(&format!("System: {}\n\n", system));
    }

    for message in messages {
        let text = message.text();
        if text.is_empty() {
            continue;
        }
        match message.role {
            Role::User => input.push_str(&format!("User: {}\n\n", text)),
            Role::Assistant => input.push_str(&format!("Assistant: {}\n\n", text)),
            Role::System => {}
        }
    }

    input.trim_end().to_string()
}
