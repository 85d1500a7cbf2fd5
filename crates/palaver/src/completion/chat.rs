use serde_json::{json, Value};

use super::base::CompletionStrategy;
use crate::models::content::MessageContent;
use crate::models::message::Message;

/// Chat-completions strategy against `/v1/chat/completions`. Carries image
/// parts as `image_url` content, so it serves every multimodal send and acts
/// as the fallback for text-only ones.
pub struct ChatCompletionStrategy;

impl CompletionStrategy for ChatCompletionStrategy {
    fn name(&self) -> &'static str {
        "chat-completion"
    }

    fn supports_images(&self) -> bool {
        true
    }

    fn endpoint(&self, host: &str) -> String {
        format!("{}/v1/chat/completions", host.trim_end_matches('/'))
    }

    fn build_request(&self, model: &str, system: &str, messages: &[Message]) -> Value {
        let mut messages_spec = Vec::new();

        if !system.is_empty() {
            messages_spec.push(json!({
                "role": "system",
                "content": system,
            }));
        }

        for message in messages {
            messages_spec.push(json!({
                "role": message.role,
                "content": content_spec(&message.content),
            }));
        }

        json!({
            "model": model,
            "messages": messages_spec,
            "stream": false,
        })
    }

    fn extract_text(&self, response: &Value) -> String {
        response["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("No response received")
            .to_string()
    }
}

/// Convert message parts to the chat-completions content value: a bare
/// string for single-text messages, a part array otherwise.
fn content_spec(content: &[MessageContent]) -> Value {
    match content {
        [MessageContent::Text(text)] => json!(text.text),
        parts => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    MessageContent::Text(text) => json!({
                        "type": "text",
                        "text": text.text,
                    }),
                    MessageContent::Image(image) => json!({
                        "type": "image_url",
                        "image_url": {
                            "url": image.url,
                        },
                    }),
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_text_only() {
        let strategy = ChatCompletionStrategy;
        let messages = vec![
            Message::user().with_text("Hello"),
            Message::assistant().with_text("Hi!"),
        ];
        let body = strategy.build_request("gpt-4.1", "You are helpful.", &messages);

        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["stream"], false);
        let spec = body["messages"].as_array().unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[0]["content"], "You are helpful.");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"], "Hello");
        assert_eq!(spec[2]["role"], "assistant");
        assert_eq!(spec[2]["content"], "Hi!");
    }

    #[test]
    fn test_build_request_omits_empty_system() {
        let strategy = ChatCompletionStrategy;
        let messages = vec![Message::user().with_text("Hello")];
        let body = strategy.build_request("gpt-4.1", "", &messages);

        let spec = body["messages"].as_array().unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
    }

    #[test]
    fn test_build_request_multimodal() {
        let strategy = ChatCompletionStrategy;
        let messages = vec![Message::user()
            .with_text("Describe this image")
            .with_image("https://blob/img1.png")];
        let body = strategy.build_request("gpt-4.1", "", &messages);

        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "Describe this image");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "https://blob/img1.png");
    }

    #[test]
    fn test_extract_text() {
        let strategy = ChatCompletionStrategy;
        let response = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi there!" } }]
        });
        assert_eq!(strategy.extract_text(&response), "Hi there!");

        let empty = serde_json::json!({ "choices": [] });
        assert_eq!(strategy.extract_text(&empty), "No response received");
    }
}
