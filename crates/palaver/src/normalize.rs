//! Wire-boundary message normalization.
//!
//! Browser-style clients send message content either as a plain string or as
//! a JSON-encoded array of `{type, text?, image?}` records (the multimodal
//! case). Everything past this module works with the explicit
//! [`MessageContent`] union; the shape-sniffing lives here and nowhere else,
//! and it fails closed: anything that does not decode cleanly is treated as
//! plain text, unmodified.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::content::MessageContent;
use crate::models::message::Message;
use crate::models::role::Role;

/// A message as it appears in the relay request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: Value,
}

/// Decode wire content into message parts.
///
/// A string is sniffed: if it starts with `[` it is parsed as a part-record
/// array; on parse failure, or when no recognizable part comes out of it,
/// the original string is kept as plain text. An already-structured array is
/// passed through element-wise. Never fails.
pub fn decode_content(content: &Value) -> Vec<MessageContent> {
    match content {
        Value::String(text) => {
            if text.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
                    let parts = parts_from_records(&items);
                    if !parts.is_empty() {
                        return parts;
                    }
                }
            }
            vec![MessageContent::text(text.clone())]
        }
        Value::Array(items) => {
            let parts = parts_from_records(items);
            if parts.is_empty() {
                // a message must carry at least one part
                vec![MessageContent::text(content.to_string())]
            } else {
                parts
            }
        }
        other => vec![MessageContent::text(other.to_string())],
    }
}

/// Map `{type, text?, image?}` records to parts, in order. Records with an
/// unrecognized shape produce no part.
fn parts_from_records(items: &[Value]) -> Vec<MessageContent> {
    let mut parts = Vec::new();

    for item in items {
        match item.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                    parts.push(MessageContent::text(text));
                }
            }
            Some("image") => {
                if let Some(url) = item.get("image").and_then(|i| i.as_str()) {
                    parts.push(MessageContent::image(url));
                }
            }
            _ => {}
        }
    }

    parts
}

/// Decode a wire message, dropping messages with an unknown role.
pub fn decode_message(wire: &WireMessage) -> Option<Message> {
    let role = match wire.role.as_str() {
        "system" => Role::System,
        "user" => Role::User,
        "assistant" => Role::Assistant,
        other => {
            tracing::warn!("dropping message with unknown role: {}", other);
            return None;
        }
    };

    Some(Message {
        role,
        created: chrono::Utc::now().timestamp(),
        content: decode_content(&wire.content),
    })
}

/// Encode message parts back into the browser-style wire value: a plain
/// string for text-only content, a JSON-array string for multimodal content.
/// Round-trips through [`decode_content`].
pub fn encode_content(content: &[MessageContent]) -> Value {
    match content {
        [MessageContent::Text(text)] => Value::String(text.text.clone()),
        parts => {
            let records: Vec<Value> = parts
                .iter()
                .map(|part| match part {
                    MessageContent::Text(text) => {
                        serde_json::json!({ "type": "text", "text": text.text })
                    }
                    MessageContent::Image(image) => {
                        serde_json::json!({ "type": "image", "image": image.url })
                    }
                })
                .collect();
            Value::String(Value::Array(records).to_string())
        }
    }
}

pub fn encode_message(message: &Message) -> WireMessage {
    WireMessage {
        role: message.role.as_str().to_string(),
        content: encode_content(&message.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_identity() {
        let content = json!("Hello, how are you?");
        let parts = decode_content(&content);
        assert_eq!(parts, vec![MessageContent::text("Hello, how are you?")]);
    }

    #[test]
    fn test_multimodal_string_decodes_in_order() {
        let content = json!(
            r#"[{"type":"text","text":"Describe this image"},{"type":"image","image":"https://blob/img1.png"}]"#
        );
        let parts = decode_content(&content);
        assert_eq!(
            parts,
            vec![
                MessageContent::text("Describe this image"),
                MessageContent::image("https://blob/img1.png"),
            ]
        );
    }

    #[test]
    fn test_unrecognized_records_produce_no_part() {
        let content = json!(r#"[{"type":"text","text":"hi"},{"type":"audio","clip":"x"}]"#);
        let parts = decode_content(&content);
        assert_eq!(parts, vec![MessageContent::text("hi")]);
    }

    #[test]
    fn test_malformed_json_falls_back_to_plain_text() {
        let content = json!("[not json at all");
        let parts = decode_content(&content);
        assert_eq!(parts, vec![MessageContent::text("[not json at all")]);
    }

    #[test]
    fn test_empty_array_string_falls_back_to_plain_text() {
        let content = json!("[]");
        let parts = decode_content(&content);
        assert_eq!(parts, vec![MessageContent::text("[]")]);
    }

    #[test]
    fn test_structured_array_passes_through() {
        let content = json!([
            { "type": "text", "text": "look" },
            { "type": "image", "image": "data:image/png;base64,aGk=" }
        ]);
        let parts = decode_content(&content);
        assert_eq!(
            parts,
            vec![
                MessageContent::text("look"),
                MessageContent::image("data:image/png;base64,aGk="),
            ]
        );
    }

    #[test]
    fn test_unknown_role_is_dropped() {
        let wire = WireMessage {
            role: "tool".to_string(),
            content: json!("output"),
        };
        assert!(decode_message(&wire).is_none());

        let wire = WireMessage {
            role: "user".to_string(),
            content: json!("hi"),
        };
        let message = decode_message(&wire).unwrap();
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text(), "hi");
    }

    #[test]
    fn test_encode_round_trip() {
        let text_only = vec![MessageContent::text("just text")];
        assert_eq!(decode_content(&encode_content(&text_only)), text_only);

        let multimodal = vec![
            MessageContent::text("Describe this image"),
            MessageContent::image("https://blob/img1.png"),
        ];
        let encoded = encode_content(&multimodal);
        assert!(encoded.as_str().unwrap().starts_with('['));
        assert_eq!(decode_content(&encoded), multimodal);
    }
}
