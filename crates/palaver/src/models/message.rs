use chrono::Utc;

use super::content::MessageContent;
use super::role::Role;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from the completion API
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    pub fn new(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Message::new(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Message::new(Role::Assistant)
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add image content to the message
    pub fn with_image<S: Into<String>>(self, url: S) -> Self {
        self.with_content(MessageContent::image(url))
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| content.as_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether any part of the message is an image
    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|content| matches!(content, MessageContent::Image(_)))
    }

    /// Replace the whole content with a single text part. Used by the stream
    /// consumer, which rewrites the pending assistant message after every
    /// chunk rather than appending to it.
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.content = vec![MessageContent::text(text)];
    }
}
