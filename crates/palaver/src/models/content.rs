use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// An image reference carried inside a message. The locator is opaque to the
/// relay: either an https URL (typically into object storage) or an inline
/// `data:` URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub url: String,
}

impl ImageContent {
    pub fn from_url<S: Into<String>>(url: S) -> Self {
        ImageContent { url: url.into() }
    }

    /// Inline raw bytes as a `data:` URI so an image can travel without the
    /// object-storage collaborator.
    pub fn from_data(data: &[u8], mime_type: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        ImageContent {
            url: format!("data:{};base64,{}", mime_type, encoded),
        }
    }

    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
/// One atomic unit of message content
pub enum MessageContent {
    Text(TextContent),
    Image(ImageContent),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn image<S: Into<String>>(url: S) -> Self {
        MessageContent::Image(ImageContent::from_url(url))
    }

    /// Get the text if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Get the image locator if this is an Image variant
    pub fn as_image(&self) -> Option<&str> {
        match self {
            MessageContent::Image(image) => Some(&image.url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_encoding() {
        let image = ImageContent::from_data(b"png bytes", "image/png");
        assert!(image.url.starts_with("data:image/png;base64,"));
        assert!(image.is_inline());
        assert!(!ImageContent::from_url("https://blob/img1.png").is_inline());
    }

    #[test]
    fn test_content_accessors() {
        let text = MessageContent::text("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(text.as_image(), None);

        let image = MessageContent::image("https://blob/img1.png");
        assert_eq!(image.as_image(), Some("https://blob/img1.png"));
        assert_eq!(image.as_text(), None);
    }
}
