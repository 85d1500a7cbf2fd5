use super::base::CompletionStrategy;
use super::chat::ChatCompletionStrategy;
use super::responses::TextCompletionStrategy;
use crate::models::message::Message;

/// The ordered candidate strategies for a send. Any image part forces the
/// multimodal strategy; text-only sends prefer the lower-latency text
/// completion endpoint with the chat endpoint as a transparent fallback.
pub fn candidate_strategies(messages: &[Message]) -> Vec<Box<dyn CompletionStrategy>> {
    let has_images = messages.iter().any(Message::has_image);

    if has_images {
        vec![Box::new(ChatCompletionStrategy)]
    } else {
        vec![
            Box::new(TextCompletionStrategy),
            Box::new(ChatCompletionStrategy),
        ]
    }
}
