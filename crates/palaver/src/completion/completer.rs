use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::base::{CompletionStrategy, RequestContext};
use super::select::candidate_strategies;
use crate::errors::CompletionError;
use crate::models::message::Message;

/// Credentials that are placeholders rather than real keys. Sends carrying
/// one fail before any network activity.
const PLACEHOLDER_KEYS: &[&str] = &["", "test", "test-key"];

pub fn credential_is_placeholder(api_key: &str) -> bool {
    PLACEHOLDER_KEYS.contains(&api_key)
}

/// Runs a send against the upstream completion API: checks the credential,
/// walks the candidate strategies in order, and returns the extracted answer
/// text of the first one that succeeds.
pub struct Completer {
    client: Client,
    host: String,
}

impl Completer {
    pub fn new<S: Into<String>>(host: S) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self {
            client,
            host: host.into(),
        })
    }

    pub async fn complete(
        &self,
        ctx: &RequestContext,
        messages: &[Message],
    ) -> Result<String, CompletionError> {
        if credential_is_placeholder(&ctx.api_key) {
            return Err(CompletionError::InvalidCredential);
        }

        let mut candidates = candidate_strategies(messages).into_iter().peekable();

        while let Some(strategy) = candidates.next() {
            let is_last = candidates.peek().is_none();

            match self.try_strategy(strategy.as_ref(), ctx, messages).await {
                Ok(text) => return Ok(text),
                Err(err) if is_last => return Err(err),
                Err(err) => {
                    // fallback is transparent to the caller, but the
                    // discarded failure still goes to the log
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %err,
                        "completion strategy failed, trying next"
                    );
                }
            }
        }

        // candidate_strategies never returns an empty list
        Err(CompletionError::Internal(
            "no completion strategy available".to_string(),
        ))
    }

    async fn try_strategy(
        &self,
        strategy: &dyn CompletionStrategy,
        ctx: &RequestContext,
        messages: &[Message],
    ) -> Result<String, CompletionError> {
        let body = strategy.build_request(&ctx.model, &ctx.role, messages);

        let response = self
            .client
            .post(strategy.endpoint(&self.host))
            .bearer_auth(&ctx.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response.json().await?;
        Ok(strategy.extract_text(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> RequestContext {
        RequestContext {
            model: "gpt-4.1".to_string(),
            role: "You are helpful.".to_string(),
            api_key: "sk-real-key".to_string(),
        }
    }

    fn responses_body(text: &str) -> Value {
        json!({
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": text }]
            }]
        })
    }

    fn chat_body(text: &str) -> Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        })
    }

    #[tokio::test]
    async fn test_placeholder_credential_fails_without_network() {
        let mock_server = MockServer::start().await;
        // no mocks mounted: any request would 404, but none must be made at all

        let completer = Completer::new(mock_server.uri()).unwrap();
        let mut bad = ctx();
        bad.api_key = "test-key".to_string();

        let err = completer
            .complete(&bad, &[Message::user().with_text("Hello")])
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::InvalidCredential));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_only_served_by_responses_endpoint() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(responses_body("Hi there!")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let completer = Completer::new(mock_server.uri()).unwrap();
        let text = completer
            .complete(&ctx(), &[Message::user().with_text("Hello")])
            .await
            .unwrap();

        assert_eq!(text, "Hi there!");
    }

    #[tokio::test]
    async fn test_fallback_to_chat_completions_is_transparent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown endpoint"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Hi from chat")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let completer = Completer::new(mock_server.uri()).unwrap();
        let text = completer
            .complete(&ctx(), &[Message::user().with_text("Hello")])
            .await
            .unwrap();

        assert_eq!(text, "Hi from chat");
    }

    #[tokio::test]
    async fn test_final_candidate_failure_surfaces_upstream_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string(r#"{"error":"rate limited"}"#),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string(r#"{"error":"rate limited"}"#),
            )
            .mount(&mock_server)
            .await;

        let completer = Completer::new(mock_server.uri()).unwrap();
        let err = completer
            .complete(&ctx(), &[Message::user().with_text("Hello")])
            .await
            .unwrap_err();

        match err {
            CompletionError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_image_send_goes_straight_to_chat_completions() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("A sunset.")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let completer = Completer::new(mock_server.uri()).unwrap();
        let messages = vec![Message::user()
            .with_text("Describe this image")
            .with_image("https://blob/img1.png")];
        let text = completer.complete(&ctx(), &messages).await.unwrap();

        assert_eq!(text, "A sunset.");
        // only the chat endpoint was hit
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/v1/chat/completions");
    }
}
