//! Relay-endpoint consumer: optimistic append, incremental stream decode,
//! cancellation, and conversation-level error state.

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::completion::RequestContext;
use crate::errors::ClientError;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::normalize::{encode_message, WireMessage};

/// One chat thread as the client sees it. Mutated only by the send/read path
/// and by user edits; `loading` guards against overlapping sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
    /// Draft text, preserved across failures so nothing typed is lost.
    pub input: String,
    pub error: Option<String>,
    #[serde(skip)]
    pub loading: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Conversation::default()
    }
}

/// Ephemeral per-send state owning the cancellation token for one exchange.
/// Clones share the token, so a handle can be parked in a ctrl-c watcher
/// while the consumer loop runs. Stopping is idempotent; stopping after the
/// exchange finished has no effect.
#[derive(Debug, Clone, Default)]
pub struct StreamSession {
    token: CancellationToken,
}

impl StreamSession {
    pub fn new() -> Self {
        StreamSession::default()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    messages: Vec<WireMessage>,
    model: &'a str,
    role: &'a str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the chat relay endpoint.
pub struct RelayClient {
    http: Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new<S: Into<String>>(server_url: S) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        let server_url = server_url.into();

        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", server_url.trim_end_matches('/')),
        })
    }

    /// Append `message` to the conversation and stream the reply into a
    /// trailing assistant message.
    ///
    /// Terminal states:
    /// - success: the assistant message holds the full reply, `loading` is
    ///   cleared;
    /// - stop via `session`: whatever had streamed stays in place, `loading`
    ///   is cleared, no error is recorded and `Ok` is returned;
    /// - failure: an untouched placeholder is removed, the failure lands in
    ///   `conversation.error`, the draft returns to `conversation.input`,
    ///   and the error is also returned.
    pub async fn append(
        &self,
        conversation: &mut Conversation,
        message: Message,
        ctx: &RequestContext,
        session: &StreamSession,
    ) -> Result<(), ClientError> {
        self.append_with(conversation, message, ctx, session, |_| {}).await
    }

    /// Like [`append`](Self::append), with `on_text` invoked with the full
    /// accumulated reply text after every received chunk.
    pub async fn append_with<F>(
        &self,
        conversation: &mut Conversation,
        message: Message,
        ctx: &RequestContext,
        session: &StreamSession,
        mut on_text: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        if conversation.loading {
            return Err(ClientError::SendInFlight);
        }

        let draft = message.text();
        conversation.input.clear();
        conversation.error = None;
        conversation.loading = true;
        conversation.messages.push(message);

        let result = self
            .stream_reply(conversation, ctx, session, &mut on_text)
            .await;
        conversation.loading = false;

        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_abort() => Ok(()),
            Err(err) => {
                // drop the placeholder if nothing streamed into it
                if conversation
                    .messages
                    .last()
                    .is_some_and(|m| m.role == Role::Assistant && m.text().is_empty())
                {
                    conversation.messages.pop();
                }
                conversation.error = Some(err.to_string());
                conversation.input = draft;
                Err(err)
            }
        }
    }

    async fn stream_reply<F>(
        &self,
        conversation: &mut Conversation,
        ctx: &RequestContext,
        session: &StreamSession,
        on_text: &mut F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        let payload = RelayRequest {
            messages: conversation.messages.iter().map(encode_message).collect(),
            model: &ctx.model,
            role: &ctx.role,
            api_key: &ctx.api_key,
        };

        // stable insertion point for the streamed reply
        conversation.messages.push(Message::assistant());

        let response = tokio::select! {
            result = self.http.post(&self.endpoint).json(&payload).send() => result?,
            _ = session.token.cancelled() => return Err(ClientError::Aborted),
        };

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => "request failed".to_string(),
            };
            return Err(ClientError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        buf.extend_from_slice(&bytes);
                        // replace, not append: the pending message always
                        // holds the longest valid prefix of everything
                        // received so far
                        let text = valid_prefix(&buf).to_string();
                        set_pending_text(conversation, &text);
                        on_text(&text);
                    }
                    Some(Err(err)) => return Err(ClientError::Transport(err)),
                    None => break,
                },
                _ = session.token.cancelled() => return Err(ClientError::Aborted),
            }
        }

        let text = String::from_utf8_lossy(&buf).into_owned();
        set_pending_text(conversation, &text);
        Ok(())
    }
}

fn set_pending_text(conversation: &mut Conversation, text: &str) {
    if let Some(last) = conversation.messages.last_mut() {
        last.set_text(text);
    }
}

/// Longest prefix of `buf` that is complete UTF-8. A multi-byte character
/// split across chunks stays out of view until its tail arrives.
fn valid_prefix(buf: &[u8]) -> &str {
    match std::str::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or(""),
    }
}
