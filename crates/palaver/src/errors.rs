use thiserror::Error;

/// Guidance returned when a request arrives without a usable credential.
pub const INVALID_CREDENTIAL_HELP: &str = "Please provide a valid API key. \
You can find your OpenAI API key at https://platform.openai.com/account/api-keys.";

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("{}", INVALID_CREDENTIAL_HELP)]
    InvalidCredential,

    #[error("upstream API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("error contacting the completion API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// User-initiated cancellation. Never surfaced to the user; the consumer
    /// treats it as a clean terminal state.
    #[error("send aborted")]
    Aborted,

    /// A send was issued while another one was in flight on the same
    /// conversation.
    #[error("a send is already in flight for this conversation")]
    SendInFlight,

    #[error("relay error ({status}): {message}")]
    Relay { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn is_abort(&self) -> bool {
        matches!(self, ClientError::Aborted)
    }
}
