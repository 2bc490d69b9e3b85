use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("empty completion")]
    Empty,
}

impl From<ModelError> for crate::error::StudyGuideError {
    fn from(err: ModelError) -> Self {
        crate::error::StudyGuideError::Model {
            message: err.to_string(),
        }
    }
}

/// A chat-completion backend.
///
/// `history` entries are earlier assistant replies, oldest first. They are sent
/// between the system message and the new user message.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        history: &[String],
    ) -> Result<String, ModelError>;

    /// Model identifier for logs and diagnostics
    fn name(&self) -> &str;
}
