use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPurpose {
    Intent,
    Plan,
}

impl ReplyPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::Plan => "plan",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub purpose: ReplyPurpose,
    pub model: String,
    pub prompt: String,
    pub response_schema: Value,
}

/// What a backend hands back: an already-typed JSON value when it has one,
/// and the raw candidate text.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub structured: Option<Value>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("model credential is not configured")]
    MissingCredential,
    #[error("{0}")]
    Transport(String),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model reply was not JSON: {0}")]
    InvalidBody(String),
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn generate(&self, request: GenerationRequest) -> Result<ModelReply, ModelError>;
}
