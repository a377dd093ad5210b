use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::backend::{GenerationRequest, GenerativeModel, ModelError, ModelReply};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `generateContent` over REST with JSON-constrained output.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    http: Client,
    api_base: String,
    api_key: Option<String>,
}

impl GeminiModel {
    pub fn new(http: Client, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn backend_name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<ModelReply, ModelError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ModelError::MissingCredential)?;

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&build_payload(&request))
            .send()
            .await
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ModelError::InvalidBody(err.to_string()))?;

        let text = extract_candidate_text(&body);
        if text.is_none() {
            let finish_reason = body
                .pointer("/candidates/0/finishReason")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("-");
            let block_reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("-");
            warn!(
                purpose = request.purpose.as_str(),
                finish_reason,
                block_reason,
                "gemini reply carried no candidate text"
            );
        }

        Ok(reply_from_text(text))
    }
}

fn build_payload(request: &GenerationRequest) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema
        }
    })
}

/// With a JSON mime type the candidate text is the typed document, so a clean
/// parse is reported as the structured value.
fn reply_from_text(text: Option<String>) -> ModelReply {
    let structured = text
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw.trim()).ok())
        .filter(Value::is_object);
    ModelReply { structured, text }
}

fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let chunks = parts
        .iter()
        .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.concat())
    }
}
