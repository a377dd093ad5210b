use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::backend::ModelReply;

/// A decoded reply, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Structured(T),
    Fallback(T),
}

impl<T> Decoded<T> {
    pub fn get(&self) -> &T {
        match self {
            Self::Structured(value) | Self::Fallback(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Structured(value) | Self::Fallback(value) => value,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Fallback(_) => "text_fallback",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("structured path: {structured}; text path: {text}")]
pub struct DecodeError {
    pub structured: String,
    pub text: String,
}

pub fn decode_reply<T: DeserializeOwned>(reply: &ModelReply) -> Result<Decoded<T>, DecodeError> {
    let structured = match reply.structured.as_ref() {
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(decoded) => return Ok(Decoded::Structured(decoded)),
            Err(err) => err.to_string(),
        },
        None => "absent".to_string(),
    };

    let text = match reply.text.as_deref() {
        Some(raw) => match serde_json::from_str::<T>(strip_code_fence(raw)) {
            Ok(decoded) => return Ok(Decoded::Fallback(decoded)),
            Err(err) => err.to_string(),
        },
        None => "absent".to_string(),
    };

    Err(DecodeError { structured, text })
}

/// Removes a surrounding Markdown fence such as three backticks plus `json`.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
