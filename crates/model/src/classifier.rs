use std::sync::Arc;

use planner_core::{build_classifier_prompt, IntentVerdict};
use thiserror::Error;

use crate::backend::{GenerationRequest, GenerativeModel, ModelError, ReplyPurpose};
use crate::decode::{decode_reply, DecodeError, Decoded};
use crate::schema::intent_response_schema;

#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    #[error("intent call failed: {0}")]
    Model(#[from] ModelError),
    #[error("intent reply could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("intent confidence {0} is outside 0..=1")]
    ConfidenceOutOfRange(f64),
}

/// One model call mapping request text to an intent verdict.
#[derive(Clone)]
pub struct IntentClassifier {
    model: Arc<dyn GenerativeModel>,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn classify(
        &self,
        model_name: &str,
        text: &str,
    ) -> Result<Decoded<IntentVerdict>, ClassifyError> {
        let reply = self
            .model
            .generate(GenerationRequest {
                purpose: ReplyPurpose::Intent,
                model: model_name.to_string(),
                prompt: build_classifier_prompt(text),
                response_schema: intent_response_schema(),
            })
            .await?;

        let decoded = decode_reply::<IntentVerdict>(&reply)?;
        if !decoded.get().has_valid_confidence() {
            return Err(ClassifyError::ConfidenceOutOfRange(decoded.get().confidence));
        }
        Ok(decoded)
    }
}
