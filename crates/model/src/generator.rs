use std::sync::Arc;

use planner_core::Plan;
use thiserror::Error;

use crate::backend::{GenerationRequest, GenerativeModel, ModelError, ReplyPurpose};
use crate::decode::{decode_reply, DecodeError, Decoded};
use crate::schema::plan_response_schema;

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("plan reply could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

/// Schema-constrained plan generation. No retries, no repair of bad replies.
#[derive(Clone)]
pub struct PlanGenerator {
    model: Arc<dyn GenerativeModel>,
}

impl PlanGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn generate(
        &self,
        model_name: &str,
        prompt: String,
    ) -> Result<Decoded<Plan>, GenerateError> {
        let reply = self
            .model
            .generate(GenerationRequest {
                purpose: ReplyPurpose::Plan,
                model: model_name.to_string(),
                prompt,
                response_schema: plan_response_schema(),
            })
            .await?;

        Ok(decode_reply::<Plan>(&reply)?)
    }
}
