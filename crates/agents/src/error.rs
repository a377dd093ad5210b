use planner_core::{IntentLabel, SanitizerVerdict};
use planner_model::{ClassifyError, DecodeError, ModelError};
use thiserror::Error;

/// Every way a plan request can end without a plan. Each one is terminal.
#[derive(Debug, Clone, Error)]
pub enum PlanError {
    #[error("missing {0} environment variable")]
    Configuration(&'static str),
    #[error("input rejected by sanitizer: {}", .0.as_str())]
    InvalidInput(SanitizerVerdict),
    #[error("unsafe content: {reason}")]
    UnsafeContent { reason: String },
    #[error("not plannable ({}): {reason}", .intent.as_str())]
    NotPlannable { intent: IntentLabel, reason: String },
    #[error("intent classification failed: {0}")]
    Classification(ClassifyError),
    #[error("{0}")]
    Generation(ModelError),
    #[error("plan reply could not be parsed: {0}")]
    PlanParse(DecodeError),
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::UnsafeContent { .. } => "unsafe_content",
            Self::NotPlannable { .. } => "not_task_planning_or_incomplete",
            Self::Classification(_) => "classification_failed",
            Self::Generation(_) => "model_error",
            Self::PlanParse(_) => "plan_parse_failed",
        }
    }

    /// Rejections are decisions about the input; everything else is a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::UnsafeContent { .. } | Self::NotPlannable { .. }
        )
    }
}
