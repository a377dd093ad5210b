use std::env;
use std::fmt;

use planner_model::DEFAULT_GEMINI_API_BASE;

use crate::error::PlanError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const API_KEY_FALLBACK_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const CLASSIFIER_MODEL_VAR: &str = "GEMINI_CLASSIFIER_MODEL";
pub const API_BASE_VAR: &str = "GEMINI_API_BASE";
pub const BIND_VAR: &str = "PLANNER_BIND";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Process configuration, read once at startup. The credential and model are
/// optional here and checked on every plan request instead.
#[derive(Clone)]
pub struct PlannerConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub classifier_model: Option<String>,
    pub api_base: String,
    pub bind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub plan_model: String,
    pub classifier_model: String,
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_key: read(API_KEY_VAR).or_else(|| read(API_KEY_FALLBACK_VAR)),
            model: read(MODEL_VAR),
            classifier_model: read(CLASSIFIER_MODEL_VAR),
            api_base: read(API_BASE_VAR).unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            bind: read(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string()),
        }
    }

    /// Fails with the name of the first missing variable.
    pub fn resolve_models(&self) -> Result<ModelSelection, PlanError> {
        if self.api_key.is_none() {
            return Err(PlanError::Configuration(API_KEY_VAR));
        }
        let plan_model = self
            .model
            .clone()
            .ok_or(PlanError::Configuration(MODEL_VAR))?;
        let classifier_model = self
            .classifier_model
            .clone()
            .unwrap_or_else(|| plan_model.clone());

        Ok(ModelSelection {
            plan_model,
            classifier_model,
        })
    }
}

impl fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("classifier_model", &self.classifier_model)
            .field("api_base", &self.api_base)
            .field("bind", &self.bind)
            .finish()
    }
}
