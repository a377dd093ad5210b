use serde::Serialize;

use crate::models::{IntentLabel, IntentVerdict};

pub const DEFAULT_INCOMPLETE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Proceed,
    RejectUnsafe,
    RejectIncomplete,
}

impl GateDecision {
    pub fn proceeds(self) -> bool {
        self == Self::Proceed
    }
}

/// Turns a classifier verdict into proceed/reject.
///
/// Only `INCOMPLETE` is thresholded: a confident "incomplete" still goes on to
/// planning, where the model is told to fill unknowns with placeholders.
/// `NOT_TASK_PLANNING` is rejected at any confidence.
#[derive(Debug, Clone, Copy)]
pub struct GatePolicy {
    incomplete_threshold: f64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INCOMPLETE_THRESHOLD)
    }
}

impl GatePolicy {
    pub fn new(incomplete_threshold: f64) -> Self {
        Self {
            incomplete_threshold,
        }
    }

    pub fn incomplete_threshold(&self) -> f64 {
        self.incomplete_threshold
    }

    pub fn evaluate(&self, verdict: &IntentVerdict) -> GateDecision {
        match verdict.intent {
            IntentLabel::Unsafe => GateDecision::RejectUnsafe,
            IntentLabel::NotTaskPlanning => GateDecision::RejectIncomplete,
            IntentLabel::Incomplete if verdict.confidence < self.incomplete_threshold => {
                GateDecision::RejectIncomplete
            }
            IntentLabel::Incomplete | IntentLabel::TaskPlanning => GateDecision::Proceed,
        }
    }
}
