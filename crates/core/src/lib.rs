pub mod models;
pub mod policy;
pub mod prompt;
pub mod sanitize;

pub use models::*;
pub use policy::{GateDecision, GatePolicy, DEFAULT_INCOMPLETE_THRESHOLD};
pub use prompt::{
    build_classifier_prompt, build_plan_prompt, language_instruction, today_in_planner_timezone,
    PLANNER_TIMEZONE,
};
pub use sanitize::{inspect_input, is_probably_gibberish, SanitizerVerdict};
