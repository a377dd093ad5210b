use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder the model is told to emit for details it cannot infer.
pub const TBD_SENTINEL: &str = "TBD";

pub const MIN_SUBTASKS: usize = 3;
pub const MAX_SUBTASKS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub input: String,
    #[serde(default)]
    pub target_language: Option<String>,
}

impl PlanRequest {
    /// Language label with blank values treated as absent.
    pub fn language(&self) -> Option<&str> {
        self.target_language
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentLabel {
    TaskPlanning,
    NotTaskPlanning,
    Incomplete,
    Unsafe,
}

impl IntentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskPlanning => "TASK_PLANNING",
            Self::NotTaskPlanning => "NOT_TASK_PLANNING",
            Self::Incomplete => "INCOMPLETE",
            Self::Unsafe => "UNSAFE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentVerdict {
    pub intent: IntentLabel,
    pub confidence: f64,
    pub reason: String,
}

impl IntentVerdict {
    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub task_name: String,
    pub start_date: String,
    pub end_date: String,
    pub priority: Priority,
    pub subtasks: Vec<SubTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Plan,
}

/// Contract violations found in a decoded plan. These are reported, never
/// used to reject the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanIssue {
    UnparseableDate { field: &'static str, value: String },
    DatesOutOfOrder { start: NaiveDate, end: NaiveDate },
    SubtaskCount(usize),
    Placeholder { field: String },
}

impl std::fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnparseableDate { field, value } => {
                write!(f, "{field} is not an ISO date: {value:?}")
            }
            Self::DatesOutOfOrder { start, end } => {
                write!(f, "start_date {start} is after end_date {end}")
            }
            Self::SubtaskCount(count) => write!(
                f,
                "expected {MIN_SUBTASKS}-{MAX_SUBTASKS} subtasks, got {count}"
            ),
            Self::Placeholder { field } => write!(f, "{field} still holds {TBD_SENTINEL}"),
        }
    }
}

impl Plan {
    pub fn inspect(&self) -> Vec<PlanIssue> {
        let mut issues = Vec::new();

        let start = parse_iso_date("start_date", &self.start_date, &mut issues);
        let end = parse_iso_date("end_date", &self.end_date, &mut issues);
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                issues.push(PlanIssue::DatesOutOfOrder { start, end });
            }
        }

        let count = self.subtasks.len();
        if !(MIN_SUBTASKS..=MAX_SUBTASKS).contains(&count) {
            issues.push(PlanIssue::SubtaskCount(count));
        }

        if is_placeholder(&self.task_name) {
            issues.push(PlanIssue::Placeholder {
                field: "task_name".to_string(),
            });
        }
        for (field, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if is_placeholder(value) {
                issues.push(PlanIssue::Placeholder {
                    field: field.to_string(),
                });
            }
        }
        for (idx, subtask) in self.subtasks.iter().enumerate() {
            if is_placeholder(&subtask.name) {
                issues.push(PlanIssue::Placeholder {
                    field: format!("subtasks[{idx}].name"),
                });
            }
            if is_placeholder(&subtask.description) {
                issues.push(PlanIssue::Placeholder {
                    field: format!("subtasks[{idx}].description"),
                });
            }
        }

        issues
    }
}

fn parse_iso_date(
    field: &'static str,
    value: &str,
    issues: &mut Vec<PlanIssue>,
) -> Option<NaiveDate> {
    if is_placeholder(value) {
        return None;
    }
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            issues.push(PlanIssue::UnparseableDate {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    value.contains(TBD_SENTINEL)
}
