//! Deterministic stand-in for a hosted model, used by tests across the workspace.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::backend::{GenerationRequest, GenerativeModel, ModelError, ModelReply, ReplyPurpose};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Typed output plus the same document as text.
    Json(Value),
    /// Raw text only, as when a backend has no typed output.
    Text(String),
    Empty,
    Fail(String),
}

impl ScriptedReply {
    fn to_result(&self) -> Result<ModelReply, ModelError> {
        match self {
            Self::Json(value) => Ok(ModelReply {
                structured: Some(value.clone()),
                text: Some(value.to_string()),
            }),
            Self::Text(text) => Ok(ModelReply {
                structured: None,
                text: Some(text.clone()),
            }),
            Self::Empty => Ok(ModelReply::default()),
            Self::Fail(message) => Err(ModelError::Transport(message.clone())),
        }
    }
}

/// Answers every intent call and every plan call with a fixed reply and
/// records the requests it saw.
#[derive(Debug)]
pub struct ScriptedModel {
    intent: ScriptedReply,
    plan: ScriptedReply,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            intent: ScriptedReply::Json(intent_json("TASK_PLANNING", 0.95, "clear planning goal")),
            plan: ScriptedReply::Json(sample_plan_json()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_intent(mut self, reply: ScriptedReply) -> Self {
        self.intent = reply;
        self
    }

    pub fn with_plan(mut self, reply: ScriptedReply) -> Self {
        self.plan = reply;
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, purpose: ReplyPurpose) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.purpose == purpose)
            .count()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<ModelReply, ModelError> {
        let reply = match request.purpose {
            ReplyPurpose::Intent => self.intent.to_result(),
            ReplyPurpose::Plan => self.plan.to_result(),
        };
        self.calls.lock().push(request);
        reply
    }
}

pub fn intent_json(intent: &str, confidence: f64, reason: &str) -> Value {
    json!({
        "intent": intent,
        "confidence": confidence,
        "reason": reason
    })
}

pub fn sample_plan_json() -> Value {
    json!({
        "task_name": "เตรียมพรีเซนต์ยอดขายประจำสัปดาห์",
        "start_date": "2024-08-21",
        "end_date": "2024-08-23",
        "priority": "High",
        "subtasks": [
            { "name": "รวบรวมข้อมูลยอดขาย", "description": "ดึงรายงานยอดขายจาก ERP และไฟล์ Excel" },
            { "name": "จัดทำสไลด์นำเสนอ", "description": "ออกแบบโครงสไลด์และใส่ข้อมูลยอดขาย" },
            { "name": "ซ้อมการนำเสนอ", "description": "ซ้อมพูดตามสไลด์และจับเวลา" }
        ]
    })
}
