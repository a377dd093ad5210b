//! Response schemas in the OpenAPI subset accepted by `generationConfig.responseSchema`.

use serde_json::{json, Value};

pub fn intent_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "intent": {
                "type": "STRING",
                "enum": ["TASK_PLANNING", "NOT_TASK_PLANNING", "INCOMPLETE", "UNSAFE"]
            },
            "confidence": {
                "type": "NUMBER",
                "minimum": 0.0,
                "maximum": 1.0
            },
            "reason": { "type": "STRING" }
        },
        "required": ["intent", "confidence", "reason"],
        "propertyOrdering": ["intent", "confidence", "reason"]
    })
}

pub fn plan_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "task_name": {
                "type": "STRING",
                "description": "Main heading of the plan"
            },
            "start_date": {
                "type": "STRING",
                "description": "Plan start date in YYYY-MM-DD format"
            },
            "end_date": {
                "type": "STRING",
                "description": "Plan end date in YYYY-MM-DD format"
            },
            "priority": {
                "type": "STRING",
                "enum": ["Low", "Medium", "High"]
            },
            "subtasks": {
                "type": "ARRAY",
                "description": "3-10 subtasks, each with a name and a description",
                "minItems": 3,
                "maxItems": 10,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["task_name", "start_date", "end_date", "priority", "subtasks"],
        "propertyOrdering": ["task_name", "start_date", "end_date", "priority", "subtasks"]
    })
}
