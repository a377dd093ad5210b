use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use planner_agents::{PlannerConfig, API_KEY_VAR, MODEL_VAR};
use planner_api::{build_router, with_service_layers, ApiState};
use planner_model::testing::{intent_json, sample_plan_json, ScriptedModel, ScriptedReply};
use planner_model::ReplyPurpose;
use serde_json::{json, Value};
use tower::ServiceExt;

const THAI_REQUEST: &str = "ช่วยวางแผนเตรียมพรีเซนต์ยอดขายประจำสัปดาห์ จะพรีเซนต์วันศุกร์นี้ ขอเริ่มเตรียมตัวตั้งแต่วันพุธ";

fn configured() -> PlannerConfig {
    PlannerConfig::from_lookup(|name| match name {
        API_KEY_VAR => Some("test-key".to_string()),
        MODEL_VAR => Some("gemini-test".to_string()),
        _ => None,
    })
}

fn app_with(config: PlannerConfig, model: Arc<ScriptedModel>) -> Router {
    build_router(ApiState::new(config, model))
}

fn plan_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/plan")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn post_plan(app: Router, input: &str) -> Response {
    app.oneshot(plan_request(json!({ "input": input })))
        .await
        .unwrap()
}

#[tokio::test]
async fn root_and_health_answer() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "Hello" }));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn every_response_carries_correlation_headers() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));

    for request in [
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
        plan_request(json!({ "input": "!!!???" })),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert_eq!(request_id.len(), 8);
        assert!(request_id.chars().all(|ch| ch.is_ascii_hexdigit()));

        let elapsed = response
            .headers()
            .get("x-process-time-ms")
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert!(elapsed.parse::<f64>().is_ok());
    }
}

#[tokio::test]
async fn client_supplied_request_id_is_kept() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "cafe0123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "cafe0123");
}

#[tokio::test]
async fn oversized_or_malformed_request_ids_are_regenerated() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));

    for supplied in ["a".repeat(4000), "id with spaces".to_string()] {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", supplied.as_str())
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let request_id = response.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(request_id.len(), 8);
        assert!(request_id.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn handler_panics_become_500_with_correlation_headers() {
    let app = with_service_layers(Router::new().route("/explode", get(explode)));

    let response = app
        .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-request-id"].len(), 8);
    assert!(response.headers().contains_key("x-process-time-ms"));
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "internal_error");
}

#[tokio::test]
async fn well_formed_plan_is_returned_verbatim() {
    let model = Arc::new(ScriptedModel::new());
    let response = post_plan(app_with(configured(), model.clone()), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "plan": sample_plan_json() }));
    assert_eq!(model.call_count(ReplyPurpose::Intent), 1);
    assert_eq!(model.call_count(ReplyPurpose::Plan), 1);
}

#[tokio::test]
async fn target_language_reaches_the_prompt() {
    let model = Arc::new(ScriptedModel::new());
    let response = app_with(configured(), model.clone())
        .oneshot(plan_request(json!({
            "input": THAI_REQUEST,
            "target_language": "English"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = model.calls();
    assert!(calls[1].prompt.contains("must be written in English"));
    assert!(calls[1].prompt.contains(THAI_REQUEST));
}

#[tokio::test]
async fn unsafe_content_is_rejected_with_reason() {
    let model = Arc::new(ScriptedModel::new().with_intent(ScriptedReply::Json(intent_json(
        "UNSAFE",
        0.95,
        "incites violence",
    ))));
    let response = post_plan(app_with(configured(), model.clone()), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "unsafe_content");
    assert_eq!(body["detail"]["classifier_reason"], "incites violence");
    assert_eq!(model.call_count(ReplyPurpose::Plan), 0);
}

#[tokio::test]
async fn low_confidence_incomplete_is_rejected() {
    let model = Arc::new(ScriptedModel::new().with_intent(ScriptedReply::Json(intent_json(
        "INCOMPLETE",
        0.5,
        "no timeframe",
    ))));
    let response = post_plan(app_with(configured(), model), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "not_task_planning_or_incomplete");
    assert_eq!(body["detail"]["classifier_reason"], "no timeframe");
    assert!(body["detail"]["hints"].is_array());
}

#[tokio::test]
async fn confident_incomplete_proceeds_to_planning() {
    let model = Arc::new(ScriptedModel::new().with_intent(ScriptedReply::Json(intent_json(
        "INCOMPLETE",
        0.9,
        "no timeframe",
    ))));
    let response = post_plan(app_with(configured(), model), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["plan"], sample_plan_json());
}

#[tokio::test]
async fn off_topic_requests_are_rejected_regardless_of_confidence() {
    let model = Arc::new(ScriptedModel::new().with_intent(ScriptedReply::Json(intent_json(
        "NOT_TASK_PLANNING",
        0.1,
        "small talk",
    ))));
    let response = post_plan(app_with(configured(), model), "How is the weather today?").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn gibberish_is_rejected_without_model_calls() {
    let model = Arc::new(ScriptedModel::new());
    let app = app_with(configured(), model.clone());

    for input in ["!!!???", "short", "aaaaaaaaa deploy the plan"] {
        let response = post_plan(app.clone(), input).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["detail"]["error"], "invalid_input");
        assert!(body["detail"]["examples"].is_array());
    }
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn missing_configuration_fails_before_any_model_call() {
    let model = Arc::new(ScriptedModel::new());
    let response = post_plan(
        app_with(PlannerConfig::from_lookup(|_| None), model.clone()),
        THAI_REQUEST,
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "configuration_error");
    assert!(model.calls().is_empty());

    let key_only = PlannerConfig::from_lookup(|name| {
        (name == API_KEY_VAR).then(|| "test-key".to_string())
    });
    let response = post_plan(app_with(key_only, model.clone()), THAI_REQUEST).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn unparseable_plan_is_a_server_error_without_plan_fields() {
    let model = Arc::new(
        ScriptedModel::new().with_plan(ScriptedReply::Text("Sure! Here is your plan.".to_string())),
    );
    let response = post_plan(app_with(configured(), model), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "plan_parse_failed");
    assert!(body.get("plan").is_none());
}

#[tokio::test]
async fn fenced_text_plan_is_accepted_through_fallback() {
    let fenced = format!("```json\n{}\n```", sample_plan_json());
    let model = Arc::new(ScriptedModel::new().with_plan(ScriptedReply::Text(fenced)));
    let response = post_plan(app_with(configured(), model), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["plan"], sample_plan_json());
}

#[tokio::test]
async fn generation_transport_failure_is_bad_gateway() {
    let model = Arc::new(
        ScriptedModel::new().with_plan(ScriptedReply::Fail("upstream unavailable".to_string())),
    );
    let response = post_plan(app_with(configured(), model), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "model_error");
    assert!(body["detail"]["message"]
        .as_str()
        .is_some_and(|message| message.contains("upstream unavailable")));
}

#[tokio::test]
async fn classification_failure_is_bad_gateway() {
    let model = Arc::new(
        ScriptedModel::new().with_intent(ScriptedReply::Fail("quota exceeded".to_string())),
    );
    let response = post_plan(app_with(configured(), model.clone()), THAI_REQUEST).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["detail"]["error"], "classification_failed");
    assert_eq!(model.call_count(ReplyPurpose::Plan), 0);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));
    let huge = "x".repeat(70 * 1024);
    let response = app
        .oneshot(plan_request(json!({ "input": huge })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn metrics_reflect_outcomes() {
    let app = app_with(configured(), Arc::new(ScriptedModel::new()));
    post_plan(app.clone(), THAI_REQUEST).await;
    post_plan(app.clone(), "!!!???").await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["requests_total"], 2);
    assert_eq!(body["plans_generated_total"], 1);
    assert_eq!(body["rejected_invalid_total"], 1);
    assert_eq!(body["model_calls_total"], 2);
}
