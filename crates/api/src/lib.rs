use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use planner_agents::{PlanError, PlannerAgent, PlannerConfig};
use planner_core::{GatePolicy, PlanRequest, PlanResponse};
use planner_model::{GeminiModel, GenerativeModel};
use planner_observability::AppMetrics;
use reqwest::Client;
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const PROCESS_TIME_HEADER: HeaderName = HeaderName::from_static("x-process-time-ms");
const MAX_BODY_BYTES: usize = 64 * 1024;
const REQUEST_ID_LEN: usize = 8;
const MAX_CLIENT_REQUEST_ID_LEN: usize = 64;

const INVALID_INPUT_MESSAGE: &str =
    "คำขอไม่ชัดเจน กรุณาอธิบายสิ่งที่อยากให้วางแผน พร้อมช่วงเวลา/เดดไลน์คร่าว ๆ";
const INVALID_INPUT_EXAMPLES: [&str; 4] = [
    "ช่วยวางแผนเตรียมพรีเซนต์ยอดขายประจำสัปดาห์ จะพรีเซนต์วันศุกร์นี้",
    "วางแผนอ่านหนังสือสอบวิชาคณิต ภายใน 10 วัน",
    "ช่วยจัดตารางออกกำลังกาย 4 สัปดาห์ เน้นลดไขมัน",
    "Plan my move to a new apartment by the end of next month",
];
const UNSAFE_MESSAGE: &str = "คำขอของคุณมีเนื้อหาที่ไม่เหมาะสมและไม่สามารถดำเนินการได้";
const NOT_PLANNABLE_MESSAGE: &str =
    "คำขอยังไม่ชัดเจนพอสำหรับการวางแผน กรุณาระบุเป้าหมายและกรอบเวลา";
const NOT_PLANNABLE_HINTS: [&str; 3] = [
    "เป้าหมาย/หัวข้อที่ต้องการวางแผนคืออะไร",
    "กรอบเวลาเริ่ม–สิ้นสุด หรือเดดไลน์",
    "เงื่อนไข/ข้อจำกัดสำคัญ (เช่น งบประมาณ, ทรัพยากร, ช่องทาง)",
];

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<PlannerAgent>,
    pub metrics: Arc<AppMetrics>,
}

impl ApiState {
    pub fn new(config: PlannerConfig, model: Arc<dyn GenerativeModel>) -> Self {
        let metrics = AppMetrics::shared();
        let agent = PlannerAgent::new(config, model, GatePolicy::default(), metrics.clone());
        Self {
            agent: Arc::new(agent),
            metrics,
        }
    }
}

/// Correlation ids are the first eight hex characters of a v4 uuid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortRequestId;

impl MakeRequestId for ShortRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id[..REQUEST_ID_LEN])
            .ok()
            .map(RequestId::new)
    }
}

pub fn build_app(config: PlannerConfig) -> Result<Router> {
    let http = Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let model = GeminiModel::new(http, config.api_base.clone(), config.api_key.clone());
    info!(backend = model.backend_name(), api_base = %config.api_base, "model backend ready");

    Ok(build_router(ApiState::new(config, Arc::new(model))))
}

pub fn build_router(state: ApiState) -> Router {
    with_service_layers(api_routes().with_state(state))
}

pub fn api_routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/plan", post(plan))
}

/// Correlation ids, access log, panic handling, tracing and the body limit.
pub fn with_service_layers(router: Router) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(access_log_middleware))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, ShortRequestId))
        .layer(middleware::from_fn(drop_unusable_request_id))
}

async fn root() -> impl IntoResponse {
    tracing::debug!("root called");
    Json(json!({ "status": "Hello" }))
}

async fn health() -> impl IntoResponse {
    tracing::debug!("health check called");
    Json(json!({ "status": "ok" }))
}

async fn metrics_snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics.snapshot()))
}

async fn plan(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<PlanRequest>,
) -> Response {
    let request_id = request_id_from(&headers);
    match state.agent.plan(&request_id, &request).await {
        Ok(plan) => (StatusCode::OK, Json(PlanResponse { plan })).into_response(),
        Err(err) => plan_error_response(&err),
    }
}

pub fn plan_error_response(err: &PlanError) -> Response {
    let (status, detail) = error_detail(err);
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn error_detail(err: &PlanError) -> (StatusCode, Value) {
    let code = err.code();
    match err {
        PlanError::Configuration(var) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": code,
                "message": format!("Missing {var} environment variable"),
            }),
        ),
        PlanError::InvalidInput(verdict) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": code,
                "message": INVALID_INPUT_MESSAGE,
                "rule": verdict.as_str(),
                "examples": INVALID_INPUT_EXAMPLES,
            }),
        ),
        PlanError::UnsafeContent { reason } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": code,
                "message": UNSAFE_MESSAGE,
                "classifier_reason": reason,
            }),
        ),
        PlanError::NotPlannable { reason, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": code,
                "message": NOT_PLANNABLE_MESSAGE,
                "classifier_reason": reason,
                "hints": NOT_PLANNABLE_HINTS,
            }),
        ),
        PlanError::Classification(_) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": code, "message": "Intent classification failed" }),
        ),
        PlanError::Generation(source) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": code, "message": format!("Gemini API error: {source}") }),
        ),
        PlanError::PlanParse(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": code,
                "message": "Failed to parse model response into the plan schema",
            }),
        ),
    }
}

fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn is_usable_request_id(value: &HeaderValue) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_CLIENT_REQUEST_ID_LEN
        && bytes
            .iter()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_'))
}

/// Client ids that are too long or carry odd bytes are replaced with a fresh one.
async fn drop_unusable_request_id(mut request: Request<Body>, next: Next) -> Response {
    let unusable = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .is_some_and(|value| !is_usable_request_id(value));
    if unusable {
        request.headers_mut().remove(REQUEST_ID_HEADER);
    }
    next.run(request).await
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(panic = %message, "✖ unhandled error in handler");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "detail": {
                "error": "internal_error",
                "message": "Internal Server Error",
            }
        })),
    )
        .into_response()
}

async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    info!(request_id = %request_id, method = %method, path = %path, "▶ request");

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms:.1}")) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    let status = response.status().as_u16();
    if response.status().is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            "✖ request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            "◀ response"
        );
    }

    response
}
