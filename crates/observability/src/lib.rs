use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InvalidInput,
    Unsafe,
    NotPlannable,
}

impl RejectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Unsafe => "unsafe_content",
            Self::NotPlannable => "not_plannable",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    plans_generated_total: AtomicU64,
    rejected_invalid_total: AtomicU64,
    rejected_unsafe_total: AtomicU64,
    rejected_not_plannable_total: AtomicU64,
    failures_total: AtomicU64,
    fallback_parses_total: AtomicU64,
    model_calls_total: AtomicU64,
    model_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub plans_generated_total: u64,
    pub rejected_invalid_total: u64,
    pub rejected_unsafe_total: u64,
    pub rejected_not_plannable_total: u64,
    pub failures_total: u64,
    pub fallback_parses_total: u64,
    pub model_calls_total: u64,
    pub avg_model_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        counter!("planner_requests_total").increment(1);
    }

    pub fn inc_plan_generated(&self) {
        self.plans_generated_total.fetch_add(1, Ordering::Relaxed);
        counter!("planner_plans_generated_total").increment(1);
    }

    pub fn inc_rejection(&self, kind: RejectionKind) {
        let slot = match kind {
            RejectionKind::InvalidInput => &self.rejected_invalid_total,
            RejectionKind::Unsafe => &self.rejected_unsafe_total,
            RejectionKind::NotPlannable => &self.rejected_not_plannable_total,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        counter!("planner_rejections_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn inc_failure(&self) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
        counter!("planner_failures_total").increment(1);
    }

    pub fn inc_fallback_parse(&self) {
        self.fallback_parses_total.fetch_add(1, Ordering::Relaxed);
        counter!("planner_fallback_parses_total").increment(1);
    }

    pub fn observe_model_call(&self, duration: Duration) {
        self.model_calls_total.fetch_add(1, Ordering::Relaxed);
        self.model_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        counter!("planner_model_calls_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let calls = self.model_calls_total.load(Ordering::Relaxed);
        let latency = self.model_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            plans_generated_total: self.plans_generated_total.load(Ordering::Relaxed),
            rejected_invalid_total: self.rejected_invalid_total.load(Ordering::Relaxed),
            rejected_unsafe_total: self.rejected_unsafe_total.load(Ordering::Relaxed),
            rejected_not_plannable_total: self
                .rejected_not_plannable_total
                .load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            fallback_parses_total: self.fallback_parses_total.load(Ordering::Relaxed),
            model_calls_total: calls,
            avg_model_latency_millis: if calls == 0 {
                0.0
            } else {
                latency as f64 / calls as f64
            },
        }
    }
}

/// `RUST_LOG` wins; otherwise `LOG_LEVEL` applies to the planner crates.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

fn default_directives(service_name: &str) -> String {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| match value.trim().to_lowercase().as_str() {
            "trace" => Some("trace"),
            "debug" => Some("debug"),
            "info" => Some("info"),
            "warn" | "warning" => Some("warn"),
            "error" | "critical" => Some("error"),
            _ => None,
        })
        .unwrap_or("info");

    format!(
        "{service_name}={level},planner_api={level},planner_agents={level},planner_model={level},tower_http=info"
    )
}
