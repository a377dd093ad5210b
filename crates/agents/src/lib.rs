mod config;
mod error;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use planner_core::{
    build_plan_prompt, inspect_input, today_in_planner_timezone, GateDecision, GatePolicy,
    IntentLabel, IntentVerdict, Plan, PlanRequest,
};
use planner_model::{
    ClassifyError, GenerateError, GenerativeModel, IntentClassifier, PlanGenerator,
};
use planner_observability::{AppMetrics, RejectionKind};
use tracing::{debug, enabled, error, info, instrument, warn, Level};

pub use config::{
    ModelSelection, PlannerConfig, API_BASE_VAR, API_KEY_FALLBACK_VAR, API_KEY_VAR, BIND_VAR,
    CLASSIFIER_MODEL_VAR, DEFAULT_BIND, MODEL_VAR,
};
pub use error::PlanError;

const PROMPT_PREVIEW_CHARS: usize = 300;

/// Runs one plan request through sanitize, classify, gate, prompt and generate.
/// Holds no per-request state.
#[derive(Clone)]
pub struct PlannerAgent {
    config: Arc<PlannerConfig>,
    classifier: IntentClassifier,
    generator: PlanGenerator,
    gate: GatePolicy,
    metrics: Arc<AppMetrics>,
}

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub verdict: IntentVerdict,
    pub decision: GateDecision,
}

impl PlannerAgent {
    pub fn new(
        config: PlannerConfig,
        model: Arc<dyn GenerativeModel>,
        gate: GatePolicy,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier: IntentClassifier::new(model.clone()),
            generator: PlanGenerator::new(model),
            gate,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub async fn plan(&self, request_id: &str, request: &PlanRequest) -> Result<Plan, PlanError> {
        self.plan_at(request_id, request, Utc::now()).await
    }

    #[instrument(skip_all, fields(request_id = %request_id))]
    pub async fn plan_at(
        &self,
        request_id: &str,
        request: &PlanRequest,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanError> {
        self.metrics.inc_request();
        info!(input_len = request.input.chars().count(), "plan request received");

        let result = self.run_pipeline(request, now).await;
        match &result {
            Ok(_) => self.metrics.inc_plan_generated(),
            Err(err) if err.is_rejection() => {}
            Err(_) => self.metrics.inc_failure(),
        }
        result
    }

    async fn run_pipeline(
        &self,
        request: &PlanRequest,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanError> {
        let models = self.config.resolve_models().inspect_err(|err| {
            error!(error = %err, "planner is not configured");
        })?;

        let user_text = request.input.as_str();
        self.sanitize(user_text)?;

        let outcome = self.classify_with(&models.classifier_model, user_text).await?;
        self.enforce_gate(&outcome)?;

        let today = today_in_planner_timezone(now);
        let prompt = build_plan_prompt(user_text, today, request.language());
        debug!(today = %today, language = request.language().unwrap_or("auto"), "plan prompt built");
        if enabled!(Level::DEBUG) {
            let preview = prompt
                .chars()
                .take(PROMPT_PREVIEW_CHARS)
                .collect::<String>()
                .replace('\n', " ");
            debug!(prompt_len = prompt.len(), preview = %preview, "plan prompt preview");
        }

        self.generate_with(&models.plan_model, prompt).await
    }

    /// Classifier and gate only; the CLI uses this to explain decisions.
    pub async fn classify(&self, text: &str) -> Result<GateOutcome, PlanError> {
        let models = self.config.resolve_models()?;
        self.classify_with(&models.classifier_model, text).await
    }

    fn sanitize(&self, user_text: &str) -> Result<(), PlanError> {
        let verdict = inspect_input(user_text);
        if verdict.is_valid() {
            return Ok(());
        }
        info!(rule = verdict.as_str(), "rejected: probable gibberish or too short");
        self.metrics.inc_rejection(RejectionKind::InvalidInput);
        Err(PlanError::InvalidInput(verdict))
    }

    async fn classify_with(&self, model: &str, text: &str) -> Result<GateOutcome, PlanError> {
        let started = Instant::now();
        let result = self.classifier.classify(model, text).await;
        let elapsed = started.elapsed();
        self.metrics.observe_model_call(elapsed);

        let decoded = result.map_err(|err: ClassifyError| {
            error!(
                error = %err,
                model,
                elapsed_ms = elapsed.as_millis() as u64,
                "intent classification failed"
            );
            PlanError::Classification(err)
        })?;
        if decoded.used_fallback() {
            self.metrics.inc_fallback_parse();
        }

        let verdict = decoded.into_inner();
        let decision = self.gate.evaluate(&verdict);
        info!(
            intent = verdict.intent.as_str(),
            confidence = verdict.confidence,
            reason = %verdict.reason,
            decision = ?decision,
            elapsed_ms = elapsed.as_millis() as u64,
            "intent classified"
        );

        Ok(GateOutcome { verdict, decision })
    }

    fn enforce_gate(&self, outcome: &GateOutcome) -> Result<(), PlanError> {
        let verdict = &outcome.verdict;
        match outcome.decision {
            GateDecision::Proceed => {
                if verdict.intent == IntentLabel::Incomplete {
                    info!(
                        confidence = verdict.confidence,
                        threshold = self.gate.incomplete_threshold(),
                        "confident INCOMPLETE verdict passed to planning"
                    );
                }
                Ok(())
            }
            GateDecision::RejectUnsafe => {
                warn!(reason = %verdict.reason, "rejected: unsafe content");
                self.metrics.inc_rejection(RejectionKind::Unsafe);
                Err(PlanError::UnsafeContent {
                    reason: verdict.reason.clone(),
                })
            }
            GateDecision::RejectIncomplete => {
                info!(
                    intent = verdict.intent.as_str(),
                    reason = %verdict.reason,
                    "rejected: not plannable"
                );
                self.metrics.inc_rejection(RejectionKind::NotPlannable);
                Err(PlanError::NotPlannable {
                    intent: verdict.intent,
                    reason: verdict.reason.clone(),
                })
            }
        }
    }

    async fn generate_with(&self, model: &str, prompt: String) -> Result<Plan, PlanError> {
        info!(model, "calling plan model");
        let started = Instant::now();
        let result = self.generator.generate(model, prompt).await;
        let elapsed = started.elapsed();
        self.metrics.observe_model_call(elapsed);

        let decoded = match result {
            Ok(decoded) => decoded,
            Err(GenerateError::Model(err)) => {
                error!(error = %err, elapsed_ms = elapsed.as_millis() as u64, "plan model call failed");
                return Err(PlanError::Generation(err));
            }
            Err(GenerateError::Decode(err)) => {
                error!(error = %err, "failed to parse plan reply");
                return Err(PlanError::PlanParse(err));
            }
        };

        if decoded.used_fallback() {
            warn!("plan reply had no structured output, decoded from text");
            self.metrics.inc_fallback_parse();
        }
        let plan = decoded.into_inner();
        info!(
            task_name = %plan.task_name,
            subtasks = plan.subtasks.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "plan generated"
        );

        for issue in plan.inspect() {
            warn!(issue = %issue, "plan passed through with contract issue");
        }
        debug!(start_date = %plan.start_date, end_date = %plan.end_date, "plan dates");

        Ok(plan)
    }
}
