use anyhow::{Context, Result};
use planner_agents::PlannerConfig;
use planner_api::build_app;
use planner_observability::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("planner_api");

    let config = PlannerConfig::from_env();
    if let Err(err) = config.resolve_models() {
        warn!(error = %err, "plan requests will fail until configuration is complete");
    }
    let bind = config.bind.clone();
    info!(config = ?config, "configuration loaded");

    let app = build_app(config)?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(bind = %bind, "task planner api started");

    axum::serve(listener, app).await?;
    info!("task planner api stopped");
    Ok(())
}
