use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use planner_agents::{PlannerAgent, PlannerConfig};
use planner_core::{
    build_plan_prompt, inspect_input, today_in_planner_timezone, GatePolicy, PlanRequest,
    PlanResponse,
};
use planner_model::GeminiModel;
use planner_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "planner")]
#[command(about = "Task planner CLI")]
struct Cli {
    /// Overrides GEMINI_MODEL for this run.
    #[arg(long, env = "GEMINI_MODEL", global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run only the input sanitizer.
    Check { text: String },
    /// Print the planning prompt without calling a model.
    Prompt {
        text: String,
        #[arg(long)]
        language: Option<String>,
        /// Defaults to today in the planner timezone.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Classify the text and show the gate decision.
    Classify { text: String },
    /// Run the full pipeline and print the plan.
    Plan {
        text: String,
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("planner_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Check { text } => {
            let verdict = inspect_input(&text);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "valid": verdict.is_valid(),
                    "verdict": verdict,
                }))?
            );
        }
        Command::Prompt {
            text,
            language,
            date,
        } => {
            let today = date.unwrap_or_else(|| today_in_planner_timezone(Utc::now()));
            println!("{}", build_plan_prompt(&text, today, language.as_deref()));
        }
        Command::Classify { text } => {
            let agent = build_agent(cli.model)?;
            let outcome = agent.classify(&text).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "verdict": outcome.verdict,
                    "decision": outcome.decision,
                    "proceeds": outcome.decision.proceeds(),
                }))?
            );
        }
        Command::Plan { text, language } => {
            let agent = build_agent(cli.model)?;
            let request = PlanRequest {
                input: text,
                target_language: language,
            };
            let plan = agent.plan("cli", &request).await?;
            println!("{}", serde_json::to_string_pretty(&PlanResponse { plan })?);
        }
    }

    Ok(())
}

fn build_agent(model_override: Option<String>) -> Result<PlannerAgent> {
    let mut config = PlannerConfig::from_env();
    if let Some(model) = model_override.filter(|value| !value.trim().is_empty()) {
        config.model = Some(model);
    }
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let model = GeminiModel::new(http, config.api_base.clone(), config.api_key.clone());

    Ok(PlannerAgent::new(
        config,
        Arc::new(model),
        GatePolicy::default(),
        AppMetrics::shared(),
    ))
}
