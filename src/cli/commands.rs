//! CLI command definitions for parley.
//!
//! The `run` command drives a full automated debate: panel responses,
//! validation, auto-accept of valid claims, and context-carryover restarts
//! up to the round ceiling, ending in a rendered report.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::agents::{AgentProfile, PanelRole};
use crate::context::{ContextManager, RestartOptions};
use crate::flow::{FlowEvent, FlowOrchestrator};
use crate::llm::UnifiedAiClient;
use crate::report::ReportBuilder;
use crate::round::{DebateRound, RoundAction, RoundTracker, DEFAULT_MAX_ROUNDS};
use crate::session::SessionRegistry;

/// Default model to use for generation.
const DEFAULT_MODEL: &str = "anthropic/claude-opus-4.5";

/// Multi-agent debate engine with validator review and context carryover.
#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Run multi-agent AI debates with iterative context carryover")]
#[command(version)]
#[command(
    long_about = "parley poses a question to a panel of AI agents, validates the claims in their responses, folds accepted claims into an enhanced prompt, and restarts the panel for another round.\n\nExample usage:\n  parley run \"Should AI replace teachers?\" --rounds 3 --api-key sk-..."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run an automated debate session end to end.
    Run(RunArgs),

    /// List the built-in panel roles.
    Roles,
}

/// Arguments for `parley run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The question to debate.
    pub question: String,

    /// Number of rounds to run (also the round ceiling).
    #[arg(short, long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub rounds: u32,

    /// LLM model to use.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature for panel responses.
    #[arg(short, long, default_value = "0.7")]
    pub temperature: f64,

    /// API key (can also be set via PARLEY_API_KEY env var).
    #[arg(long, env = "PARLEY_API_KEY")]
    pub api_key: Option<String>,

    /// API base URL for an OpenAI-compatible endpoint
    /// (can also be set via PARLEY_API_BASE env var).
    #[arg(long, env = "PARLEY_API_BASE")]
    pub api_base: Option<String>,

    /// Comma-separated panel roles to include
    /// (proponent, skeptic, analyst, synthesizer).
    #[arg(long)]
    pub panel: Option<String>,

    /// Include rejected points in the final report.
    #[arg(long)]
    pub include_rejected: bool,

    /// Write the final flow context as JSON to this path.
    #[arg(long)]
    pub export: Option<String>,
}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the CLI with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Roles => {
            list_roles();
            Ok(())
        }
    }
}

/// Prints the built-in panel roles.
fn list_roles() {
    for role in PanelRole::panel() {
        println!("{:<12} {}", role.display_name(), role.description());
    }
    println!(
        "{:<12} {} (runs after the panel)",
        PanelRole::Validator.display_name(),
        PanelRole::Validator.description()
    );
}

/// Resolves the roster from the --panel argument.
fn resolve_roster(panel: Option<&str>) -> anyhow::Result<Vec<AgentProfile>> {
    let Some(panel) = panel else {
        return Ok(AgentProfile::system_panel());
    };

    let mut roster = Vec::new();
    for name in panel.split(',') {
        let role = match name.trim().to_lowercase().as_str() {
            "proponent" => PanelRole::Proponent,
            "skeptic" => PanelRole::Skeptic,
            "analyst" => PanelRole::Analyst,
            "synthesizer" => PanelRole::Synthesizer,
            other => anyhow::bail!("unknown panel role: {}", other),
        };
        roster.push(AgentProfile::new(role.display_name(), role));
    }
    Ok(roster)
}

/// Builds the LLM client from CLI arguments and environment.
fn build_client(args: &RunArgs) -> anyhow::Result<UnifiedAiClient> {
    match (&args.api_base, &args.api_key) {
        (Some(base), key) => Ok(UnifiedAiClient::new(
            base.clone(),
            key.clone(),
            args.model.clone(),
        )),
        (None, Some(key)) => Ok(UnifiedAiClient::new_with_defaults(key.clone())),
        (None, None) => UnifiedAiClient::from_env()
            .context("set PARLEY_API_BASE/PARLEY_API_KEY or pass --api-base/--api-key"),
    }
}

/// Runs one automated debate session.
async fn run_session(args: RunArgs) -> anyhow::Result<()> {
    let client = Arc::new(build_client(&args)?);
    let roster = resolve_roster(args.panel.as_deref())?;
    let agent_ids: Vec<String> = roster.iter().map(|a| a.id.clone()).collect();

    let orchestrator = FlowOrchestrator::builder()
        .provider(client.clone())
        .model(args.model.clone())
        .temperature(args.temperature)
        .max_rounds(args.rounds)
        .build()?;

    let session_id = SessionRegistry::generate_session_id();
    let mut manager = ContextManager::new();
    let mut tracker = RoundTracker::new(args.rounds);
    let mut rounds: Vec<DebateRound> = Vec::new();

    let (event_tx, mut event_rx) = mpsc::channel::<FlowEvent>(64);
    let event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                FlowEvent::RoundStarted { round, agent_count, .. } => {
                    info!(round, agents = agent_count, "round started");
                }
                FlowEvent::AgentResponded { agent_name, response_time_ms, .. } => {
                    info!(agent = %agent_name, ms = response_time_ms, "agent responded");
                }
                FlowEvent::ValidationCompleted { claim_count, .. } => {
                    info!(claims = claim_count, "validation completed");
                }
                FlowEvent::RoundCompleted { round, duration_ms, .. } => {
                    info!(round, duration_ms, "round completed");
                }
                FlowEvent::FlowError { error, .. } => {
                    warn!(%error, "flow error");
                }
            }
        }
    });

    let mut prompt = args.question.clone();

    loop {
        let round_number = tracker.current_round();
        let mut record = DebateRound::new(round_number, session_id.as_str(), prompt.as_str());

        let run = orchestrator
            .run_round(&prompt, &roster, round_number, &event_tx)
            .await?;
        record.complete();
        rounds.push(record);

        let context =
            manager.process_validation_data(&run.raw_results, &args.question, &agent_ids);
        info!(
            iteration = context.iteration_count,
            kept = context.kept_points.len(),
            removed = context.removed_points.len(),
            "context updated"
        );

        let accepted: HashSet<String> = context
            .kept_points
            .iter()
            .map(|p| p.id.clone())
            .collect();
        if accepted.is_empty() {
            warn!("no claims survived validation; stopping early");
            break;
        }

        let action = if tracker.can_advance() {
            RoundAction::NextRound
        } else {
            RoundAction::GenerateReport
        };

        match tracker.submit_round_feedback("", accepted, action)? {
            crate::round::RoundOutcome::Advance { .. } => {
                let restart = manager.prepare_flow_restart(RestartOptions::default())?;
                prompt = restart.enhanced_prompt;
            }
            crate::round::RoundOutcome::Terminate { final_round, .. } => {
                info!(final_round, "debate terminated into report");
                break;
            }
        }
    }

    drop(event_tx);
    event_task.await.ok();

    let context = manager
        .current_context()
        .cloned()
        .context("no rounds completed")?;

    if let Some(path) = &args.export {
        fs::write(path, manager.export_context()?)
            .with_context(|| format!("failed to write export to {}", path))?;
        info!(path = %path, "context exported");
    }

    let report = ReportBuilder::new()
        .with_rejected(args.include_rejected)
        .render(&context, &rounds);
    println!("{}", report);

    let stats = manager.stats();
    info!(
        iterations = stats.total_iterations,
        kept = stats.total_kept_points,
        removed = stats.total_removed_points,
        "session finished"
    );

    Ok(())
}
