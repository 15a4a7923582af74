use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coordination::{Priority, TicketClassifier, TicketInput};
use support_agents::config::{check_endpoint, SupportConfig};
use support_agents::orchestrator::{Orchestrator, ProcessError, ProcessOutcome};
use support_agents::samples::sample_tickets;
use support_agents::telemetry::BatchSummary;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "support-agents", about = "Support ticket triage: classify, draft, review, escalate")]
struct Cli {
    /// TOML file overriding environment defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a single ticket
    Process {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "normal", value_parser = parse_priority)]
        priority: Priority,
        #[arg(long)]
        customer: Option<String>,
    },
    /// Process a JSON array of tickets
    Batch {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Classify a ticket without drafting
    Classify {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
    },
    /// Run the built-in sample tickets
    Samples,
    /// Check the generation endpoint
    Health,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s).ok_or_else(|| format!("unknown priority '{s}' (low, normal, high, urgent)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SupportConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Process {
            subject,
            description,
            priority,
            customer,
        } => {
            let orchestrator = Orchestrator::from_config(&config).await?;
            let input = TicketInput {
                priority,
                customer_id: customer,
                ..TicketInput::new(subject, description)
            };
            let outcome = orchestrator.process(input).await?;
            print_outcome(&outcome, cli.json)?;
        }
        Command::Batch { file, concurrency } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let inputs: Vec<TicketInput> = serde_json::from_str(&text)
                .with_context(|| format!("Invalid ticket file {}", file.display()))?;
            let orchestrator = Orchestrator::from_config(&config).await?;
            let concurrency = concurrency.unwrap_or(config.batch_concurrency);
            info!(tickets = inputs.len(), concurrency, "Batch starting");
            let results = orchestrator.process_batch(inputs, concurrency).await;
            print_results(&results, cli.json)?;
        }
        Command::Classify {
            subject,
            description,
        } => {
            let result = TicketClassifier::with_config(config.classifier.clone())
                .classify(&subject, &description);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.summary());
                println!("{}", result.reasoning);
            }
        }
        Command::Samples => {
            let orchestrator = Orchestrator::from_config(&config).await?;
            let results = orchestrator
                .process_batch(sample_tickets(), config.batch_concurrency)
                .await;
            print_results(&results, cli.json)?;
        }
        Command::Health => {
            let ok = check_endpoint(&config.llm.url, config.llm.api_key.as_deref()).await;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "endpoint": config.llm.url, "reachable": ok })
                );
            } else {
                println!(
                    "{} {}",
                    config.llm.url,
                    if ok { "reachable" } else { "UNREACHABLE" }
                );
            }
            if !ok {
                anyhow::bail!("generation endpoint {} is not reachable", config.llm.url);
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ProcessOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    println!(
        "{} [{}] {} (confidence {:.2}) after {} attempt(s)",
        outcome.ticket_id, outcome.status, outcome.category, outcome.confidence, outcome.attempts
    );
    if !outcome.is_resolved() && !outcome.escalation_recorded {
        println!("warning: escalation record was not persisted");
    }
    println!("\n{}\n", outcome.final_response_or_escalation_message);
    Ok(())
}

fn print_results(results: &[Result<ProcessOutcome, ProcessError>], json: bool) -> Result<()> {
    let summary = BatchSummary::from_results(results);
    summary.log();
    if json {
        let outcomes: Vec<serde_json::Value> = results
            .iter()
            .map(|r| match r {
                Ok(outcome) => serde_json::to_value(outcome),
                Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
            })
            .collect::<Result<_, _>>()?;
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "summary": summary,
                "outcomes": outcomes,
            }))?
        );
        return Ok(());
    }
    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(outcome) => print_outcome(outcome, false)?,
            Err(e) => warn!(index, error = %e, "Ticket rejected"),
        }
    }
    println!(
        "{} tickets: {} resolved, {} escalated, {} cancelled, {} rejected",
        summary.total, summary.resolved, summary.escalated, summary.cancelled, summary.rejected_inputs
    );
    Ok(())
}
