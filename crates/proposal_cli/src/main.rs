//! Command-line probe over `proposal_core`.
//!
//! # Responsibility
//! - Verify core crate wiring and gateway configuration from a terminal.
//! - Keep output deterministic and line-oriented for scripting.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use proposal_core::engine::status;
use proposal_core::engine::urgency;
use proposal_core::util::format::{format_date, relative_days, to_snake_case, to_title_case};
use proposal_core::{
    CoreConfig, PersistenceGateway, ProposalService, ProposalsApi, QueueClient, QueueJob,
    SqliteStore, SystemClock,
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "proposal-cli", version, about = "Proposal tracking core probe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage and version.
    Ping,
    /// Classify a due date (RFC 3339) into an urgency tier.
    Classify {
        due: String,
        /// Reference instant; defaults to the current time.
        #[arg(long)]
        now: Option<String>,
        /// Report past-due dates as `overdue` instead of `critical`.
        #[arg(long)]
        overdue: bool,
    },
    /// Show lifecycle metadata for a status label.
    Status { label: String },
    /// Probe the configured queue endpoint.
    QueueCheck,
    /// Enqueue one job with a JSON payload; the type is normalized to
    /// snake_case (`"Proposal Analysis"` -> `proposal_analysis`).
    Enqueue {
        #[arg(long = "type")]
        job_type: String,
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// List proposals from the API, or show one by id.
    Proposals {
        #[arg(long)]
        id: Option<String>,
    },
    /// Print locally stored proposals in board order.
    Board,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables may come from the shell.
    let _ = dotenv::dotenv();
    let config = CoreConfig::from_env();
    if let Err(err) = proposal_core::init_from_config(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let cli = Cli::parse();
    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("event=cli_command module=cli status=error");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &CoreConfig) -> Result<(), String> {
    match command {
        Command::Ping => {
            println!("proposal_core ping={}", proposal_core::ping());
            println!("proposal_core version={}", proposal_core::core_version());
        }
        Command::Classify { due, now, overdue } => {
            let now = match now {
                Some(raw) => parse_instant(&raw)?,
                None => Utc::now(),
            };
            let due = parse_instant(&due).ok();
            let tier = if overdue {
                urgency::classify_with_overdue(due, now)
            } else {
                urgency::classify(due, now)
            };
            println!(
                "urgency={} label={}",
                tier.as_str(),
                to_title_case(tier.as_str())
            );
            if let Some(due) = due {
                println!("due={}", format_date(due));
                println!(
                    "relative={}",
                    relative_days(urgency::days_until_due(due, now))
                );
            }
        }
        Command::Status { label } => {
            let style = status::style(&label);
            println!("rank={}", status::order(&label));
            println!("display_name={}", status::display_name(&label));
            println!("color={} border_color={}", style.color, style.border_color);
            println!(
                "next={}",
                status::next(&label).map_or("none", |next| next.as_str())
            );
            println!(
                "previous={}",
                status::previous(&label).map_or("none", |previous| previous.as_str())
            );
        }
        Command::QueueCheck => {
            let client = QueueClient::new(config.queue.clone());
            let connectivity = client.check_connectivity().await;
            println!(
                "ok={} status={} status_text={}",
                connectivity.ok, connectivity.status, connectivity.status_text
            );
        }
        Command::Enqueue { job_type, payload } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)
                .map_err(|err| format!("payload is not valid JSON: {err}"))?;
            let job = QueueJob::new(to_snake_case(&job_type), payload, Utc::now());
            let client = QueueClient::new(config.queue.clone());
            client
                .enqueue(std::slice::from_ref(&job))
                .await
                .map_err(|err| err.to_string())?;
            println!("enqueued={}", job.id);
        }
        Command::Proposals { id } => {
            let api = ProposalsApi::new(&config.api);
            let now = Utc::now();
            let proposals = match id {
                Some(id) => vec![api.get_proposal(&id).await.map_err(|err| err.to_string())?],
                None => api.list_proposals().await.map_err(|err| err.to_string())?,
            };
            for proposal in proposals {
                println!(
                    "{}\t{}\t{}\t{}",
                    proposal.id,
                    status::display_name(&proposal.status),
                    proposal.urgency(now).as_str(),
                    proposal.title
                );
            }
        }
        Command::Board => {
            let store = SqliteStore::open_configured(config.db_path.as_deref())
                .map_err(|err| err.to_string())?;
            let service = ProposalService::load(
                Arc::new(PersistenceGateway::new(store)),
                Arc::new(SystemClock),
            );
            // Read-only: urgency is classified for display, not written back.
            let now = Utc::now();
            for proposal in service.board() {
                println!(
                    "{}\t{}\t{}\t{}%\t{}",
                    proposal.id,
                    proposal.status.display_name(),
                    urgency::classify(proposal.due_date, now).as_str(),
                    proposal.progress_percent(),
                    proposal.title
                );
            }
        }
    }
    Ok(())
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("`{raw}` is not an RFC 3339 timestamp: {err}"))
}
