#![forbid(unsafe_code)]

//! `research-outreach` — one scheduled outreach run.
//!
//! Loads configuration, processes the next window of contacts, persists the
//! checkpoint and prints a one-line summary. Intended to be triggered once a
//! day by an external scheduler; concurrent runs against the same checkpoint
//! are not supported.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use research_outreach::dispatch::SmtpDispatcher;
use research_outreach::generator::OpenAiGenerator;
use research_outreach::persistence::JsonCheckpointStore;
use research_outreach::profile::ProfileDocument;
use research_outreach::sources::SheetsContactSource;
use research_outreach::{AppError, BatchRunner, OutreachConfig, Result, RunSettings};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "research-outreach", about = "Send the next batch of outreach emails", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults to `outreach.toml` when present).
    #[arg(long, env = "OUTREACH_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, env = "OUTREACH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("research-outreach run starting");

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = OutreachConfig::load(args.config.as_deref())?;
    config.load_credentials().await?;
    info!("configuration loaded");

    // ── Prepare collaborators ───────────────────────────
    let store = JsonCheckpointStore::new(config.checkpoint_path.clone());
    store.prepare()?;
    let profile = ProfileDocument::load(&config)?;
    let source = SheetsContactSource::new(&config)?;
    let generator = OpenAiGenerator::new(&config.generator)?;
    let dispatcher = SmtpDispatcher::new(&config.smtp)?;

    // ── Run ─────────────────────────────────────────────
    let runner = BatchRunner::new(
        &source,
        &generator,
        &dispatcher,
        &store,
        &profile,
        RunSettings::from_config(&config),
    );
    let report = runner.run().await?;

    println!(
        "Sent {} emails. Next start index: {}",
        report.sent, report.next_index
    );
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
