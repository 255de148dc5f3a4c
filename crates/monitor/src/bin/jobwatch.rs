//! jobwatch: polls job sources and announces new postings.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use jobwatch_core::config::{load_dotenv, Config};
use jobwatch_monitor::compose::{build_monitor, build_notifiers, build_sources, open_store};
use jobwatch_notify::Dispatcher;

// ── CLI ─────────────────────────────────────────────────────────────

/// Watch job boards and notify about new postings.
#[derive(Parser, Debug)]
#[command(name = "jobwatch", version, about)]
struct Cli {
    /// Configuration profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "JOBWATCH_PROFILE")]
    profile: Option<String>,

    /// Keep seen links in memory only, leaving the jobs file untouched.
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor on a schedule until interrupted (default).
    Run,
    /// Run a single round and exit.
    Once,
    /// Fetch from every source and print the raw results without notifying.
    Probe,
    /// Send a test notification through every channel.
    TestNotify,
}

// ── Entry point ─────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = match cli.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.validate().context("invalid configuration")?;
    config.log_summary();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, cli.ephemeral).await,
        Command::Once => once(&config, cli.ephemeral).await,
        Command::Probe => probe(&config).await,
        Command::TestNotify => test_notify(&config).await,
    }
}

async fn run(config: &Config, ephemeral: bool) -> anyhow::Result<()> {
    let monitor = build_monitor(config, open_store(config, ephemeral)).await?;
    info!(channels = ?monitor.channel_names(), "jobwatch started");

    monitor.start().context("failed to start scheduler")?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl_c")?;
            info!("shutdown signal received, waiting for the current round");
        }
        err = monitor.fatal_error() => {
            monitor.shutdown().await;
            return Err(err).context("scheduler failed");
        }
    }

    monitor.shutdown().await;
    info!("jobwatch stopped");
    Ok(())
}

async fn once(config: &Config, ephemeral: bool) -> anyhow::Result<()> {
    let monitor = build_monitor(config, open_store(config, ephemeral)).await?;
    let report = monitor.check_and_notify().await;

    println!(
        "{} new job(s) from {} source(s), {} failed source(s), {} failed channel(s)",
        report.new_jobs.len(),
        report.sources_polled,
        report.failures.len(),
        report.failed_deliveries(),
    );
    if let Some(err) = report.store_error {
        warn!(error = %err, "new links were not persisted");
    }
    Ok(())
}

async fn probe(config: &Config) -> anyhow::Result<()> {
    let sources = build_sources(config)?;
    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    for source in &sources {
        match source.fetch().await {
            Ok(jobs) => {
                println!("{} returned {} posting(s):", source.name(), jobs.len());
                for job in &jobs {
                    println!("  {job}");
                }
            }
            Err(e) => println!("{} failed: {e}", source.name()),
        }
    }
    Ok(())
}

async fn test_notify(config: &Config) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(build_notifiers(config)?);
    let mut failed = 0;

    for (index, name) in dispatcher.channel_names().into_iter().enumerate() {
        match dispatcher.test_notify(index).await {
            Ok(()) => println!("{name}: ok"),
            Err(e) => {
                failed += 1;
                println!("{name}: FAILED ({e})");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} channel(s) failed the test notification");
    }
    Ok(())
}
