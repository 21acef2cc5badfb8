//! Conduit runner
//!
//! Hosts the services listed in a TOML configuration and feeds them JSON
//! command lines, one report line per command on stdout.
//!
//! Usage:
//!   conduit-runner --config services.toml --commands commands.jsonl
//!   cat commands.jsonl | conduit-runner --config services.toml

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use conduit_runner::{Host, RunnerConfig, run_commands};
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "conduit-runner")]
#[command(about = "Hosts Conduit services and feeds them JSON-line commands")]
struct Args {
    /// Path to the TOML service configuration
    #[arg(short, long)]
    config: PathBuf,

    /// File of JSON command lines (reads stdin when omitted)
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = RunnerConfig::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let host = Host::from_config(&config)?;
    info!(services = config.services.len(), "Conduit runner starting");

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.commands {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let cancel = CancellationToken::new();
    host.start_all(&cancel).await?;
    let outcome = run_commands(&host, reader, tokio::io::stdout()).await;

    host.stop_all(&cancel).await;
    let processed = outcome?;
    info!(processed, "Conduit runner finished");
    Ok(())
}
