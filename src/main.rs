//! Market Creator — Entry Point
//!
//! Runs an interactive market-creation session on stdin/stdout.
//! Each input line is one command; after every command the current
//! draft view is printed as a single JSON line. Logs go to stderr.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Spawn the parameters refresher (watch channel snapshots)
//! 4. Build the draft controller from config + tag catalog
//! 5. Read commands until EOF, `quit` or SIGINT
//! 6. Signal shutdown and wait for the refresher to stop

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use market_creator::adapters::parameters::FileParametersSource;
use market_creator::adapters::submission::DryRunSubmitter;
use market_creator::config;
use market_creator::usecases::{
    submit_draft, DraftCommand, MarketDraftController, ParametersRefresher,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        tags = config.tags.catalog.len(),
        "Starting market creator"
    );

    // ── 3. Shutdown signal + parameters refresher ───────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    let source = Arc::new(FileParametersSource::new(&config.parameters.source_path));
    let (refresher, parameters_rx) = ParametersRefresher::new(
        source,
        config.parameters.multipliers(),
        Duration::from_millis(config.parameters.refresh_interval_ms),
    );
    let refresher_shutdown = shutdown_tx.subscribe();
    let refresher_handle = tokio::spawn(async move {
        if let Err(e) = refresher.run(refresher_shutdown).await {
            error!(error = %e, "Parameters refresher failed");
        }
    });

    // ── 4. Draft controller + submitter ─────────────────────
    let mut controller = MarketDraftController::new(
        &config.draft,
        Arc::new(config.tags.catalog()),
        parameters_rx,
        Utc::now(),
    );
    let submitter = DryRunSubmitter::new();

    // ── 5. Command session ──────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    emit(&mut stdout, &controller.view(Utc::now())).await?;

    loop {
        let line = tokio::select! {
            _ = signal::ctrl_c() => {
                info!("SIGINT received, ending session");
                break;
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            info!("stdin closed, ending session");
            break;
        };

        let now = Utc::now();
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "show" => {}
            "tags" => {
                emit(&mut stdout, &controller.available_tags()).await?;
                continue;
            }
            "reset" => controller.reset(now),
            "submit" => match submit_draft(&mut controller, &submitter, now).await {
                Ok(receipt) => {
                    emit(&mut stdout, &receipt).await?;
                }
                Err(e) => emit(&mut stdout, &Rejection::new(&e)).await?,
            },
            _ => match line.parse::<DraftCommand>() {
                Ok(command) => {
                    if let Err(e) = controller.apply(command, now) {
                        emit(&mut stdout, &Rejection::new(&e)).await?;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Unrecognized input");
                    emit(&mut stdout, &Rejection::new(&e)).await?;
                }
            },
        }

        emit(&mut stdout, &controller.view(Utc::now())).await?;
    }

    // ── 6. Graceful shutdown ────────────────────────────────
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(5), refresher_handle).await;

    info!(submitted = submitter.submitted(), "Session closed");
    Ok(())
}

/// A rejected line, echoed back to the caller.
#[derive(Serialize)]
struct Rejection {
    rejected: String,
}

impl Rejection {
    fn new(error: &dyn std::fmt::Display) -> Self {
        Self {
            rejected: error.to_string(),
        }
    }
}

/// Write `value` as one JSON line.
async fn emit<T: Serialize + ?Sized>(stdout: &mut tokio::io::Stdout, value: &T) -> Result<()> {
    let mut json = serde_json::to_string(value).context("Failed to serialize output")?;
    json.push('\n');
    stdout.write_all(json.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
