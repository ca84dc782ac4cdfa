//! Stampsync CLI - timestamp audit and resequencing for recorded sessions.
//!
//! Runs one command over a JSON-lines session using the stampsync-engine
//! pipelines. Everything is configured through `STAMPSYNC_*` environment
//! variables (or a `.env` file); the only argument is the command name.
//!
//! ```text
//! STAMPSYNC_INPUT=bag.jsonl STAMPSYNC_REFERENCE=/cam_mid/image_raw \
//!     STAMPSYNC_TARGETS=/cam_left/image_raw,/cam_right/image_raw stampsync audit
//! ```

mod codec;
mod commands;
mod config;
mod error;
mod jsonl;
mod report;

use crate::config::{Config, Task};
use crate::jsonl::JsonlSession;
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stampsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env(std::env::args().nth(1))?;

    if let Err(e) = run(&config) {
        tracing::error!("{} failed: {}", config.task.command(), e);
        return Err(e.into());
    }
    Ok(())
}

fn run(config: &Config) -> error::Result<()> {
    let session = JsonlSession::new(&config.input);
    tracing::info!(
        command = %config.task.command(),
        input = %session.path().display(),
        "Starting stampsync"
    );

    let json = match &config.task {
        Task::Audit(audit) => {
            tracing::info!(
                "Reference: {} | Targets: {} | Tolerance: {} ns",
                audit.reference,
                audit.targets.join(", "),
                audit.tolerance_ns
            );
            let report = commands::audit(&session, audit)?;
            report::log_audit(&report);
            report.to_json_pretty()?
        }
        Task::Resequence { output, config } => {
            tracing::info!(
                sync = %config.sync_streams.join(", "),
                offsets = %config.offset_streams.join(", "),
                output = %output.display(),
                "Resequencing"
            );
            let report = commands::resequence(&session, output, config)?;
            report::log_resequence(&report);
            report.to_json_pretty()?
        }
        Task::Cadence { streams, config } => {
            let found = commands::cadence(&session, streams, config)?;
            report::log_cadence(&found);
            serde_json::to_string_pretty(&found)?
        }
    };

    if let Some(path) = &config.report_json {
        fs::write(path, json)?;
        tracing::info!("Report written to {}", path.display());
    }
    Ok(())
}
