//! Event-triggered maintenance: delete unused disks, prune old snapshots.
//!
//! Reads one `{"data": "<base64 JSON>"}` event from a file or stdin. A non-zero exit
//! tells the triggering system to retry or dead-letter the event.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio::io::AsyncReadExt;

use gcp_vm::constants::{DEFAULT_API_BASE, DEFAULT_LOG_LEVEL, ENV_APPLICATION_CREDENTIALS};
use gcp_vm::gc::{
    DeleteDisksPayload, PruneSnapshotsPayload, PubSubEvent, handle_delete_disks,
    handle_prune_snapshots,
};
use gcp_vm::{build_compute, telemetry};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "gcp-vm-daemon", about = "gcp-vm disk and snapshot maintenance")]
struct Cli {
    /// One of trace, debug, info, warn, error, fatal
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Service-account key used for GCP (default: $GOOGLE_APPLICATION_CREDENTIALS)
    #[arg(long, global = true)]
    gcp_application_credentials: Option<PathBuf>,

    /// GCP project (default: from the credentials or gcloud)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Compute Engine API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Event file; `-` or omitted reads stdin
    #[arg(long, global = true)]
    event: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete the listed disks that no VM uses
    DeleteDisks,
    /// Keep only the newest snapshots of the listed disks
    PruneSnapshots,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level);

    let event = PubSubEvent::from_json(&read_event(cli.event.as_deref()).await?)?;
    let credentials = cli
        .gcp_application_credentials
        .clone()
        .or_else(|| std::env::var_os(ENV_APPLICATION_CREDENTIALS).map(PathBuf::from));
    let compute = build_compute(&cli.api_base, cli.project.clone(), credentials)
        .await
        .context("failed to connect to Compute Engine")?;

    match cli.command {
        Command::DeleteDisks => {
            let payload: DeleteDisksPayload = event.payload()?;
            handle_delete_disks(&compute, &payload).await?;
            tracing::info!(disks = ?payload.disks()?, "Successfully deleted disks");
        }
        Command::PruneSnapshots => {
            let payload: PruneSnapshotsPayload = event.payload()?;
            let deleted = handle_prune_snapshots(&compute, &payload).await?;
            tracing::info!(snapshots = ?deleted, "Successfully pruned snapshots");
        }
    }
    Ok(())
}

async fn read_event(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read event file {}", path.display())),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read event from stdin")?;
            Ok(raw)
        }
    }
}
