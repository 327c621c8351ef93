//! `gcp-vm` command-line entrypoint.

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;

use gcp_vm::cli::{Cli, Command};
use gcp_vm::config::{DiskConfig, GlobalConfig, SettingsLayers, config_dir};
use gcp_vm::{DiskCommands, DiskLifecycle, LifecycleConfig, build_compute, telemetry};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dir = config_dir()?;
    let global = GlobalConfig::load(&dir).await?;
    let log_level = cli.log_level.clone().unwrap_or(global.log_level);
    telemetry::init_tracing(&log_level);

    if let Err(e) = run(cli, global.gcp_application_credentials, &dir).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    cli: Cli,
    default_credentials: std::path::PathBuf,
    dir: &std::path::Path,
) -> anyhow::Result<()> {
    let disk = cli.command.disk().to_string();
    let disk_config = DiskConfig::load(dir, &disk).await?;
    let settings = SettingsLayers::new()
        .push(cli.command.settings())
        .push(disk_config)
        .resolve();

    let credentials = cli
        .gcp_application_credentials
        .clone()
        .unwrap_or(default_credentials);
    let project = cli.project.clone().or_else(|| settings.project.clone());
    tracing::debug!(
        disk = %disk,
        credentials = %credentials.display(),
        label_prefix = %cli.label_prefix,
        "Starting command"
    );

    let compute = build_compute(&cli.api_base, project, Some(credentials))
        .await
        .context("failed to connect to Compute Engine")?;
    let lifecycle = DiskLifecycle::new(
        compute,
        LifecycleConfig::new(cli.api_base.as_str(), &cli.label_prefix),
    );
    let commands = DiskCommands::new(lifecycle, disk, settings);

    match cli.command {
        Command::Launch(_) => commands.launch().await?,
        Command::Resume(_) => commands.resume().await?,
        Command::Pause(_) => commands.pause().await?,
        Command::Terminate(_) => {
            let snapshot = commands.terminate().await?;
            tracing::info!(snapshot = %snapshot, "Created snapshot");
        }
        Command::IpAddress(_) => {
            let address = commands.ip_address().await?;
            println!("IpAddress: {address}");
        }
    }
    Ok(())
}
