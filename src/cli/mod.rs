//! Command-line surface of the `gcp-vm` binary.

pub mod error;
pub mod parse;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub use error::{CliError, CliResult};
pub use parse::{AcceleratorList, TagList, parse_accelerators, parse_bool, parse_memory, parse_tags};

use crate::config::Settings;
use crate::constants::{DEFAULT_API_BASE, DEFAULT_LABEL_PREFIX};

#[derive(Debug, Parser)]
#[command(
    name = "gcp-vm",
    version,
    about = "Run a GCE VM on a persistent disk that is snapshotted away when not in use"
)]
pub struct Cli {
    /// One of trace, debug, info, warn, error, fatal
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Service-account key used for GCP
    #[arg(long, global = true)]
    pub gcp_application_credentials: Option<PathBuf>,

    /// Prefix of the snapshot labels
    #[arg(long, global = true, default_value = DEFAULT_LABEL_PREFIX)]
    pub label_prefix: String,

    /// GCP project (default: from the credentials or gcloud)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Compute Engine API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Restore the disk if needed, create a VM on it and start it
    Launch(LaunchArgs),
    /// Start the stopped VM
    Resume(DiskArgs),
    /// Stop the VM
    Pause(DiskArgs),
    /// Stop and delete the VM, then snapshot its disk
    Terminate(DiskArgs),
    /// Print the external IP address of the VM
    IpAddress(DiskArgs),
}

impl Command {
    pub fn disk_args(&self) -> &DiskArgs {
        match self {
            Self::Launch(args) => &args.disk,
            Self::Resume(args)
            | Self::Pause(args)
            | Self::Terminate(args)
            | Self::IpAddress(args) => args,
        }
    }

    pub fn disk(&self) -> &str {
        &self.disk_args().disk
    }

    /// Settings given on the command line, the highest-precedence layer.
    pub fn settings(&self) -> Settings {
        match self {
            Self::Launch(args) => args.settings(),
            _ => self.disk_args().settings(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DiskArgs {
    /// Name of the disk; the VM gets the same name
    pub disk: String,

    /// The GCP zone
    #[arg(long)]
    pub zone: Option<String>,
}

impl DiskArgs {
    fn settings(&self) -> Settings {
        Settings {
            zone: self.zone.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub disk: DiskArgs,

    /// Named machine type, e.g. n1-standard-4
    #[arg(long)]
    pub machine_type: Option<String>,

    /// vCPUs of a custom machine type
    #[arg(long)]
    pub vcpu: Option<u32>,

    /// Memory of a custom machine type [GB]
    #[arg(long, visible_alias = "memory", value_parser = parse_memory)]
    pub vmemory: Option<f64>,

    /// Accelerators as <type>=<count>[,...]
    #[arg(long, value_parser = parse_accelerators)]
    pub accelerator: Option<AcceleratorList>,

    /// Use a preemptible VM (true|false)
    #[arg(long, value_parser = parse_bool, action = ArgAction::Set)]
    pub preemptible: Option<bool>,

    /// Network tags as <tag1>[,<tag2>...]
    #[arg(long, value_parser = parse_tags)]
    pub tags: Option<TagList>,
}

impl LaunchArgs {
    fn settings(&self) -> Settings {
        Settings {
            machine_type: self.machine_type.clone(),
            vcpu: self.vcpu,
            memory_gb: self.vmemory,
            accelerators: self.accelerator.clone().map(|a| a.0),
            preemptible: self.preemptible,
            tags: self.tags.clone().map(|t| t.0),
            ..self.disk.settings()
        }
    }
}
