//! Disk-backed Compute Engine VMs.
//!
//! A VM lives on one persistent disk. Launching restores the disk from its newest
//! snapshot when needed and boots a VM on it; terminating deletes the VM and snapshots
//! the disk. Snapshots are found again through their labels, so nothing is stored
//! locally between runs.
//!
//! - [`labels`]: label keys and values, disk-type URLs, snapshot filters
//! - [`compute`]: provider trait, operation-awaiting handles, REST backend
//! - [`lifecycle`]: restore, snapshot and machine operations on one disk
//! - [`commands`]: launch, resume, pause, terminate, ip-address
//! - [`gc`]: unused-disk deletion and snapshot retention for the daemon
//! - [`config`], [`cli`], [`telemetry`]: binary plumbing
//!
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cli;
pub mod commands;
pub mod compute;
pub mod config;
pub mod constants;
pub mod gc;
pub mod labels;
pub mod lifecycle;
pub mod telemetry;

pub use commands::{DiskCommands, snapshot_name};
pub use compute::{Compute, ComputeApi, ComputeError, ComputeResult, GcpComputeApi};
#[cfg(any(test, feature = "mock"))]
pub use compute::{ComputeCall, MockComputeApi};
pub use config::{ConfigError, DiskConfig, GlobalConfig, ResolvedSettings, Settings, SettingsLayers};
pub use gc::{GcError, GcResult};
pub use labels::{DiskTypeRef, LabelError, LabelKeys, SnapshotFilter};
pub use lifecycle::{
    Accelerator, DiskLifecycle, LifecycleConfig, LifecycleError, LifecycleResult, MachineOptions,
    MachineType, build_compute,
};
