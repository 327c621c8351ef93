//! Disk-backed VM lifecycle: restore a disk from its newest snapshot, run a VM on it,
//! and snapshot it again before the VM goes away.

/// Lifecycle configuration.
pub mod config;
/// Lifecycle error types.
pub mod error;
/// Provider construction.
pub mod factory;
/// Restore, snapshot and machine operations.
pub mod manager;
/// Machine type and option types.
pub mod types;

#[cfg(test)]
mod tests;

pub use config::LifecycleConfig;
pub use error::{LifecycleError, LifecycleResult};
pub use factory::build_compute;
pub use manager::{DiskLifecycle, machine_spec, sort_by_creation};
pub use types::{Accelerator, MachineOptions, MachineType};
