//! Compute provider surface: zones, disks, instances and snapshots.

pub mod api;
pub mod error;
pub mod gcp;
pub mod handle;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use api::ComputeApi;
pub use error::{ComputeError, ComputeResult};
pub use gcp::{GcloudAuth, GcpComputeApi, resolve_project};
pub use handle::{Compute, DiskHandle, SnapshotHandle, VmHandle, ZoneHandle};
#[cfg(any(test, feature = "mock"))]
pub use mock::{ComputeCall, MockComputeApi, mock_disk, mock_snapshot, mock_vm};
pub use model::{
    AccessConfig, AcceleratorConfig, AttachedDisk, DiskMetadata, DiskSpec, NetworkInterface,
    Operation, OperationStatus, Scheduling, SnapshotMetadata, SnapshotSpec, Tags, VmMetadata,
    VmSpec,
};
