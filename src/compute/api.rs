use async_trait::async_trait;

use super::error::ComputeResult;
use super::model::{
    DiskMetadata, DiskSpec, Operation, SnapshotMetadata, SnapshotSpec, VmMetadata, VmSpec,
};
use crate::labels::SnapshotFilter;

#[async_trait]
/// Provider operations required by the disk/VM lifecycle and the GC jobs.
///
/// Mutating calls return an [`Operation`] that is still in flight; callers go through
/// [`Compute`](super::Compute) handles, which wait on it before returning.
pub trait ComputeApi: Send + Sync {
    /// Returns `true` if `disk` exists in `zone`.
    async fn disk_exists(&self, zone: &str, disk: &str) -> ComputeResult<bool>;
    async fn get_disk(&self, zone: &str, disk: &str) -> ComputeResult<DiskMetadata>;
    async fn insert_disk(
        &self,
        zone: &str,
        disk: &str,
        spec: &DiskSpec,
    ) -> ComputeResult<Operation>;
    async fn delete_disk(&self, zone: &str, disk: &str) -> ComputeResult<Operation>;
    /// Snapshots `disk` into a new snapshot called `snapshot`.
    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        snapshot: &str,
        spec: &SnapshotSpec,
    ) -> ComputeResult<Operation>;

    /// Names of the snapshots matching `filter`.
    async fn list_snapshots(&self, filter: &SnapshotFilter) -> ComputeResult<Vec<String>>;
    async fn get_snapshot(&self, snapshot: &str) -> ComputeResult<SnapshotMetadata>;
    async fn delete_snapshot(&self, snapshot: &str) -> ComputeResult<Operation>;

    /// Names of the instances in `zone`.
    async fn list_vms(&self, zone: &str) -> ComputeResult<Vec<String>>;
    async fn get_vm(&self, zone: &str, vm: &str) -> ComputeResult<VmMetadata>;
    async fn insert_vm(&self, zone: &str, vm: &str, spec: &VmSpec) -> ComputeResult<Operation>;
    async fn start_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation>;
    async fn stop_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation>;
    async fn delete_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation>;

    /// Blocks until `operation` is done, surfacing its errors.
    async fn wait_operation(&self, operation: &Operation) -> ComputeResult<()>;
}
