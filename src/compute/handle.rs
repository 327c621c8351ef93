//! Zone-scoped resource handles.
//!
//! Every mutating method waits for the provider operation to finish, so a returned
//! `Ok(())` means the change is in effect.

use std::sync::Arc;

use super::api::ComputeApi;
use super::error::ComputeResult;
use super::model::{
    DiskMetadata, DiskSpec, Operation, SnapshotMetadata, SnapshotSpec, VmMetadata, VmSpec,
};
use crate::labels::SnapshotFilter;

#[derive(Clone)]
/// Entry point to the provider: zones and the global snapshot collection.
pub struct Compute {
    api: Arc<dyn ComputeApi>,
}

impl Compute {
    pub fn new(api: Arc<dyn ComputeApi>) -> Self {
        Self { api }
    }

    /// Returns the underlying provider implementation.
    pub fn api(&self) -> &Arc<dyn ComputeApi> {
        &self.api
    }

    pub fn zone(&self, name: &str) -> ZoneHandle {
        ZoneHandle {
            compute: self.clone(),
            name: name.to_string(),
        }
    }

    /// Snapshot handles matching `filter`.
    pub async fn snapshots(&self, filter: &SnapshotFilter) -> ComputeResult<Vec<SnapshotHandle>> {
        let names = self.api.list_snapshots(filter).await?;
        Ok(names
            .into_iter()
            .map(|name| SnapshotHandle {
                compute: self.clone(),
                name,
            })
            .collect())
    }

    async fn complete(&self, operation: ComputeResult<Operation>) -> ComputeResult<()> {
        let operation = operation?;
        tracing::trace!(operation = %operation.name, "Waiting for operation");
        self.api.wait_operation(&operation).await
    }
}

#[derive(Clone)]
pub struct ZoneHandle {
    compute: Compute,
    name: String,
}

impl ZoneHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disk(&self, name: &str) -> DiskHandle {
        DiskHandle {
            compute: self.compute.clone(),
            zone: self.name.clone(),
            name: name.to_string(),
        }
    }

    pub fn vm(&self, name: &str) -> VmHandle {
        VmHandle {
            compute: self.compute.clone(),
            zone: self.name.clone(),
            name: name.to_string(),
        }
    }

    /// Handles for every instance in the zone.
    pub async fn vms(&self) -> ComputeResult<Vec<VmHandle>> {
        let names = self.compute.api.list_vms(&self.name).await?;
        Ok(names.iter().map(|n| self.vm(n)).collect())
    }

    pub async fn create_vm(&self, name: &str, spec: &VmSpec) -> ComputeResult<()> {
        let op = self.compute.api.insert_vm(&self.name, name, spec).await;
        self.compute.complete(op).await
    }
}

#[derive(Clone)]
pub struct DiskHandle {
    compute: Compute,
    zone: String,
    name: String,
}

impl DiskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub async fn exists(&self) -> ComputeResult<bool> {
        self.compute.api.disk_exists(&self.zone, &self.name).await
    }

    pub async fn metadata(&self) -> ComputeResult<DiskMetadata> {
        self.compute.api.get_disk(&self.zone, &self.name).await
    }

    pub async fn create(&self, spec: &DiskSpec) -> ComputeResult<()> {
        let op = self.compute.api.insert_disk(&self.zone, &self.name, spec).await;
        self.compute.complete(op).await
    }

    pub async fn create_snapshot(&self, snapshot: &str, spec: &SnapshotSpec) -> ComputeResult<()> {
        let op = self
            .compute
            .api
            .create_snapshot(&self.zone, &self.name, snapshot, spec)
            .await;
        self.compute.complete(op).await
    }

    pub async fn delete(&self) -> ComputeResult<()> {
        let op = self.compute.api.delete_disk(&self.zone, &self.name).await;
        self.compute.complete(op).await
    }
}

#[derive(Clone)]
pub struct VmHandle {
    compute: Compute,
    zone: String,
    name: String,
}

impl VmHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn metadata(&self) -> ComputeResult<VmMetadata> {
        self.compute.api.get_vm(&self.zone, &self.name).await
    }

    pub async fn start(&self) -> ComputeResult<()> {
        let op = self.compute.api.start_vm(&self.zone, &self.name).await;
        self.compute.complete(op).await
    }

    pub async fn stop(&self) -> ComputeResult<()> {
        let op = self.compute.api.stop_vm(&self.zone, &self.name).await;
        self.compute.complete(op).await
    }

    pub async fn delete(&self) -> ComputeResult<()> {
        let op = self.compute.api.delete_vm(&self.zone, &self.name).await;
        self.compute.complete(op).await
    }
}

#[derive(Clone)]
pub struct SnapshotHandle {
    compute: Compute,
    name: String,
}

impl SnapshotHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn metadata(&self) -> ComputeResult<SnapshotMetadata> {
        self.compute.api.get_snapshot(&self.name).await
    }

    pub async fn delete(&self) -> ComputeResult<()> {
        let op = self.compute.api.delete_snapshot(&self.name).await;
        self.compute.complete(op).await
    }
}

impl std::fmt::Debug for SnapshotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHandle").field("name", &self.name).finish()
    }
}
