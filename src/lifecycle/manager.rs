use futures_util::future::try_join_all;

use super::config::LifecycleConfig;
use super::error::{LifecycleError, LifecycleResult};
use super::types::{MachineOptions, MachineType};
use crate::compute::{
    AccessConfig, AcceleratorConfig, AttachedDisk, Compute, ComputeResult, DiskSpec,
    NetworkInterface, Scheduling, SnapshotHandle, SnapshotMetadata, SnapshotSpec, Tags, VmSpec,
};
use crate::labels::{DiskTypeRef, parse_disk_type_url, region_of_zone};

/// Restores, snapshots and runs the VM for a persistent disk.
///
/// Holds no state of its own: every call re-reads the provider.
#[derive(Clone)]
pub struct DiskLifecycle {
    compute: Compute,
    config: LifecycleConfig,
}

impl DiskLifecycle {
    pub fn new(compute: Compute, config: LifecycleConfig) -> Self {
        Self { compute, config }
    }

    pub fn compute(&self) -> &Compute {
        &self.compute
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Ensures `disk_name` exists in `zone`, recreating it from its newest snapshot.
    ///
    /// A disk that already exists is left untouched (no resize, no mutation).
    pub async fn restore_disk(&self, disk_name: &str, zone: &str) -> LifecycleResult<()> {
        let disk = self.compute.zone(zone).disk(disk_name);
        if disk.exists().await? {
            tracing::debug!(disk = disk_name, zone, "Disk exists, nothing to restore");
            return Ok(());
        }

        let filter = self.config.labels.restore_filter(zone, disk_name);
        let snapshots = self.compute.snapshots(&filter).await?;
        let candidates = snapshots_with_metadata(snapshots).await?;
        let newest =
            newest_snapshot(candidates).ok_or_else(|| LifecycleError::NoSnapshotFound {
                disk: disk_name.to_string(),
                zone: zone.to_string(),
            })?;

        let (project, disk_type) = self.config.labels.decode(&newest.labels);
        let disk_type = DiskTypeRef {
            project: project.to_string(),
            zone: zone.to_string(),
            disk_type: disk_type.to_string(),
        };
        let spec = DiskSpec {
            size_gb: newest.disk_size_gb,
            source_snapshot: newest.self_link.clone(),
            disk_type: disk_type.to_url(&self.config.api_base),
        };

        tracing::info!(
            disk = disk_name,
            zone,
            snapshot = %newest.name,
            size_gb = spec.size_gb,
            "Restoring disk from snapshot"
        );
        disk.create(&spec).await?;
        Ok(())
    }

    /// Snapshots an existing disk into `snapshot_name`, labeled for later restore.
    ///
    /// The caller supplies a unique name; no collision check is made here.
    pub async fn create_snapshot(
        &self,
        disk_name: &str,
        snapshot_name: &str,
        zone: &str,
    ) -> LifecycleResult<()> {
        let disk = self.compute.zone(zone).disk(disk_name);
        let metadata = disk.metadata().await?;
        let disk_type = parse_disk_type_url(&self.config.api_base, &metadata.disk_type)?;

        let spec = SnapshotSpec {
            labels: self.config.labels.encode(zone, disk_name, &disk_type),
            storage_locations: vec![region_of_zone(zone).to_string()],
        };

        tracing::info!(
            disk = disk_name,
            zone,
            snapshot = snapshot_name,
            location = %spec.storage_locations[0],
            "Creating snapshot"
        );
        disk.create_snapshot(snapshot_name, &spec).await?;
        Ok(())
    }

    /// Creates `vm_name` booting from `disk_name`.
    pub async fn create_machine(
        &self,
        vm_name: &str,
        disk_name: &str,
        zone: &str,
        machine_type: &MachineType,
        options: &MachineOptions,
    ) -> LifecycleResult<()> {
        let zone_handle = self.compute.zone(zone);
        let disk = zone_handle.disk(disk_name).metadata().await?;
        let spec = machine_spec(disk_name, &disk.self_link, machine_type, options);

        tracing::info!(
            vm = vm_name,
            disk = disk_name,
            zone,
            machine_type = %spec.machine_type,
            preemptible = options.preemptible,
            "Creating VM"
        );
        zone_handle.create_vm(vm_name, &spec).await?;
        Ok(())
    }

    pub async fn start_machine(&self, vm_name: &str, zone: &str) -> LifecycleResult<()> {
        tracing::info!(vm = vm_name, zone, "Starting VM");
        self.compute.zone(zone).vm(vm_name).start().await?;
        Ok(())
    }

    pub async fn stop_machine(&self, vm_name: &str, zone: &str) -> LifecycleResult<()> {
        tracing::info!(vm = vm_name, zone, "Stopping VM");
        self.compute.zone(zone).vm(vm_name).stop().await?;
        Ok(())
    }

    /// Deletes the VM. The boot disk is attached with `autoDelete = false` and survives.
    pub async fn delete_machine(&self, vm_name: &str, zone: &str) -> LifecycleResult<()> {
        tracing::info!(vm = vm_name, zone, "Deleting VM");
        self.compute.zone(zone).vm(vm_name).delete().await?;
        Ok(())
    }

    /// NAT IP of the VM's first interface.
    pub async fn public_ip_address(&self, vm_name: &str, zone: &str) -> LifecycleResult<String> {
        let metadata = self.compute.zone(zone).vm(vm_name).metadata().await?;
        metadata
            .public_ip()
            .map(str::to_string)
            .ok_or_else(|| LifecycleError::NoPublicIp {
                vm: vm_name.to_string(),
                zone: zone.to_string(),
            })
    }
}

/// Fetches metadata for every handle concurrently.
pub(crate) async fn snapshots_with_metadata(
    snapshots: Vec<SnapshotHandle>,
) -> ComputeResult<Vec<(SnapshotHandle, SnapshotMetadata)>> {
    try_join_all(snapshots.into_iter().map(|snapshot| async move {
        let metadata = snapshot.metadata().await?;
        Ok((snapshot, metadata))
    }))
    .await
}

/// Sorts oldest first by creation time. Equal timestamps keep their input order.
pub fn sort_by_creation<T>(entries: &mut [(T, SnapshotMetadata)]) {
    entries.sort_by(|a, b| a.1.creation_timestamp.cmp(&b.1.creation_timestamp));
}

fn newest_snapshot(
    mut entries: Vec<(SnapshotHandle, SnapshotMetadata)>,
) -> Option<SnapshotMetadata> {
    sort_by_creation(&mut entries);
    entries.pop().map(|(_, metadata)| metadata)
}

/// Builds the instance body: one non-auto-delete boot disk, one external NAT interface,
/// no automatic restart, terminate on host maintenance.
pub fn machine_spec(
    disk_name: &str,
    disk_self_link: &str,
    machine_type: &MachineType,
    options: &MachineOptions,
) -> VmSpec {
    VmSpec {
        machine_type: machine_type.resolve(),
        disks: vec![AttachedDisk {
            kind: Some("compute#attachedDisk".to_string()),
            disk_type: Some("PERSISTENT".to_string()),
            mode: Some("READ_WRITE".to_string()),
            source: disk_self_link.to_string(),
            device_name: disk_name.to_string(),
            boot: true,
            auto_delete: false,
        }],
        guest_accelerators: options
            .accelerators
            .iter()
            .map(AcceleratorConfig::from)
            .collect(),
        network_interfaces: vec![NetworkInterface {
            kind: Some("compute#networkInterface".to_string()),
            network: None,
            access_configs: vec![AccessConfig {
                kind: Some("compute#accessConfig".to_string()),
                name: Some("External NAT".to_string()),
                access_type: Some("ONE_TO_ONE_NAT".to_string()),
                network_tier: Some("PREMIUM".to_string()),
                nat_ip: None,
            }],
        }],
        scheduling: Scheduling {
            automatic_restart: false,
            on_host_maintenance: "TERMINATE".to_string(),
            preemptible: options.preemptible,
        },
        tags: Tags {
            items: options.tags.clone(),
        },
    }
}
