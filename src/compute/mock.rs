use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use super::api::ComputeApi;
use super::error::{ComputeError, ComputeResult};
use super::model::{
    AccessConfig, AttachedDisk, DiskMetadata, DiskSpec, NetworkInterface, Operation,
    SnapshotMetadata, SnapshotSpec, VmMetadata, VmSpec,
};
use crate::labels::SnapshotFilter;

const MOCK_API_BASE: &str = "https://mock.compute/v1";
const MOCK_PROJECT: &str = "mock-project";

/// A call recorded by [`MockComputeApi`], in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeCall {
    DiskExists { zone: String, disk: String },
    GetDisk { zone: String, disk: String },
    InsertDisk { zone: String, disk: String, spec: DiskSpec },
    DeleteDisk { zone: String, disk: String },
    CreateSnapshot {
        zone: String,
        disk: String,
        snapshot: String,
        spec: SnapshotSpec,
    },
    ListSnapshots { filter: String },
    GetSnapshot { snapshot: String },
    DeleteSnapshot { snapshot: String },
    ListVms { zone: String },
    GetVm { zone: String, vm: String },
    InsertVm { zone: String, vm: String, spec: VmSpec },
    StartVm { zone: String, vm: String },
    StopVm { zone: String, vm: String },
    DeleteVm { zone: String, vm: String },
}

impl ComputeCall {
    /// Returns `true` for calls that change provider state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::InsertDisk { .. }
                | Self::DeleteDisk { .. }
                | Self::CreateSnapshot { .. }
                | Self::DeleteSnapshot { .. }
                | Self::InsertVm { .. }
                | Self::StartVm { .. }
                | Self::StopVm { .. }
                | Self::DeleteVm { .. }
        )
    }
}

#[derive(Default)]
struct MockState {
    disks: BTreeMap<(String, String), DiskMetadata>,
    vms: BTreeMap<(String, String), VmMetadata>,
    snapshots: BTreeMap<String, SnapshotMetadata>,
    calls: Vec<ComputeCall>,
    waits: usize,
    next_address: u8,
}

/// In-memory mock implementation of [`ComputeApi`].
///
/// Operations complete immediately. Snapshots created through the mock are stamped with
/// the current time.
#[derive(Default)]
pub struct MockComputeApi {
    state: Mutex<MockState>,
}

impl MockComputeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// API base used for the self links and disk-type URLs the mock generates.
    pub fn api_base() -> &'static str {
        MOCK_API_BASE
    }

    pub fn with_disk(self, zone: &str, disk: DiskMetadata) -> Self {
        self.lock()
            .disks
            .insert((zone.to_string(), disk.name.clone()), disk);
        self
    }

    pub fn with_vm(self, zone: &str, vm: VmMetadata) -> Self {
        self.lock().vms.insert((zone.to_string(), vm.name.clone()), vm);
        self
    }

    pub fn with_snapshot(self, snapshot: SnapshotMetadata) -> Self {
        self.lock()
            .snapshots
            .insert(snapshot.name.clone(), snapshot);
        self
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<ComputeCall> {
        self.lock().calls.clone()
    }

    /// Only the calls that changed state.
    pub fn mutations(&self) -> Vec<ComputeCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of operations waited on.
    pub fn waits(&self) -> usize {
        self.lock().waits
    }

    pub fn disk(&self, zone: &str, disk: &str) -> Option<DiskMetadata> {
        self.lock()
            .disks
            .get(&(zone.to_string(), disk.to_string()))
            .cloned()
    }

    pub fn vm(&self, zone: &str, vm: &str) -> Option<VmMetadata> {
        self.lock()
            .vms
            .get(&(zone.to_string(), vm.to_string()))
            .cloned()
    }

    pub fn snapshot(&self, name: &str) -> Option<SnapshotMetadata> {
        self.lock().snapshots.get(name).cloned()
    }

    /// Names of all stored snapshots, sorted.
    pub fn snapshot_names(&self) -> Vec<String> {
        self.lock().snapshots.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: ComputeCall) -> MutexGuard<'_, MockState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    fn operation(kind: &str, target: &str) -> Operation {
        let name = format!("operation-{kind}-{target}");
        let self_link = format!("{MOCK_API_BASE}/projects/{MOCK_PROJECT}/operations/{name}");
        Operation::done(name, self_link)
    }

    fn conflict(resource: String) -> ComputeError {
        ComputeError::Api {
            status: 409,
            message: format!("The resource '{resource}' already exists"),
            resource,
        }
    }
}

#[async_trait]
impl ComputeApi for MockComputeApi {
    async fn disk_exists(&self, zone: &str, disk: &str) -> ComputeResult<bool> {
        let state = self.record(ComputeCall::DiskExists {
            zone: zone.to_string(),
            disk: disk.to_string(),
        });
        Ok(state
            .disks
            .contains_key(&(zone.to_string(), disk.to_string())))
    }

    async fn get_disk(&self, zone: &str, disk: &str) -> ComputeResult<DiskMetadata> {
        let state = self.record(ComputeCall::GetDisk {
            zone: zone.to_string(),
            disk: disk.to_string(),
        });
        state
            .disks
            .get(&(zone.to_string(), disk.to_string()))
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("disk {zone}/{disk}"),
            })
    }

    async fn insert_disk(
        &self,
        zone: &str,
        disk: &str,
        spec: &DiskSpec,
    ) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::InsertDisk {
            zone: zone.to_string(),
            disk: disk.to_string(),
            spec: spec.clone(),
        });
        let key = (zone.to_string(), disk.to_string());
        if state.disks.contains_key(&key) {
            return Err(Self::conflict(format!("disk {zone}/{disk}")));
        }
        state.disks.insert(
            key,
            DiskMetadata {
                name: disk.to_string(),
                size_gb: spec.size_gb,
                disk_type: spec.disk_type.clone(),
                self_link: format!(
                    "{MOCK_API_BASE}/projects/{MOCK_PROJECT}/zones/{zone}/disks/{disk}"
                ),
                labels: HashMap::new(),
            },
        );
        Ok(Self::operation("insert-disk", disk))
    }

    async fn delete_disk(&self, zone: &str, disk: &str) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::DeleteDisk {
            zone: zone.to_string(),
            disk: disk.to_string(),
        });
        state
            .disks
            .remove(&(zone.to_string(), disk.to_string()))
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("disk {zone}/{disk}"),
            })?;
        Ok(Self::operation("delete-disk", disk))
    }

    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        snapshot: &str,
        spec: &SnapshotSpec,
    ) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::CreateSnapshot {
            zone: zone.to_string(),
            disk: disk.to_string(),
            snapshot: snapshot.to_string(),
            spec: spec.clone(),
        });
        let source = state
            .disks
            .get(&(zone.to_string(), disk.to_string()))
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("disk {zone}/{disk}"),
            })?;
        if state.snapshots.contains_key(snapshot) {
            return Err(Self::conflict(format!("snapshot {snapshot}")));
        }
        state.snapshots.insert(
            snapshot.to_string(),
            SnapshotMetadata {
                name: snapshot.to_string(),
                creation_timestamp: Utc::now().fixed_offset(),
                disk_size_gb: source.size_gb,
                labels: spec.labels.clone(),
                self_link: format!(
                    "{MOCK_API_BASE}/projects/{MOCK_PROJECT}/global/snapshots/{snapshot}"
                ),
                storage_locations: spec.storage_locations.clone(),
                source_disk: Some(source.self_link),
            },
        );
        Ok(Self::operation("create-snapshot", snapshot))
    }

    async fn list_snapshots(&self, filter: &SnapshotFilter) -> ComputeResult<Vec<String>> {
        let state = self.record(ComputeCall::ListSnapshots {
            filter: filter.render(),
        });
        Ok(state
            .snapshots
            .values()
            .filter(|s| filter.matches(&s.labels))
            .map(|s| s.name.clone())
            .collect())
    }

    async fn get_snapshot(&self, snapshot: &str) -> ComputeResult<SnapshotMetadata> {
        let state = self.record(ComputeCall::GetSnapshot {
            snapshot: snapshot.to_string(),
        });
        state
            .snapshots
            .get(snapshot)
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("snapshot {snapshot}"),
            })
    }

    async fn delete_snapshot(&self, snapshot: &str) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::DeleteSnapshot {
            snapshot: snapshot.to_string(),
        });
        state
            .snapshots
            .remove(snapshot)
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("snapshot {snapshot}"),
            })?;
        Ok(Self::operation("delete-snapshot", snapshot))
    }

    async fn list_vms(&self, zone: &str) -> ComputeResult<Vec<String>> {
        let state = self.record(ComputeCall::ListVms {
            zone: zone.to_string(),
        });
        Ok(state
            .vms
            .keys()
            .filter(|(z, _)| z == zone)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn get_vm(&self, zone: &str, vm: &str) -> ComputeResult<VmMetadata> {
        let state = self.record(ComputeCall::GetVm {
            zone: zone.to_string(),
            vm: vm.to_string(),
        });
        state
            .vms
            .get(&(zone.to_string(), vm.to_string()))
            .cloned()
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("instance {zone}/{vm}"),
            })
    }

    async fn insert_vm(&self, zone: &str, vm: &str, spec: &VmSpec) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::InsertVm {
            zone: zone.to_string(),
            vm: vm.to_string(),
            spec: spec.clone(),
        });
        let key = (zone.to_string(), vm.to_string());
        if state.vms.contains_key(&key) {
            return Err(Self::conflict(format!("instance {zone}/{vm}")));
        }

        state.next_address = state.next_address.wrapping_add(1);
        let address = format!("203.0.113.{}", state.next_address);
        let network_interfaces = spec
            .network_interfaces
            .iter()
            .map(|ni| NetworkInterface {
                access_configs: ni
                    .access_configs
                    .iter()
                    .map(|ac| AccessConfig {
                        nat_ip: Some(address.clone()),
                        ..ac.clone()
                    })
                    .collect(),
                ..ni.clone()
            })
            .collect();

        state.vms.insert(
            key,
            VmMetadata {
                name: vm.to_string(),
                status: "RUNNING".to_string(),
                machine_type: spec.machine_type.clone(),
                disks: spec.disks.clone(),
                network_interfaces,
                tags: spec.tags.clone(),
            },
        );
        Ok(Self::operation("insert-vm", vm))
    }

    async fn start_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::StartVm {
            zone: zone.to_string(),
            vm: vm.to_string(),
        });
        let entry = state
            .vms
            .get_mut(&(zone.to_string(), vm.to_string()))
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("instance {zone}/{vm}"),
            })?;
        entry.status = "RUNNING".to_string();
        Ok(Self::operation("start", vm))
    }

    async fn stop_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::StopVm {
            zone: zone.to_string(),
            vm: vm.to_string(),
        });
        let entry = state
            .vms
            .get_mut(&(zone.to_string(), vm.to_string()))
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("instance {zone}/{vm}"),
            })?;
        entry.status = "TERMINATED".to_string();
        Ok(Self::operation("stop", vm))
    }

    async fn delete_vm(&self, zone: &str, vm: &str) -> ComputeResult<Operation> {
        let mut state = self.record(ComputeCall::DeleteVm {
            zone: zone.to_string(),
            vm: vm.to_string(),
        });
        state
            .vms
            .remove(&(zone.to_string(), vm.to_string()))
            .ok_or_else(|| ComputeError::NotFound {
                resource: format!("instance {zone}/{vm}"),
            })?;
        Ok(Self::operation("delete-vm", vm))
    }

    async fn wait_operation(&self, _operation: &Operation) -> ComputeResult<()> {
        self.lock().waits += 1;
        Ok(())
    }
}

/// Disk fixture whose type URL is built from the mock API base.
pub fn mock_disk(name: &str, zone: &str, size_gb: u64, disk_type: &str) -> DiskMetadata {
    DiskMetadata {
        name: name.to_string(),
        size_gb,
        disk_type: format!(
            "{MOCK_API_BASE}/projects/{MOCK_PROJECT}/zones/{zone}/diskTypes/{disk_type}"
        ),
        self_link: format!("{MOCK_API_BASE}/projects/{MOCK_PROJECT}/zones/{zone}/disks/{name}"),
        labels: HashMap::new(),
    }
}

/// Snapshot fixture; `created` is RFC 3339.
///
/// # Panics
///
/// Panics if `created` does not parse.
pub fn mock_snapshot(
    name: &str,
    created: &str,
    disk_size_gb: u64,
    labels: &[(&str, &str)],
) -> SnapshotMetadata {
    SnapshotMetadata {
        name: name.to_string(),
        creation_timestamp: DateTime::<FixedOffset>::parse_from_rfc3339(created)
            .unwrap_or_else(|e| panic!("invalid fixture timestamp '{created}': {e}")),
        disk_size_gb,
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        self_link: name.to_string(),
        storage_locations: Vec::new(),
        source_disk: None,
    }
}

/// Instance fixture attaching the given device names.
pub fn mock_vm(name: &str, device_names: &[&str]) -> VmMetadata {
    VmMetadata {
        name: name.to_string(),
        status: "RUNNING".to_string(),
        disks: device_names
            .iter()
            .map(|d| AttachedDisk {
                device_name: d.to_string(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}
