use futures_util::future::try_join_all;

use super::error::{GcError, GcResult};
use crate::compute::Compute;

/// `true` unless some VM in `zone` attaches a disk with device name `disk_name`.
pub async fn is_disk_deletable(compute: &Compute, disk_name: &str, zone: &str) -> GcResult<bool> {
    let vms = compute.zone(zone).vms().await?;
    let metadata = try_join_all(vms.iter().map(|vm| vm.metadata())).await?;

    match metadata.iter().find(|vm| vm.attaches(disk_name)) {
        Some(vm) => {
            tracing::debug!(disk = disk_name, zone, vm = %vm.name, "Disk is attached");
            Ok(false)
        }
        None => Ok(true),
    }
}

/// Deletes `disk_name` unless it is missing or attached to a VM.
pub async fn delete_disk_if_unused(compute: &Compute, disk_name: &str, zone: &str) -> GcResult<()> {
    let disk = compute.zone(zone).disk(disk_name);
    if !disk.exists().await? {
        return Err(GcError::DiskNotFound {
            disk: disk_name.to_string(),
            zone: zone.to_string(),
        });
    }

    if !is_disk_deletable(compute, disk_name, zone).await? {
        return Err(GcError::DiskInUse {
            disk: disk_name.to_string(),
            zone: zone.to_string(),
        });
    }

    tracing::info!(disk = disk_name, zone, "Deleting disk");
    disk.delete().await?;
    Ok(())
}
