use futures_util::future::join_all;

use super::error::{GcError, GcResult};
use crate::compute::{Compute, SnapshotHandle};
use crate::labels::{SnapshotFilter, disk_name_label_value};
use crate::lifecycle::manager::snapshots_with_metadata;
use crate::lifecycle::sort_by_creation;

/// Snapshots whose `label_key` equals `"{zone}_{disk_name}"`, matched as a quoted literal.
pub async fn list_snapshots_for_disk(
    compute: &Compute,
    label_key: &str,
    disk_name: &str,
    zone: &str,
) -> GcResult<Vec<SnapshotHandle>> {
    let filter =
        SnapshotFilter::label_equals_quoted(label_key, disk_name_label_value(zone, disk_name));
    Ok(compute.snapshots(&filter).await?)
}

/// Deletes all but the newest `retain` snapshots of a disk; `retain` is at least 1.
///
/// Returns the names of the deleted snapshots, oldest first. Every deletion runs to
/// completion; failures come back together as [`GcError::PruneFailed`].
pub async fn prune_old_snapshots(
    compute: &Compute,
    label_key: &str,
    disk_name: &str,
    zone: &str,
    retain: usize,
) -> GcResult<Vec<String>> {
    let retain = retain.max(1);
    let snapshots = list_snapshots_for_disk(compute, label_key, disk_name, zone).await?;
    if snapshots.len() <= retain {
        tracing::debug!(
            disk = disk_name,
            zone,
            count = snapshots.len(),
            retain,
            "Nothing to prune"
        );
        return Ok(Vec::new());
    }

    let mut entries = snapshots_with_metadata(snapshots).await?;
    sort_by_creation(&mut entries);
    let excess = entries.len() - retain;
    let doomed: Vec<SnapshotHandle> = entries
        .into_iter()
        .take(excess)
        .map(|(snapshot, _)| snapshot)
        .collect();

    tracing::info!(disk = disk_name, zone, count = excess, retain, "Pruning snapshots");
    let results = join_all(doomed.iter().map(|snapshot| async move {
        (snapshot.name().to_string(), snapshot.delete().await)
    }))
    .await;

    let mut deleted = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(()) => deleted.push(name),
            Err(e) => {
                tracing::error!(
                    disk = disk_name,
                    zone,
                    snapshot = %name,
                    error = %e,
                    "Snapshot deletion failed"
                );
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        return Ok(deleted);
    }
    Err(GcError::PruneFailed {
        disk: disk_name.to_string(),
        zone: zone.to_string(),
        failed: failures.len(),
        deleted,
        details: failures.join("; "),
    })
}
