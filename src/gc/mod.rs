//! Disk garbage collection and snapshot retention.
//!
//! Independent of the lifecycle commands; shares only the label scheme. Batch handlers
//! process every disk concurrently and report each failure once all have finished.

pub mod disks;
pub mod error;
pub mod event;
pub mod snapshots;


pub use disks::{delete_disk_if_unused, is_disk_deletable};
pub use error::{GcError, GcResult};
pub use event::{DeleteDisksPayload, DiskRef, PruneSnapshotsPayload, PubSubEvent};
pub use snapshots::{list_snapshots_for_disk, prune_old_snapshots};

use std::future::Future;

use futures_util::future::join_all;

use crate::compute::Compute;

/// Deletes every unused disk in the payload.
pub async fn handle_delete_disks(compute: &Compute, payload: &DeleteDisksPayload) -> GcResult<()> {
    let disks = payload.disks()?;
    run_batch(disks, |disk| delete_disk_if_unused(compute, disk.name(), disk.zone())).await?;
    tracing::info!(count = disks.len(), "Deleted disks");
    Ok(())
}

/// Prunes the snapshots of every disk in the payload. Returns the deleted snapshot names.
pub async fn handle_prune_snapshots(
    compute: &Compute,
    payload: &PruneSnapshotsPayload,
) -> GcResult<Vec<String>> {
    let disks = payload.disks()?;
    let retain = payload.retain()?;
    let label_key = payload.disk_name_label();

    let deleted = run_batch(disks, |disk| {
        prune_old_snapshots(compute, &label_key, disk.name(), disk.zone(), retain)
    })
    .await?;

    let deleted: Vec<String> = deleted.into_iter().flatten().collect();
    tracing::info!(count = deleted.len(), retain, "Pruned snapshots");
    Ok(deleted)
}

/// Runs `task` for each disk concurrently, collecting successes in input order.
///
/// Any failure becomes one [`GcError::BatchFailed`] naming every failed disk.
async fn run_batch<'a, T, F, Fut>(disks: &'a [DiskRef], task: F) -> GcResult<Vec<T>>
where
    F: Fn(&'a DiskRef) -> Fut,
    Fut: Future<Output = GcResult<T>>,
{
    let results = join_all(disks.iter().map(|disk| {
        let fut = task(disk);
        async move { (disk, fut.await) }
    }))
    .await;

    let mut succeeded = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (disk, result) in results {
        match result {
            Ok(value) => succeeded.push(value),
            Err(e) => {
                tracing::error!(disk = disk.name(), zone = disk.zone(), error = %e, "Disk failed");
                failures.push(format!("{disk}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        return Ok(succeeded);
    }
    Err(GcError::BatchFailed {
        failed: failures.len(),
        total: disks.len(),
        details: failures.join("; "),
    })
}
