use thiserror::Error;

use crate::compute::ComputeError;
use crate::labels::LabelError;

#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Restore found no snapshot labeled for the disk; there is nothing to rebuild from.
    #[error("There are no snapshots corresponding to {disk} in {zone}")]
    NoSnapshotFound { disk: String, zone: String },

    #[error("instance {vm} in {zone} has no external IP address")]
    NoPublicIp { vm: String, zone: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
