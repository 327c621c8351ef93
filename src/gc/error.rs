use thiserror::Error;

use crate::compute::ComputeError;

#[derive(Error, Debug)]
pub enum GcError {
    #[error("The disk \"{disk}\" does not exist in \"{zone}\"")]
    DiskNotFound { disk: String, zone: String },

    #[error("Skip deleting the disk (\"{disk}\") in \"{zone}\": a VM uses this disk")]
    DiskInUse { disk: String, zone: String },

    /// A required payload field is absent; the whole batch is rejected.
    #[error("missing parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    /// Some disks in a batch failed. Every sibling ran to completion first.
    #[error("{failed} of {total} disks failed: {details}")]
    BatchFailed {
        failed: usize,
        total: usize,
        details: String,
    },

    /// Some snapshot deletions of one disk failed; `deleted` lists the ones that went through.
    #[error("{failed} snapshot deletions failed for \"{disk}\" in \"{zone}\": {details}")]
    PruneFailed {
        disk: String,
        zone: String,
        failed: usize,
        deleted: Vec<String>,
        details: String,
    },

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

pub type GcResult<T> = Result<T, GcError>;
