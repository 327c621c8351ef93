//! Pub/Sub style trigger events: `{"data": "<base64 JSON>"}`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::{GcError, GcResult};
use crate::constants::DEFAULT_LABEL_PREFIX;
use crate::labels::LabelKeys;

#[derive(Debug, Clone, Deserialize)]
pub struct PubSubEvent {
    pub data: String,
}

impl PubSubEvent {
    pub fn from_json(raw: &str) -> GcResult<Self> {
        serde_json::from_str(raw).map_err(|e| GcError::InvalidPayload(e.to_string()))
    }

    /// Base64-decodes `data` and parses it as JSON.
    pub fn payload<T: DeserializeOwned>(&self) -> GcResult<T> {
        let bytes = STANDARD
            .decode(self.data.trim())
            .map_err(|e| GcError::InvalidPayload(format!("data is not base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| GcError::InvalidPayload(e.to_string()))
    }
}

/// `[diskName, zone]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiskRef(pub String, pub String);

impl DiskRef {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn zone(&self) -> &str {
        &self.1
    }
}

impl std::fmt::Display for DiskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.1, self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteDisksPayload {
    disks: Option<Vec<DiskRef>>,
}

impl DeleteDisksPayload {
    pub fn disks(&self) -> GcResult<&[DiskRef]> {
        self.disks
            .as_deref()
            .ok_or(GcError::MissingParameter { name: "disks" })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneSnapshotsPayload {
    disks: Option<Vec<DiskRef>>,
    max_num_of_snapshots: Option<i64>,
    label_prefix: Option<String>,
}

impl PruneSnapshotsPayload {
    pub fn disks(&self) -> GcResult<&[DiskRef]> {
        self.disks
            .as_deref()
            .ok_or(GcError::MissingParameter { name: "disks" })
    }

    /// Snapshots to keep per disk, clamped to at least 1.
    pub fn retain(&self) -> GcResult<usize> {
        let max = self
            .max_num_of_snapshots
            .ok_or(GcError::MissingParameter {
                name: "maxNumOfSnapshots",
            })?;
        Ok(usize::try_from(max).unwrap_or(0).max(1))
    }

    pub fn label_prefix(&self) -> &str {
        self.label_prefix.as_deref().unwrap_or(DEFAULT_LABEL_PREFIX)
    }

    /// Key of the disk-name label for this payload's prefix.
    pub fn disk_name_label(&self) -> String {
        LabelKeys::with_prefix(self.label_prefix()).disk_name
    }
}
