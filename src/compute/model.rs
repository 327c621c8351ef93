//! Compute Engine resource shapes (the subset this tool reads and writes).
//!
//! Field names follow the v1 REST JSON encoding so the same types serve the HTTP client
//! and the in-memory mock.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Handle to a zone or global operation returned by every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub self_link: String,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
}

impl Operation {
    /// An operation that has already completed successfully.
    pub fn done(name: impl Into<String>, self_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            self_link: self_link.into(),
            status: OperationStatus::Done,
            error: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// Joined error messages, if the operation reported any.
    pub fn error_message(&self) -> Option<String> {
        let errors = self.error.as_ref()?;
        if errors.errors.is_empty() {
            return None;
        }
        let messages: Vec<String> = errors
            .errors
            .iter()
            .map(|e| {
                e.message
                    .clone()
                    .or_else(|| e.code.clone())
                    .unwrap_or_else(|| "unknown error".to_string())
            })
            .collect();
        Some(messages.join("; "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskMetadata {
    pub name: String,
    #[serde(default, with = "int64")]
    pub size_gb: u64,
    /// Disk-type URL, `{api}/projects/{p}/zones/{z}/diskTypes/{t}`.
    #[serde(rename = "type", default)]
    pub disk_type: String,
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Request body for creating a disk from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSpec {
    #[serde(with = "int64")]
    pub size_gb: u64,
    pub source_snapshot: String,
    #[serde(rename = "type")]
    pub disk_type: String,
}

/// Request body for snapshotting a disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    pub labels: HashMap<String, String>,
    pub storage_locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub name: String,
    pub creation_timestamp: DateTime<FixedOffset>,
    #[serde(default, with = "int64")]
    pub disk_size_gb: u64,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub storage_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_disk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub boot: bool,
    #[serde(default)]
    pub auto_delete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_tier: Option<String>,
    #[serde(rename = "natIP", default, skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    pub accelerator_type: String,
    pub accelerator_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    pub automatic_restart: bool,
    pub on_host_maintenance: String,
    pub preemptible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub items: Vec<String>,
}

/// Request body for creating an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSpec {
    pub machine_type: String,
    pub disks: Vec<AttachedDisk>,
    pub guest_accelerators: Vec<AcceleratorConfig>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub scheduling: Scheduling,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmMetadata {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub tags: Tags,
}

impl VmMetadata {
    /// Returns `true` if any attached disk uses `device_name`.
    pub fn attaches(&self, device_name: &str) -> bool {
        self.disks.iter().any(|d| d.device_name == device_name)
    }

    /// NAT IP of the first access config of the first network interface.
    pub fn public_ip(&self) -> Option<&str> {
        self.network_interfaces
            .first()?
            .access_configs
            .first()?
            .nat_ip
            .as_deref()
    }
}

/// int64 fields arrive as JSON strings; accept numbers too.
mod int64 {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}
