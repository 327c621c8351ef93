//! Label scheme shared by disks and snapshots.
//!
//! Snapshots carry three labels that tie them back to the disk and zone they were taken
//! from. There is no other index: restore and retention both find snapshots by filtering
//! on the disk-name label, so the encoding here must round-trip exactly.

pub mod error;
pub mod filter;


use std::collections::HashMap;

pub use error::{LabelError, LabelResult};
pub use filter::{FilterValue, SnapshotFilter};

use crate::constants::{
    DEFAULT_LABEL_PREFIX, DISK_NAME_LABEL_SUFFIX, DISK_TYPE_LABEL_SUFFIX, PROJECT_LABEL_SUFFIX,
};

/// The three label keys derived from a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelKeys {
    pub disk_name: String,
    pub project: String,
    pub disk_type: String,
}

impl LabelKeys {
    /// `{prefix}__disk_name`, `{prefix}__project`, `{prefix}__disk_type`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            disk_name: format!("{prefix}{DISK_NAME_LABEL_SUFFIX}"),
            project: format!("{prefix}{PROJECT_LABEL_SUFFIX}"),
            disk_type: format!("{prefix}{DISK_TYPE_LABEL_SUFFIX}"),
        }
    }

    /// Keys with literal names, mostly useful in tests.
    pub fn new(
        disk_name: impl Into<String>,
        project: impl Into<String>,
        disk_type: impl Into<String>,
    ) -> Self {
        Self {
            disk_name: disk_name.into(),
            project: project.into(),
            disk_type: disk_type.into(),
        }
    }

    /// Filter used by the restorer (unquoted value).
    pub fn restore_filter(&self, zone: &str, disk_name: &str) -> SnapshotFilter {
        SnapshotFilter::label_equals(&self.disk_name, disk_name_label_value(zone, disk_name))
    }

    /// Builds the label mapping written onto a new snapshot.
    pub fn encode(
        &self,
        zone: &str,
        disk_name: &str,
        disk_type: &DiskTypeRef,
    ) -> HashMap<String, String> {
        HashMap::from([
            (self.disk_name.clone(), disk_name_label_value(zone, disk_name)),
            (self.project.clone(), disk_type.project.clone()),
            (self.disk_type.clone(), disk_type.disk_type.clone()),
        ])
    }

    /// Reads project and disk type back out of a snapshot's labels.
    ///
    /// Missing entries decode as empty strings; the provider rejects the resulting URL.
    pub fn decode<'a>(&self, labels: &'a HashMap<String, String>) -> (&'a str, &'a str) {
        let project = labels.get(&self.project).map(String::as_str).unwrap_or("");
        let disk_type = labels.get(&self.disk_type).map(String::as_str).unwrap_or("");
        (project, disk_type)
    }
}

impl Default for LabelKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_LABEL_PREFIX)
    }
}

/// `"{zone}_{disk_name}"`
pub fn disk_name_label_value(zone: &str, disk_name: &str) -> String {
    format!("{zone}_{disk_name}")
}

/// Project, zone and type recovered from a disk-type URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskTypeRef {
    pub project: String,
    pub zone: String,
    pub disk_type: String,
}

impl DiskTypeRef {
    /// `{api_base}/projects/{project}/zones/{zone}/diskTypes/{disk_type}`
    pub fn to_url(&self, api_base: &str) -> String {
        disk_type_url(api_base, &self.project, &self.zone, &self.disk_type)
    }
}

/// `{api_base}/projects/{project}/zones/{zone}/diskTypes/{disk_type}`
pub fn disk_type_url(api_base: &str, project: &str, zone: &str, disk_type: &str) -> String {
    format!("{api_base}/projects/{project}/zones/{zone}/diskTypes/{disk_type}")
}

/// Parses a disk-type URL produced by the provider.
///
/// Only the API-base prefix is validated. The segments after `projects`, `zones` and
/// `diskTypes` are taken as-is; a URL with a different grammar yields empty or
/// unrelated values rather than an error.
pub fn parse_disk_type_url(api_base: &str, url: &str) -> LabelResult<DiskTypeRef> {
    let Some(rest) = url.strip_prefix(api_base) else {
        return Err(LabelError::InvalidResourceUrl {
            url: url.to_string(),
            expected_prefix: api_base.to_string(),
        });
    };

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let after = |marker: &str| -> String {
        segments
            .iter()
            .position(|s| *s == marker)
            .and_then(|i| segments.get(i + 1))
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    Ok(DiskTypeRef {
        project: after("projects"),
        zone: after("zones"),
        disk_type: after("diskTypes"),
    })
}

/// Region of a zone: everything before the last `-` (`us-central1-a` -> `us-central1`).
pub fn region_of_zone(zone: &str) -> &str {
    match zone.rfind('-') {
        Some(idx) => &zone[..idx],
        None => zone,
    }
}
