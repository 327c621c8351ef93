//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use gcp_vm::compute::mock_snapshot;
use gcp_vm::{
    Compute, DiskCommands, DiskLifecycle, LifecycleConfig, MockComputeApi, Settings,
    SettingsLayers,
};

pub const ZONE: &str = "asia-northeast1-b";
pub const LABEL_PREFIX: &str = "gcp_vm";

pub fn lifecycle(mock: &Arc<MockComputeApi>) -> DiskLifecycle {
    DiskLifecycle::new(
        Compute::new(mock.clone()),
        LifecycleConfig::new(MockComputeApi::api_base(), LABEL_PREFIX),
    )
}

pub fn commands(mock: &Arc<MockComputeApi>, disk: &str, zone: &str) -> DiskCommands {
    let settings = SettingsLayers::new()
        .push(Settings {
            zone: Some(zone.to_string()),
            ..Default::default()
        })
        .resolve();
    DiskCommands::new(lifecycle(mock), disk, settings)
}

/// Snapshot labeled the way the lifecycle labels its own snapshots.
pub fn labeled_snapshot(
    name: &str,
    created: &str,
    disk: &str,
    zone: &str,
) -> gcp_vm::compute::SnapshotMetadata {
    let disk_label = format!("{zone}_{disk}");
    mock_snapshot(
        name,
        created,
        20,
        &[
            ("gcp_vm__disk_name", disk_label.as_str()),
            ("gcp_vm__project", "mock-project"),
            ("gcp_vm__disk_type", "pd-standard"),
        ],
    )
}
