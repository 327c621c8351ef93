use std::sync::Arc;

use chrono::{FixedOffset, TimeZone, Utc};

use super::*;
use crate::compute::{Compute, ComputeCall, MockComputeApi, mock_disk, mock_snapshot};
use crate::config::{Settings, SettingsLayers};
use crate::lifecycle::{LifecycleConfig, MachineType};

const ZONE: &str = "us-west1-b";

fn commands(mock: &Arc<MockComputeApi>, zone: Option<&str>) -> DiskCommands {
    let settings = SettingsLayers::new()
        .push(Settings {
            zone: zone.map(str::to_string),
            vcpu: Some(2),
            memory_gb: Some(8.0),
            ..Default::default()
        })
        .resolve();
    DiskCommands::new(
        DiskLifecycle::new(
            Compute::new(mock.clone()),
            LifecycleConfig::for_testing(MockComputeApi::api_base()),
        ),
        "work",
        settings,
    )
}

#[test]
fn test_snapshot_name_format() {
    let at = Utc.with_ymd_and_hms(2019, 3, 7, 12, 0, 0).unwrap();
    assert_eq!(snapshot_name("work", &at), "work-2019-3-7-16958064600");
}

#[test]
fn test_snapshot_name_uses_given_calendar() {
    // Same instant, but already the next day east of UTC.
    let utc = Utc.with_ymd_and_hms(2020, 12, 31, 20, 0, 0).unwrap();
    let tokyo = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());

    let name = snapshot_name("d", &tokyo);
    assert!(name.starts_with("d-2021-1-1-"));
    assert!(name.ends_with(&format!("{:x}", utc.timestamp_millis())));
}

#[tokio::test]
async fn test_launch_restores_creates_and_starts() {
    let mock = Arc::new(MockComputeApi::new().with_snapshot(mock_snapshot(
        "work-old",
        "2024-01-01T00:00:00Z",
        40,
        &[
            ("diskName", "us-west1-b_work"),
            ("project", "proj"),
            ("diskType", "pd-ssd"),
        ],
    )));

    commands(&mock, Some(ZONE)).launch().await.unwrap();

    let kinds: Vec<&str> = mock
        .mutations()
        .iter()
        .map(|call| match call {
            ComputeCall::InsertDisk { .. } => "insert-disk",
            ComputeCall::InsertVm { .. } => "insert-vm",
            ComputeCall::StartVm { .. } => "start",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["insert-disk", "insert-vm", "start"]);

    let vm = mock.vm(ZONE, "work").unwrap();
    assert_eq!(vm.machine_type, "custom-2-8192");
    assert_eq!(vm.status, "RUNNING");
    assert_eq!(mock.disk(ZONE, "work").unwrap().size_gb, 40);
}

#[tokio::test]
async fn test_terminate_sequence() {
    let mock =
        Arc::new(MockComputeApi::new().with_disk(ZONE, mock_disk("work", ZONE, 10, "pd-ssd")));
    let commands = commands(&mock, Some(ZONE));
    commands.launch().await.unwrap();
    let launched = mock.mutations().len();

    let snapshot = commands.terminate().await.unwrap();

    let after: Vec<ComputeCall> = mock.mutations().into_iter().skip(launched).collect();
    assert_eq!(after.len(), 3);
    assert!(matches!(&after[0], ComputeCall::StopVm { vm, .. } if vm == "work"));
    assert!(matches!(&after[1], ComputeCall::DeleteVm { vm, .. } if vm == "work"));
    assert!(matches!(
        &after[2],
        ComputeCall::CreateSnapshot { disk, snapshot: name, .. }
            if disk == "work" && *name == snapshot
    ));
    assert!(snapshot.starts_with("work-"));

    assert!(mock.vm(ZONE, "work").is_none());
    assert!(mock.disk(ZONE, "work").is_some());
    assert!(mock.snapshot(&snapshot).is_some());
}

#[tokio::test]
async fn test_pause_resume_ip() {
    let mock =
        Arc::new(MockComputeApi::new().with_disk(ZONE, mock_disk("work", ZONE, 10, "pd-ssd")));
    let commands = commands(&mock, Some(ZONE));
    commands.launch().await.unwrap();

    commands.pause().await.unwrap();
    assert_eq!(mock.vm(ZONE, "work").unwrap().status, "TERMINATED");

    commands.resume().await.unwrap();
    assert_eq!(mock.vm(ZONE, "work").unwrap().status, "RUNNING");

    assert_eq!(commands.ip_address().await.unwrap(), "203.0.113.1");
}

#[tokio::test]
async fn test_missing_zone_is_rejected_before_any_call() {
    let mock = Arc::new(MockComputeApi::new());
    let commands = commands(&mock, None);

    assert!(matches!(
        commands.launch().await,
        Err(LifecycleError::Config(_))
    ));
    assert!(matches!(
        commands.terminate().await,
        Err(LifecycleError::Config(_))
    ));
    assert!(mock.calls().is_empty());
    assert_eq!(
        commands.settings().machine_type,
        MachineType::Custom {
            vcpu: 2,
            memory_gb: 8.0
        }
    );
}
