use std::collections::HashMap;
use std::sync::Arc;

use super::config::LifecycleConfig;
use super::error::LifecycleError;
use super::manager::{DiskLifecycle, machine_spec};
use super::types::{Accelerator, MachineOptions, MachineType};
use crate::compute::{
    Compute, ComputeApi, ComputeCall, DiskSpec, MockComputeApi, SnapshotMetadata, mock_disk,
    mock_snapshot, mock_vm,
};
use crate::labels::LabelError;

const ZONE: &str = "us-central1-a";

fn lifecycle(mock: &Arc<MockComputeApi>) -> DiskLifecycle {
    DiskLifecycle::new(
        Compute::new(mock.clone()),
        LifecycleConfig::for_testing(MockComputeApi::api_base()),
    )
}

fn labeled(name: &str, created: &str, size: u64) -> SnapshotMetadata {
    mock_snapshot(
        name,
        created,
        size,
        &[
            ("diskName", "us-central1-a_work"),
            ("project", "proj"),
            ("diskType", "pd-ssd"),
        ],
    )
}

#[tokio::test]
async fn test_restore_existing_disk_is_noop() {
    let mock = Arc::new(
        MockComputeApi::new()
            .with_disk(ZONE, mock_disk("work", ZONE, 50, "pd-standard"))
            .with_snapshot(labeled("work-1", "2024-01-01T00:00:00Z", 10)),
    );

    lifecycle(&mock).restore_disk("work", ZONE).await.unwrap();

    assert!(mock.mutations().is_empty());
    assert_eq!(mock.disk(ZONE, "work").unwrap().size_gb, 50);
}

#[tokio::test]
async fn test_restore_picks_newest_snapshot() {
    let mock = Arc::new(
        MockComputeApi::new()
            .with_snapshot(labeled("work-b", "2024-03-01T00:00:00Z", 30))
            .with_snapshot(labeled("work-a", "2024-01-01T00:00:00Z", 10))
            .with_snapshot(labeled("work-c", "2024-02-01T00:00:00-08:00", 20)),
    );

    lifecycle(&mock).restore_disk("work", ZONE).await.unwrap();

    let expected = DiskSpec {
        size_gb: 30,
        source_snapshot: "work-b".to_string(),
        disk_type: format!(
            "{}/projects/proj/zones/{ZONE}/diskTypes/pd-ssd",
            MockComputeApi::api_base()
        ),
    };
    assert_eq!(
        mock.mutations(),
        vec![ComputeCall::InsertDisk {
            zone: ZONE.to_string(),
            disk: "work".to_string(),
            spec: expected,
        }]
    );
    assert_eq!(mock.waits(), 1);
}

#[tokio::test]
async fn test_restore_ignores_other_zones() {
    let mock = Arc::new(MockComputeApi::new().with_snapshot(mock_snapshot(
        "elsewhere",
        "2024-01-01T00:00:00Z",
        10,
        &[("diskName", "europe-west1-b_work")],
    )));

    let err = lifecycle(&mock)
        .restore_disk("work", ZONE)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NoSnapshotFound { .. }));
    assert_eq!(
        err.to_string(),
        "There are no snapshots corresponding to work in us-central1-a"
    );
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn test_restore_uses_unquoted_filter() {
    let mock = Arc::new(MockComputeApi::new());
    let _ = lifecycle(&mock).restore_disk("work", ZONE).await;

    assert!(mock.calls().contains(&ComputeCall::ListSnapshots {
        filter: "labels.diskName=us-central1-a_work".to_string(),
    }));
}

#[tokio::test]
async fn test_create_snapshot_labels() {
    let mock = Arc::new(MockComputeApi::new().with_disk(
        "europe-west4-b",
        mock_disk("data", "europe-west4-b", 200, "pd-balanced"),
    ));

    lifecycle(&mock)
        .create_snapshot("data", "data-2024-5-6-18f4", "europe-west4-b")
        .await
        .unwrap();

    let snapshot = mock.snapshot("data-2024-5-6-18f4").unwrap();
    let expected: HashMap<String, String> = [
        ("diskName", "europe-west4-b_data"),
        ("project", "mock-project"),
        ("diskType", "pd-balanced"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(snapshot.labels, expected);
    assert_eq!(snapshot.storage_locations, vec!["europe-west4".to_string()]);
    assert_eq!(snapshot.disk_size_gb, 200);
    assert_eq!(mock.waits(), 1);
}

#[tokio::test]
async fn test_snapshot_then_restore_round_trip() {
    let mock = Arc::new(
        MockComputeApi::new().with_disk(ZONE, mock_disk("work", ZONE, 64, "pd-ssd")),
    );
    let lifecycle = lifecycle(&mock);

    lifecycle
        .create_snapshot("work", "work-snap", ZONE)
        .await
        .unwrap();
    mock.delete_disk(ZONE, "work").await.unwrap();
    lifecycle.restore_disk("work", ZONE).await.unwrap();

    let restored = mock.disk(ZONE, "work").unwrap();
    assert_eq!(restored.size_gb, 64);
    assert_eq!(
        restored.disk_type,
        mock_disk("work", ZONE, 64, "pd-ssd").disk_type
    );
}

#[tokio::test]
async fn test_create_snapshot_rejects_foreign_disk_type() {
    let mut disk = mock_disk("work", ZONE, 10, "pd-ssd");
    disk.disk_type = "https://other.example/v1/projects/p/zones/z/diskTypes/t".to_string();
    let mock = Arc::new(MockComputeApi::new().with_disk(ZONE, disk));

    let err = lifecycle(&mock)
        .create_snapshot("work", "snap", ZONE)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Label(LabelError::InvalidResourceUrl { .. })
    ));
    assert!(mock.mutations().is_empty());
}

#[test]
fn test_memory_validity() {
    assert!(MachineType::is_valid_memory_gb(0.25));
    assert!(!MachineType::is_valid_memory_gb(0.0));
    assert!(!MachineType::is_valid_memory_gb(-1.0));
    assert!(!MachineType::is_valid_memory_gb(f64::NAN));
    assert!(!MachineType::is_valid_memory_gb(f64::INFINITY));
}

#[test]
fn test_custom_machine_type() {
    let custom = MachineType::Custom {
        vcpu: 24,
        memory_gb: 100.0,
    };
    assert_eq!(custom.resolve(), "custom-24-102400");

    let fractional = MachineType::Custom {
        vcpu: 2,
        memory_gb: 7.5,
    };
    assert_eq!(fractional.resolve(), "custom-2-7680");

    let named = MachineType::Named("n1-highmem-8".to_string());
    assert_eq!(named.resolve(), "n1-highmem-8");
    assert_eq!(named.to_string(), "n1-highmem-8");
}

#[test]
fn test_machine_spec_shape() {
    let options = MachineOptions {
        accelerators: vec![Accelerator {
            device_type: "nvidia-tesla-t4".to_string(),
            count: 2,
        }],
        preemptible: true,
        tags: vec!["http-server".to_string(), "ssh".to_string()],
    };
    let spec = machine_spec(
        "work",
        "https://mock.compute/v1/disks/work",
        &MachineType::Named("n1-standard-4".to_string()),
        &options,
    );

    assert_eq!(spec.machine_type, "n1-standard-4");
    assert_eq!(spec.disks.len(), 1);
    let disk = &spec.disks[0];
    assert!(disk.boot);
    assert!(!disk.auto_delete);
    assert_eq!(disk.mode.as_deref(), Some("READ_WRITE"));
    assert_eq!(disk.device_name, "work");
    assert_eq!(disk.source, "https://mock.compute/v1/disks/work");

    assert_eq!(spec.guest_accelerators.len(), 1);
    assert_eq!(spec.guest_accelerators[0].accelerator_type, "nvidia-tesla-t4");
    assert_eq!(spec.guest_accelerators[0].accelerator_count, 2);

    assert_eq!(spec.network_interfaces.len(), 1);
    let access = &spec.network_interfaces[0].access_configs;
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].access_type.as_deref(), Some("ONE_TO_ONE_NAT"));

    assert!(!spec.scheduling.automatic_restart);
    assert_eq!(spec.scheduling.on_host_maintenance, "TERMINATE");
    assert!(spec.scheduling.preemptible);
    assert_eq!(spec.tags.items, vec!["http-server", "ssh"]);
}

#[tokio::test]
async fn test_machine_lifecycle() {
    let mock = Arc::new(
        MockComputeApi::new().with_disk(ZONE, mock_disk("work", ZONE, 10, "pd-ssd")),
    );
    let lifecycle = lifecycle(&mock);
    let custom = MachineType::Custom {
        vcpu: 4,
        memory_gb: 16.0,
    };

    lifecycle
        .create_machine("work", "work", ZONE, &custom, &MachineOptions::default())
        .await
        .unwrap();
    let vm = mock.vm(ZONE, "work").unwrap();
    assert_eq!(vm.machine_type, "custom-4-16384");
    assert!(vm.attaches("work"));

    lifecycle.stop_machine("work", ZONE).await.unwrap();
    assert_eq!(mock.vm(ZONE, "work").unwrap().status, "TERMINATED");

    lifecycle.start_machine("work", ZONE).await.unwrap();
    assert_eq!(mock.vm(ZONE, "work").unwrap().status, "RUNNING");

    lifecycle.delete_machine("work", ZONE).await.unwrap();
    assert!(mock.vm(ZONE, "work").is_none());
    assert!(mock.disk(ZONE, "work").is_some());
    assert_eq!(mock.waits(), 4);
}

#[tokio::test]
async fn test_create_machine_without_disk_fails() {
    let mock = Arc::new(MockComputeApi::new());

    let err = lifecycle(&mock)
        .create_machine(
            "work",
            "work",
            ZONE,
            &MachineType::Named("n1-standard-1".to_string()),
            &MachineOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Compute(ref e) if e.is_not_found()));
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn test_public_ip_address() {
    let mock = Arc::new(
        MockComputeApi::new().with_disk(ZONE, mock_disk("work", ZONE, 10, "pd-ssd")),
    );
    let lifecycle = lifecycle(&mock);
    lifecycle
        .create_machine(
            "work",
            "work",
            ZONE,
            &MachineType::Named("n1-standard-1".to_string()),
            &MachineOptions::default(),
        )
        .await
        .unwrap();

    let ip = lifecycle.public_ip_address("work", ZONE).await.unwrap();
    assert_eq!(ip, "203.0.113.1");
}

#[tokio::test]
async fn test_public_ip_missing() {
    let mock = Arc::new(MockComputeApi::new().with_vm(ZONE, mock_vm("bare", &["bare"])));

    let err = lifecycle(&mock)
        .public_ip_address("bare", ZONE)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NoPublicIp { .. }));
}
