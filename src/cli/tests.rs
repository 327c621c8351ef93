use clap::Parser;

use super::*;
use crate::lifecycle::{Accelerator, MachineType};

#[test]
fn test_parse_accelerators() {
    let parsed = parse_accelerators("nvidia-tesla-k80=2,nvidia-tesla-t4=1").unwrap();
    assert_eq!(
        parsed.0,
        vec![
            Accelerator {
                device_type: "nvidia-tesla-k80".to_string(),
                count: 2,
            },
            Accelerator {
                device_type: "nvidia-tesla-t4".to_string(),
                count: 1,
            },
        ]
    );

    assert_eq!(parse_accelerators("").unwrap(), AcceleratorList::default());
    assert_eq!(parse_accelerators("a=1,,").unwrap().0.len(), 1);
}

#[test]
fn test_parse_accelerators_rejects_garbage() {
    assert_eq!(
        parse_accelerators("gpu"),
        Err(CliError::InvalidAccelerator("gpu".to_string()))
    );
    assert!(matches!(
        parse_accelerators("gpu=lots"),
        Err(CliError::InvalidAcceleratorCount { .. })
    ));
}

#[test]
fn test_parse_tags() {
    assert_eq!(
        parse_tags("http-server,ssh").unwrap().0,
        vec!["http-server", "ssh"]
    );
    assert!(parse_tags("").unwrap().0.is_empty());
}

#[test]
fn test_parse_bool_is_strict() {
    assert_eq!(parse_bool("true"), Ok(true));
    assert_eq!(parse_bool("false"), Ok(false));
    let err = parse_bool("yes").unwrap_err();
    assert_eq!(err.to_string(), "The value is not boolean: yes");
    assert!(parse_bool("True").is_err());
}

#[test]
fn test_parse_memory_rejects_non_positive() {
    assert_eq!(parse_memory("7.5"), Ok(7.5));
    for bad in ["0", "-1", "NaN", "inf", "lots"] {
        assert_eq!(
            parse_memory(bad),
            Err(CliError::InvalidMemory(bad.to_string())),
            "{bad}"
        );
    }
}

#[test]
fn test_bad_memory_value_is_rejected() {
    for value in ["--vmemory=-1", "--vmemory=NaN", "--memory=0"] {
        let result = Cli::try_parse_from(["gcp-vm", "launch", "work", "--vcpu", "2", value]);
        assert!(result.is_err(), "{value}");
    }
}

#[test]
fn test_launch_arguments() {
    let cli = Cli::try_parse_from([
        "gcp-vm",
        "--log-level",
        "debug",
        "launch",
        "work",
        "--zone",
        "us-east1-c",
        "--vcpu",
        "24",
        "--memory",
        "100",
        "--accelerator",
        "nvidia-tesla-v100=4",
        "--preemptible",
        "true",
        "--tags",
        "a,b",
    ])
    .unwrap();

    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.label_prefix, "gcp_vm");
    assert_eq!(cli.command.disk(), "work");

    let settings = cli.command.settings();
    assert_eq!(settings.zone.as_deref(), Some("us-east1-c"));
    assert_eq!(
        settings.machine_type(),
        Some(MachineType::Custom {
            vcpu: 24,
            memory_gb: 100.0
        })
    );
    assert_eq!(settings.accelerators.unwrap()[0].count, 4);
    assert_eq!(settings.preemptible, Some(true));
    assert_eq!(settings.tags, Some(vec!["a".to_string(), "b".to_string()]));
}

#[test]
fn test_unset_flags_stay_unset() {
    let cli = Cli::try_parse_from(["gcp-vm", "launch", "work"]).unwrap();
    assert_eq!(cli.command.settings(), Settings::default());
}

#[test]
fn test_simple_commands() {
    let cli = Cli::try_parse_from([
        "gcp-vm",
        "ip-address",
        "work",
        "--zone",
        "z",
        "--label-prefix",
        "lab",
    ])
    .unwrap();

    assert!(matches!(cli.command, Command::IpAddress(_)));
    assert_eq!(cli.label_prefix, "lab");
    assert_eq!(cli.command.settings().zone.as_deref(), Some("z"));

    for name in ["resume", "pause", "terminate"] {
        let cli = Cli::try_parse_from(["gcp-vm", name, "work"]).unwrap();
        assert_eq!(cli.command.disk(), "work");
        assert!(cli.command.settings().zone.is_none());
    }
}

#[test]
fn test_bad_preemptible_value_is_rejected() {
    let result = Cli::try_parse_from(["gcp-vm", "launch", "work", "--preemptible", "maybe"]);
    assert!(result.is_err());
}
