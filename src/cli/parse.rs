//! Value parsers for list- and flag-shaped options.

use super::error::{CliError, CliResult};
use crate::lifecycle::{Accelerator, MachineType};

/// Parsed `--accelerator` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceleratorList(pub Vec<Accelerator>);

/// Parsed `--tags` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(pub Vec<String>);

/// `type=count[,type=count...]`. Empty items are skipped.
pub fn parse_accelerators(value: &str) -> CliResult<AcceleratorList> {
    let mut accelerators = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (device_type, count) = item
            .split_once('=')
            .ok_or_else(|| CliError::InvalidAccelerator(item.to_string()))?;
        let count = count
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidAcceleratorCount {
                device_type: device_type.to_string(),
                count: count.to_string(),
            })?;
        accelerators.push(Accelerator {
            device_type: device_type.trim().to_string(),
            count,
        });
    }
    Ok(AcceleratorList(accelerators))
}

/// `tag1[,tag2...]`
pub fn parse_tags(value: &str) -> CliResult<TagList> {
    Ok(TagList(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Memory in GB for a custom machine type; fractions allowed.
pub fn parse_memory(value: &str) -> CliResult<f64> {
    value
        .trim()
        .parse()
        .ok()
        .filter(|gb| MachineType::is_valid_memory_gb(*gb))
        .ok_or_else(|| CliError::InvalidMemory(value.to_string()))
}

/// Only the literals `true` and `false`.
pub fn parse_bool(value: &str) -> CliResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CliError::NotBoolean(other.to_string())),
    }
}
