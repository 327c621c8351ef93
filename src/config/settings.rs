//! Per-field layered resolution of launch settings.

use super::DiskConfig;
use crate::constants::DEFAULT_MACHINE_TYPE;
use crate::lifecycle::{Accelerator, MachineOptions, MachineType};

/// One source of settings. `None` means "not set here, ask the next layer".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub zone: Option<String>,
    pub machine_type: Option<String>,
    pub vcpu: Option<u32>,
    pub memory_gb: Option<f64>,
    pub accelerators: Option<Vec<Accelerator>>,
    pub preemptible: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub project: Option<String>,
}

impl Settings {
    /// Machine type set by this layer.
    ///
    /// A named type wins over a vCPU/memory pair, and a pair needs both halves.
    pub fn machine_type(&self) -> Option<MachineType> {
        if let Some(name) = self.machine_type.as_ref().filter(|n| !n.is_empty()) {
            return Some(MachineType::Named(name.clone()));
        }
        match (self.vcpu, self.memory_gb) {
            (Some(vcpu), Some(memory_gb)) => Some(MachineType::Custom { vcpu, memory_gb }),
            _ => None,
        }
    }
}

impl From<DiskConfig> for Settings {
    fn from(config: DiskConfig) -> Self {
        Self {
            zone: config.zone,
            machine_type: config.machine_type,
            vcpu: config.vcpu,
            memory_gb: config.memory,
            accelerators: config.accelerators,
            preemptible: config.preemptible,
            tags: config.tags,
            project: config.project,
        }
    }
}

/// Settings after every layer has been consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    /// Empty when no layer names a zone.
    pub zone: String,
    pub machine_type: MachineType,
    pub options: MachineOptions,
    pub project: Option<String>,
}

/// Ordered settings sources, highest precedence first.
#[derive(Debug, Clone, Default)]
pub struct SettingsLayers {
    layers: Vec<Settings>,
}

impl SettingsLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer below the ones already added.
    pub fn push(mut self, layer: impl Into<Settings>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// First value any layer provides for a field.
    fn first<T>(&self, field: impl Fn(&Settings) -> Option<T>) -> Option<T> {
        self.layers.iter().find_map(field)
    }

    pub fn resolve(&self) -> ResolvedSettings {
        ResolvedSettings {
            zone: self.first(|s| s.zone.clone()).unwrap_or_default(),
            machine_type: self
                .first(Settings::machine_type)
                .unwrap_or_else(|| MachineType::Named(DEFAULT_MACHINE_TYPE.to_string())),
            options: MachineOptions {
                accelerators: self.first(|s| s.accelerators.clone()).unwrap_or_default(),
                preemptible: self.first(|s| s.preemptible).unwrap_or(false),
                tags: self.first(|s| s.tags.clone()).unwrap_or_default(),
            },
            project: self.first(|s| s.project.clone()),
        }
    }
}
