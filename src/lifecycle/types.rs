use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compute::AcceleratorConfig;

/// Machine type: a named preset or a custom vCPU/memory shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineType {
    Named(String),
    Custom {
        vcpu: u32,
        /// Memory in GB; may be fractional.
        memory_gb: f64,
    },
}

impl MachineType {
    /// Memory sizes a custom machine type accepts: finite and above zero.
    pub fn is_valid_memory_gb(memory_gb: f64) -> bool {
        memory_gb.is_finite() && memory_gb > 0.0
    }

    /// Provider wire name: the preset unchanged, or `custom-{vcpu}-{memory MB}`.
    pub fn resolve(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Custom { vcpu, memory_gb } => {
                let memory_mb = (memory_gb * 1024.0).round() as u64;
                format!("custom-{vcpu}-{memory_mb}")
            }
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolve())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accelerator {
    pub device_type: String,
    pub count: u32,
}

impl From<&Accelerator> for AcceleratorConfig {
    fn from(a: &Accelerator) -> Self {
        Self {
            accelerator_type: a.device_type.clone(),
            accelerator_count: a.count,
        }
    }
}

/// Optional instance settings applied at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineOptions {
    pub accelerators: Vec<Accelerator>,
    pub preemptible: bool,
    pub tags: Vec<String>,
}
