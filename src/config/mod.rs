//! File-backed configuration.
//!
//! Two JSON files live in the config directory: `global_config.json` for process-wide
//! settings and `<disk>.json` for the settings of one disk. Values from the command line
//! take precedence over both; see [`SettingsLayers`].

pub mod error;
pub mod settings;


pub use error::{ConfigError, ConfigResult};
pub use settings::{ResolvedSettings, Settings, SettingsLayers};

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_CREDENTIALS_FILENAME, DEFAULT_LOG_LEVEL, ENV_APPLICATION_CREDENTIALS, ENV_CONFIG_DIR,
    GLOBAL_CONFIG_FILENAME,
};
use crate::lifecycle::{Accelerator, MachineType};

/// Directory holding the config files: `$GCP_VM_CONFIG_DIR`, else `~/.config/gcp-vm`.
pub fn config_dir() -> ConfigResult<PathBuf> {
    if let Some(dir) = non_empty_env(ENV_CONFIG_DIR) {
        return Ok(PathBuf::from(dir));
    }
    Ok(home_dir()?.join(".config").join("gcp-vm"))
}

/// Path of the per-disk config file.
pub fn disk_config_path(dir: &Path, disk_name: &str) -> PathBuf {
    dir.join(format!("{disk_name}.json"))
}

/// Reads a JSON config file. A missing file is an empty object.
pub async fn load(path: &Path) -> ConfigResult<Value> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Config file not found, using empty config");
            return Ok(Value::Object(Map::new()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Deep merge: objects merge key by key with `overlay` winning, anything else in
/// `overlay` (arrays included) replaces `base` outright.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    let Value::Object(overlay) = overlay else {
        return overlay.clone();
    };

    let mut merged = match base {
        Value::Object(base) => base.clone(),
        _ => Map::new(),
    };
    for (key, value) in overlay {
        let next = merge(merged.get(key).unwrap_or(&Value::Null), value);
        merged.insert(key.clone(), next);
    }
    Value::Object(merged)
}

/// Contents of a per-disk config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiskConfig {
    pub zone: Option<String>,
    pub machine_type: Option<String>,
    pub vcpu: Option<u32>,
    /// Memory in GB, paired with `vcpu` for a custom machine type.
    pub memory: Option<f64>,
    pub accelerators: Option<Vec<Accelerator>>,
    pub preemptible: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub project: Option<String>,
}

impl DiskConfig {
    /// Loads `<dir>/<disk_name>.json`.
    pub async fn load(dir: &Path, disk_name: &str) -> ConfigResult<Self> {
        let path = disk_config_path(dir, disk_name);
        tracing::debug!(path = %path.display(), "Loading disk config");
        let value = load(&path).await?;
        let config: Self =
            serde_json::from_value(value).map_err(|source| ConfigError::InvalidValue {
                path: path.clone(),
                source,
            })?;
        if let Some(memory) = config.memory.filter(|gb| !MachineType::is_valid_memory_gb(*gb)) {
            return Err(ConfigError::InvalidMemory {
                path,
                value: memory,
            });
        }
        Ok(config)
    }
}

/// Contents of `global_config.json` merged over the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    pub log_level: String,
    pub gcp_application_credentials: PathBuf,
}

impl GlobalConfig {
    /// Built-in defaults as a JSON object, the base layer of the merge.
    pub fn defaults() -> ConfigResult<Value> {
        let credentials = match non_empty_env(ENV_APPLICATION_CREDENTIALS) {
            Some(path) => PathBuf::from(path),
            None => home_dir()?.join(DEFAULT_CREDENTIALS_FILENAME),
        };
        Ok(serde_json::json!({
            "log-level": DEFAULT_LOG_LEVEL,
            "gcp-application-credentials": credentials.to_string_lossy(),
        }))
    }

    /// Loads `<dir>/global_config.json` over [`GlobalConfig::defaults`].
    pub async fn load(dir: &Path) -> ConfigResult<Self> {
        let path = dir.join(GLOBAL_CONFIG_FILENAME);
        tracing::debug!(path = %path.display(), "Loading global config");
        let merged = merge(&Self::defaults()?, &load(&path).await?);
        serde_json::from_value(merged).map_err(|source| ConfigError::InvalidValue { path, source })
    }
}

fn home_dir() -> ConfigResult<PathBuf> {
    non_empty_env("HOME")
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHomeDir {
            name: ENV_CONFIG_DIR,
        })
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
