//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating, reading or interpreting config files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON is well formed but a key has the wrong shape.
    #[error("invalid configuration in {path}: {source}")]
    InvalidValue {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `memory` must be a positive number of GB.
    #[error("invalid memory size {value} in {path}: expected a positive number of GB")]
    InvalidMemory { path: PathBuf, value: f64 },

    /// Neither the config-dir override nor `HOME` is set.
    #[error("cannot locate the home directory: set HOME or {name}")]
    NoHomeDir { name: &'static str },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
