use thiserror::Error;

/// Rejected command-line values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("invalid accelerator '{0}': expected <type>=<count>")]
    InvalidAccelerator(String),

    #[error("invalid accelerator count '{count}' for '{device_type}'")]
    InvalidAcceleratorCount { device_type: String, count: String },

    #[error("invalid memory size '{0}': expected a positive number of GB")]
    InvalidMemory(String),

    #[error("The value is not boolean: {0}")]
    NotBoolean(String),
}

pub type CliResult<T> = Result<T, CliError>;
