//! Cross-cutting, shared constants.
//!
//! Label keys and values are persisted on cloud resources and must keep their exact shape
//! across releases: changing [`DEFAULT_LABEL_PREFIX`] or the key suffixes orphans every
//! snapshot taken by an earlier build.

use std::time::Duration;

/// Compute Engine v1 REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/compute/v1";

/// Prefix applied to every label key written by this tool.
pub const DEFAULT_LABEL_PREFIX: &str = "gcp_vm";

pub const DISK_NAME_LABEL_SUFFIX: &str = "__disk_name";
pub const PROJECT_LABEL_SUFFIX: &str = "__project";
pub const DISK_TYPE_LABEL_SUFFIX: &str = "__disk_type";

/// Machine type used when neither the command line nor the config file names one.
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-1";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Interval between polls of a pending zone/global operation.
pub const OPERATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Config directory override.
pub const ENV_CONFIG_DIR: &str = "GCP_VM_CONFIG_DIR";
/// Service-account key file, shared with the Google client libraries.
pub const ENV_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

pub const GLOBAL_CONFIG_FILENAME: &str = "global_config.json";
pub const DEFAULT_CREDENTIALS_FILENAME: &str = ".gcp-vm.json";
