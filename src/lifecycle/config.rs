use crate::constants::{DEFAULT_API_BASE, DEFAULT_LABEL_PREFIX};
use crate::labels::LabelKeys;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Settings shared by every lifecycle operation.
pub struct LifecycleConfig {
    /// API base that disk-type URLs are built from and validated against.
    pub api_base: String,
    /// Keys of the labels written onto snapshots.
    pub labels: LabelKeys,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            labels: LabelKeys::with_prefix(DEFAULT_LABEL_PREFIX),
        }
    }
}

impl LifecycleConfig {
    pub fn new(api_base: impl Into<String>, label_prefix: &str) -> Self {
        Self {
            api_base: api_base.into(),
            labels: LabelKeys::with_prefix(label_prefix),
        }
    }

    #[cfg(test)]
    pub fn for_testing(api_base: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
            labels: LabelKeys::new("diskName", "project", "diskType"),
        }
    }
}
