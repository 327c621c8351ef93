use std::fmt;

/// How the right-hand side of a label equality is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    /// `labels.key=value`
    Bare,
    /// `labels.key="value"`
    Quoted,
}

/// Label equality filter for snapshot list queries.
///
/// The restorer and the retention job historically render different forms; both are kept
/// so each caller sends exactly what it always has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFilter {
    key: String,
    value: String,
    form: FilterValue,
}

impl SnapshotFilter {
    /// `labels.{key}={value}`
    pub fn label_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            form: FilterValue::Bare,
        }
    }

    /// `labels.{key}="{value}"`
    pub fn label_equals_quoted(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            form: FilterValue::Quoted,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn form(&self) -> FilterValue {
        self.form
    }

    /// Returns `true` if `labels` satisfies the filter.
    pub fn matches(&self, labels: &std::collections::HashMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|v| v == &self.value)
    }

    /// Renders the provider's filter expression.
    pub fn render(&self) -> String {
        match self.form {
            FilterValue::Bare => format!("labels.{}={}", self.key, self.value),
            FilterValue::Quoted => format!("labels.{}=\"{}\"", self.key, self.value),
        }
    }
}

impl fmt::Display for SnapshotFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
