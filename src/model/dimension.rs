// src/model/dimension.rs
use serde::{Deserialize, Serialize};

/// A categorical dimension a metric can be sliced by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDimension {
    /// Column name on the metric's source table.
    pub name: String,
    /// Display label; defaults to the column name.
    pub label: String,
}

impl MetricDimension {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
        }
    }

    pub fn with_label(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}
