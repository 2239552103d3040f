// src/model/filter.rs
use serde::{Deserialize, Serialize};

/// A filterable field with the values currently selected for it.
///
/// An empty `filter_values` means the filter is not applied: it must not
/// be rendered into a query at all, so an unfiltered dimension never
/// restricts results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFilter {
    /// Column name on the metric's source table.
    pub field: String,
    /// Display label; defaults to the field name.
    pub label: String,
    #[serde(default)]
    pub filter_values: Vec<String>,
}

impl MetricFilter {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            label: field.to_string(),
            filter_values: Vec::new(),
        }
    }

    pub fn with_values<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.to_string(),
            label: field.to_string(),
            filter_values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this filter carries at least one selected value.
    pub fn is_applied(&self) -> bool {
        !self.filter_values.is_empty()
    }
}
