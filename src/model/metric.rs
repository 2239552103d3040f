// src/model/metric.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::TimeGrain;
use crate::model::dimension::MetricDimension;
use crate::model::filter::MetricFilter;

/// How a metric's values should be presented by display layers.
///
/// The core never formats values; this tag travels with the descriptor so
/// consumers can pick currency/percentage/count formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Currency,
    Percentage,
    Count,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Currency => "currency",
            MetricType::Percentage => "percentage",
            MetricType::Count => "count",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A metric owner (business or data team contact).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: String,
    pub email: String,
}

/// The immutable definition of a metric.
///
/// Constructed once at catalog load with required fields enforced, then
/// treated as read-only for the duration of any query.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub label: String,
    pub metric_type: MetricType,
    pub category: String,
    /// Source schema.
    pub schema: String,
    /// Source table (warehouse model name).
    pub model: String,
    pub description: String,
    /// SQL aggregation expression over the source table's columns.
    pub sql: String,
    /// Timestamp column used for period bucketing.
    pub timestamp: String,
    pub business_owner: Person,
    pub data_team_owner: Person,
    /// Grains this metric may be explored at. Empty = all grains.
    pub time_grains: Vec<TimeGrain>,
    pub dimensions: Vec<MetricDimension>,
    /// Fields users may filter on.
    pub filters: Vec<MetricFilter>,
    /// The source rows already hold one computed value per period; the
    /// generator must not re-slice them to a day offset.
    pub is_pre_aggregated: bool,
    /// Running-total metric; partial periods carry legitimate
    /// accumulation and are never truncated to a completed boundary.
    pub is_cumulative_metric: bool,
    /// Downward movement is good (e.g. churn); display layers flip the
    /// sign treatment, the core computes values unchanged.
    pub is_inverted: bool,
}

impl Metric {
    /// Look up a declared dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&MetricDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Whether the metric may be explored at `grain`.
    pub fn supports_grain(&self, grain: TimeGrain) -> bool {
        self.time_grains.is_empty() || self.time_grains.contains(&grain)
    }
}
