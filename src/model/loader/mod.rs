//! TOML metric-catalog loader.
//!
//! Catalog files hold loosely-typed metric records; this module parses
//! them and validates each record into an explicit [`Metric`] once, at
//! load time. Required fields are enforced here so nothing downstream
//! ever reaches for an optional key.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::calendar::{InvalidGrain, TimeGrain};
use crate::model::{Metric, MetricDimension, MetricFilter, MetricType, Person};

/// Errors raised while loading or validating a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Metric '{metric}' is missing required field '{field}'")]
    MissingField { metric: String, field: String },

    #[error("Metric '{metric}': {source}")]
    BadGrain {
        metric: String,
        source: InvalidGrain,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    metrics: Vec<MetricRecord>,
}

#[derive(Debug, Deserialize)]
struct MetricRecord {
    name: String,
    label: Option<String>,
    #[serde(rename = "type")]
    metric_type: MetricType,
    #[serde(default)]
    category: String,
    #[serde(default)]
    schema: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sql: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    business_owner: Person,
    #[serde(default)]
    data_team_owner: Person,
    #[serde(default)]
    time_grains: Vec<String>,
    #[serde(default)]
    dimensions: Vec<DimensionRecord>,
    #[serde(default)]
    filters: Vec<FilterRecord>,
    #[serde(default)]
    is_pre_aggregated: bool,
    #[serde(rename = "is_cumulative", default)]
    is_cumulative_metric: bool,
    #[serde(default)]
    is_inverted: bool,
}

#[derive(Debug, Deserialize)]
struct DimensionRecord {
    name: String,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilterRecord {
    field: String,
    label: Option<String>,
}

/// Parse catalog content into validated metrics.
pub fn parse_catalog(content: &str) -> Result<Vec<Metric>, CatalogError> {
    let file: CatalogFile = toml::from_str(content)?;
    file.metrics.into_iter().map(validate).collect()
}

/// Load and validate a catalog file from disk.
pub fn load_catalog_file<P: AsRef<Path>>(path: P) -> Result<Vec<Metric>, CatalogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let metrics = parse_catalog(&content)?;
    debug!(path = %path.display(), count = metrics.len(), "loaded catalog file");
    Ok(metrics)
}

fn validate(record: MetricRecord) -> Result<Metric, CatalogError> {
    let require = |value: &str, field: &str| -> Result<String, CatalogError> {
        if value.is_empty() {
            Err(CatalogError::MissingField {
                metric: record.name.clone(),
                field: field.to_string(),
            })
        } else {
            Ok(value.to_string())
        }
    };

    let name = require(&record.name, "name")?;
    let schema = require(&record.schema, "schema")?;
    let model = require(&record.model, "model")?;
    let sql = require(&record.sql, "sql")?;
    let timestamp = require(&record.timestamp, "timestamp")?;

    let time_grains = record
        .time_grains
        .iter()
        .map(|g| {
            g.parse::<TimeGrain>().map_err(|source| CatalogError::BadGrain {
                metric: record.name.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let label = record.label.unwrap_or_else(|| name.clone());

    let dimensions = record
        .dimensions
        .into_iter()
        .map(|d| match d.label {
            Some(label) => MetricDimension::with_label(&d.name, &label),
            None => MetricDimension::new(&d.name),
        })
        .collect();

    let filters = record
        .filters
        .into_iter()
        .map(|f| {
            let mut filter = MetricFilter::new(&f.field);
            if let Some(label) = f.label {
                filter.label = label;
            }
            filter
        })
        .collect();

    Ok(Metric {
        name,
        label,
        metric_type: record.metric_type,
        category: record.category,
        schema,
        model,
        description: record.description,
        sql,
        timestamp,
        business_owner: record.business_owner,
        data_team_owner: record.data_team_owner,
        time_grains,
        dimensions,
        filters,
        is_pre_aggregated: record.is_pre_aggregated,
        is_cumulative_metric: record.is_cumulative_metric,
        is_inverted: record.is_inverted,
    })
}
