//! Metric descriptors and the catalog they are loaded into.

pub mod dimension;
pub mod filter;
pub mod loader;
pub mod metric;

pub use dimension::MetricDimension;
pub use filter::MetricFilter;
pub use loader::CatalogError;
pub use metric::{Metric, MetricType, Person};

use std::path::Path;

use tracing::info;

/// A provider of metric definitions.
///
/// The TOML loader is the built-in source; alternative providers (for
/// example an external semantic-layer import) plug in behind the same
/// seam and feed the same catalog.
pub trait MetricSource {
    fn metrics(&self) -> Result<Vec<Metric>, CatalogError>;
}

/// A TOML catalog file on disk.
pub struct TomlCatalogSource {
    path: std::path::PathBuf,
}

impl TomlCatalogSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MetricSource for TomlCatalogSource {
    fn metrics(&self) -> Result<Vec<Metric>, CatalogError> {
        loader::load_catalog_file(&self.path)
    }
}

/// The read-only set of metric definitions for one catalog refresh.
///
/// Metrics are sorted by label; the first source to define a name wins,
/// so later sources cannot shadow earlier definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    metrics: Vec<Metric>,
}

impl Catalog {
    pub fn new(mut metrics: Vec<Metric>) -> Self {
        metrics.sort_by(|a, b| a.label.cmp(&b.label));
        Self { metrics }
    }

    /// Build a catalog from ordered sources, dropping duplicate names.
    pub fn from_sources(sources: &[&dyn MetricSource]) -> Result<Self, CatalogError> {
        let mut metrics: Vec<Metric> = Vec::new();
        for source in sources {
            for metric in source.metrics()? {
                if metrics.iter().any(|m| m.name == metric.name) {
                    continue;
                }
                metrics.push(metric);
            }
        }
        info!(count = metrics.len(), "catalog loaded");
        Ok(Self::new(metrics))
    }

    /// Load a catalog from one or more TOML files.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CatalogError> {
        let sources: Vec<TomlCatalogSource> =
            paths.iter().map(TomlCatalogSource::new).collect();
        let refs: Vec<&dyn MetricSource> =
            sources.iter().map(|s| s as &dyn MetricSource).collect();
        Self::from_sources(&refs)
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
