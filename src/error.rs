//! Crate-level error type.
//!
//! Modules define their own error types close to where they occur
//! (catalog loading, execution, result shaping); this module rolls them
//! up into a single [`PulseError`] for pipeline callers.

use crate::calendar::TimeGrain;

/// Result type for pipeline operations.
pub type PulseResult<T> = Result<T, PulseError>;

/// Unified error type for the request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// A grain string outside day/week/month/quarter/year was supplied.
    #[error(transparent)]
    InvalidGrain(#[from] crate::calendar::InvalidGrain),

    /// The requested metric does not exist in the catalog.
    ///
    /// Callers should render a "cannot display" placeholder rather than
    /// propagate a crash.
    #[error("Metric not found in catalog: '{0}'")]
    MetricNotFound(String),

    /// The metric exists but is not configured for the requested grain.
    #[error("Time grain '{grain}' is not enabled for metric '{metric}'")]
    UnsupportedGrain { metric: String, grain: TimeGrain },

    /// The named lookback window is not one of the standard options.
    #[error("Unknown time period: '{0}'")]
    UnknownTimePeriod(String),

    /// A slice request named a dimension the metric does not declare.
    #[error("Unknown dimension '{dimension}' on metric '{metric}'")]
    UnknownDimension { metric: String, dimension: String },

    /// A slice request arrived without a dimension to slice by.
    #[error("Slice requests must name a dimension")]
    MissingSliceDimension,

    /// The catalog could not be loaded or validated.
    #[error(transparent)]
    Catalog(#[from] crate::model::loader::CatalogError),

    /// The backend failed to execute a generated query.
    #[error(transparent)]
    Execution(#[from] crate::executor::ExecutorError),

    /// The backend returned a result set the shaper cannot interpret.
    #[error(transparent)]
    Shape(#[from] crate::report::ShapeError),
}
