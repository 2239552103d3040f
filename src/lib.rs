//! # Pulse
//!
//! A metrics exploration engine that compiles period comparisons to
//! warehouse SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Metric Catalog (TOML definitions)             │
//! │   (source model, aggregation SQL, dimensions, filters)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [calendar]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Period Arithmetic (grains, standard periods)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Comparison Window (mid-period vs. completed periods)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Generated Query (time series / slice / options)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor + cache]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Result Shaping (comparison rows, named metrics)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline is driven by [`service::MetricsService`]: an immutable
//! [`service::MetricRequest`] is resolved against the catalog and calendar,
//! compiled to a single SQL statement, executed through a TTL result cache,
//! and shaped into named comparison metrics for display layers.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod planner;
pub mod report;
pub mod service;
pub mod sql;

// Re-export SQL submodules at crate level for convenient paths
pub use sql::dialect;
pub use sql::generator;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::calendar::{
        period_bounds, standard_periods, InvalidGrain, Period, TimeGrain, TimePeriodOption,
    };
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{PulseError, PulseResult};
    pub use crate::executor::{ExecutorError, QueryExecutor, ResultSet, Value};
    pub use crate::generator::{
        generate_options_query, generate_slice_query, generate_time_series_query, QueryParams,
    };
    pub use crate::model::{
        Catalog, Metric, MetricDimension, MetricFilter, MetricType, Person,
    };
    pub use crate::planner::{resolve_window, QueryWindow};
    pub use crate::report::{comparison_rows, standard_metrics, ComparisonRow, PeriodType};
    pub use crate::service::{MetricReport, MetricRequest, MetricsService};
}

// Also export at crate root for convenience
pub use calendar::{period_bounds, standard_periods, Period, TimeGrain};
pub use dialect::Dialect;
pub use error::{PulseError, PulseResult};
pub use model::{Catalog, Metric, MetricFilter};
pub use planner::{resolve_window, QueryWindow};
