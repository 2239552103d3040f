//! The request pipeline.
//!
//! Each user interaction becomes one immutable [`MetricRequest`] and one
//! synchronous pipeline run: resolve the date range, resolve the
//! comparison window, generate the query, execute it through the result
//! cache, and shape the rows. There is no shared mutable state between
//! runs; a superseding request simply ignores a stale report.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cache::{CachedExecutor, DEFAULT_TTL};
use crate::calendar::{standard_periods, TimeGrain};
use crate::error::{PulseError, PulseResult};
use crate::executor::{QueryExecutor, ResultSet};
use crate::model::{Catalog, Metric, MetricDimension, MetricFilter};
use crate::planner::{resolve_window, QueryWindow};
use crate::report::{comparison_rows, standard_metrics, ComparisonRow};
use crate::sql::dialect::Dialect;
use crate::sql::generator::{
    generate_options_query, generate_slice_query, generate_time_series_query,
};

/// The lookback window used when a request names none.
pub const DEFAULT_TIME_PERIOD: &str = "last_six_periods";

/// An immutable description of one exploration request.
#[derive(Debug, Clone)]
pub struct MetricRequest {
    /// Catalog name of the metric.
    pub metric: String,
    pub grain: TimeGrain,
    /// Named standard lookback; defaults to [`DEFAULT_TIME_PERIOD`].
    pub time_period: Option<String>,
    /// Explicit range start; overrides the named lookback's start.
    pub start_date: Option<NaiveDate>,
    /// Explicit range end; overrides the named lookback's end.
    pub end_date: Option<NaiveDate>,
    pub filters: Vec<MetricFilter>,
    /// Dimension to slice by, for slice requests.
    pub slice_by: Option<String>,
    pub show_incomplete_periods: bool,
}

impl MetricRequest {
    pub fn new(metric: &str, grain: TimeGrain) -> Self {
        Self {
            metric: metric.to_string(),
            grain,
            time_period: None,
            start_date: None,
            end_date: None,
            filters: Vec::new(),
            slice_by: None,
            show_incomplete_periods: false,
        }
    }
}

/// The immutable result of a time-series pipeline run.
#[derive(Debug, Clone)]
pub struct MetricReport {
    pub metric: Metric,
    pub grain: TimeGrain,
    pub window: QueryWindow,
    pub sql: String,
    pub rows: Vec<ComparisonRow>,
    /// Named metric values for KPI cards; absent keys are not
    /// applicable, never zero.
    pub summary: BTreeMap<String, f64>,
}

/// The result of a slice pipeline run: one row per (period, dimension
/// value), primary value only.
#[derive(Debug, Clone)]
pub struct SliceReport {
    pub metric: Metric,
    pub dimension: MetricDimension,
    pub sql: String,
    pub result: ResultSet,
}

/// One distinct observed value of a filterable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub dimension: String,
    pub value: String,
}

/// The metrics-exploration pipeline over a catalog and a backend.
pub struct MetricsService {
    catalog: Catalog,
    executor: CachedExecutor<Box<dyn QueryExecutor>>,
}

impl MetricsService {
    pub fn new(catalog: Catalog, executor: Box<dyn QueryExecutor>, cache_ttl: Duration) -> Self {
        Self {
            catalog,
            executor: CachedExecutor::new(executor, cache_ttl),
        }
    }

    pub fn with_default_cache(catalog: Catalog, executor: Box<dyn QueryExecutor>) -> Self {
        Self::new(catalog, executor, DEFAULT_TTL)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn dialect(&self) -> Dialect {
        self.executor.dialect()
    }

    /// Run the time-series pipeline for a request.
    ///
    /// `today` anchors the named lookback windows; callers pass the
    /// current date so the pipeline itself stays pure.
    pub fn run(&self, request: &MetricRequest, today: NaiveDate) -> PulseResult<MetricReport> {
        let metric = self.lookup(request)?;
        let (start_date, end_date) = self.resolve_range(request, today)?;
        let window = resolve_window(
            metric,
            request.grain,
            start_date,
            end_date,
            request.show_incomplete_periods,
        );
        let sql = generate_time_series_query(
            self.dialect(),
            metric,
            request.grain,
            window.start_date,
            window.query_end_date,
            &request.filters,
            window.is_mid_period,
        );
        info!(
            metric = %metric.name,
            grain = %request.grain,
            start = %window.start_date,
            end = %window.query_end_date,
            "running time series query"
        );
        let result = self.executor.execute(&sql)?;
        let rows = comparison_rows(&result)?;
        let summary = standard_metrics(&rows);
        debug!(rows = rows.len(), metrics = summary.len(), "shaped result");

        Ok(MetricReport {
            metric: metric.clone(),
            grain: request.grain,
            window,
            sql,
            rows,
            summary,
        })
    }

    /// Run the slice pipeline: the request must name a dimension the
    /// metric declares.
    pub fn slice(&self, request: &MetricRequest, today: NaiveDate) -> PulseResult<SliceReport> {
        let metric = self.lookup(request)?;
        let dimension_name = request
            .slice_by
            .as_deref()
            .ok_or(PulseError::MissingSliceDimension)?;
        let dimension = metric
            .dimension(dimension_name)
            .ok_or_else(|| PulseError::UnknownDimension {
                metric: metric.name.clone(),
                dimension: dimension_name.to_string(),
            })?
            .clone();
        let (start_date, end_date) = self.resolve_range(request, today)?;
        let sql = generate_slice_query(
            self.dialect(),
            metric,
            request.grain,
            start_date,
            end_date,
            &request.filters,
            std::slice::from_ref(&dimension),
        );
        info!(
            metric = %metric.name,
            dimension = %dimension.name,
            "running slice query"
        );
        let result = self.executor.execute(&sql)?;

        Ok(SliceReport {
            metric: metric.clone(),
            dimension,
            sql,
            result,
        })
    }

    /// The distinct observed values of a metric's filterable fields,
    /// used to populate filter pickers.
    pub fn filter_options(&self, metric_name: &str) -> PulseResult<Vec<FilterOption>> {
        let metric = self
            .catalog
            .get(metric_name)
            .ok_or_else(|| PulseError::MetricNotFound(metric_name.to_string()))?;
        if metric.filters.is_empty() {
            return Ok(Vec::new());
        }

        let sql = generate_options_query(
            self.dialect(),
            &metric.schema,
            &metric.model,
            &metric.filters,
        );
        let result = self.executor.execute(&sql)?;

        let dimension_idx = result
            .column_index("dimension")
            .ok_or_else(|| crate::report::ShapeError::MissingColumn("dimension".to_string()))?;
        let value_idx = result.column_index("dimension_value").ok_or_else(|| {
            crate::report::ShapeError::MissingColumn("dimension_value".to_string())
        })?;

        let mut options = Vec::with_capacity(result.len());
        for row in &result.rows {
            let dimension = match row.get(dimension_idx).and_then(|v| v.as_str()) {
                Some(d) => d.to_string(),
                None => continue,
            };
            let value = match row.get(value_idx) {
                Some(v) if !v.is_null() => v.to_string(),
                _ => continue,
            };
            options.push(FilterOption { dimension, value });
        }
        Ok(options)
    }

    fn lookup(&self, request: &MetricRequest) -> PulseResult<&Metric> {
        let metric = self
            .catalog
            .get(&request.metric)
            .ok_or_else(|| PulseError::MetricNotFound(request.metric.clone()))?;
        if !metric.supports_grain(request.grain) {
            return Err(PulseError::UnsupportedGrain {
                metric: metric.name.clone(),
                grain: request.grain,
            });
        }
        Ok(metric)
    }

    fn resolve_range(
        &self,
        request: &MetricRequest,
        today: NaiveDate,
    ) -> PulseResult<(NaiveDate, NaiveDate)> {
        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            return Ok((start, end));
        }

        let name = request.time_period.as_deref().unwrap_or(DEFAULT_TIME_PERIOD);
        let options = standard_periods(request.grain, today);
        let option = options
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| PulseError::UnknownTimePeriod(name.to_string()))?;

        Ok((
            request.start_date.unwrap_or(option.start_date),
            request.end_date.unwrap_or(option.end_date),
        ))
    }
}
