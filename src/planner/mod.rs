//! Comparison-window resolution.
//!
//! Before a query is generated, the requested date range is resolved
//! against the grain: the final bucket is either kept as-is (mid-period,
//! "to-date" semantics) or the range is truncated to the last fully
//! completed bucket. Cumulative metrics are never truncated, because a
//! running total's partial-period accumulation is legitimate data; all
//! other metrics drop the in-flight bucket unless the caller opts in, so
//! a three-day partial month is not compared against a full prior month.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::calendar::{period_bounds, TimeGrain};
use crate::model::Metric;

/// The resolved date window a time-series query runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Requested range start, unchanged.
    pub start_date: NaiveDate,
    /// Requested range end, unchanged.
    pub end_date: NaiveDate,
    /// Effective end the query runs to; equals `end_date` unless the
    /// incomplete final bucket was excluded.
    pub query_end_date: NaiveDate,
    /// Whether the final bucket of the requested range is incomplete.
    pub is_mid_period: bool,
    /// Days elapsed from the final bucket's start through
    /// `query_end_date`, inclusive.
    pub days_into_current_period: i64,
}

/// Resolve the query window for a metric and requested range.
pub fn resolve_window(
    metric: &Metric,
    grain: TimeGrain,
    start_date: NaiveDate,
    end_date: NaiveDate,
    show_incomplete_periods: bool,
) -> QueryWindow {
    let current = period_bounds(end_date, grain);

    let query_end_date = if show_incomplete_periods || metric.is_cumulative_metric {
        end_date
    } else {
        current.start - Duration::days(1)
    };

    let is_mid_period = current.end != query_end_date;

    let days_into_current_period = (query_end_date
        - period_bounds(query_end_date, grain).start)
        .num_days()
        + 1;

    debug!(
        metric = %metric.name,
        grain = %grain,
        %query_end_date,
        is_mid_period,
        days_into_current_period,
        "resolved query window"
    );

    QueryWindow {
        start_date,
        end_date,
        query_end_date,
        is_mid_period,
        days_into_current_period,
    }
}
