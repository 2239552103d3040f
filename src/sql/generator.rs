//! Query templates for time-series, slice, and filter-option queries.
//!
//! Each template is rendered by a pure function of its inputs: identical
//! parameters always yield byte-identical query text, and nothing here
//! touches a connection. The time-series template exists in two shapes,
//! selected by the metric's `is_pre_aggregated` flag:
//!
//! - the standard shape re-aggregates raw rows per period and, for a
//!   mid-period request, re-slices every period to the first
//!   `days_into_current_period` days so the partial bucket is compared
//!   against the same point in prior periods;
//! - the pre-aggregated shape skips the to-date re-slice (the source
//!   rows already hold one computed value per period), so the mid-period
//!   row is compared against previous completed periods.
//!
//! Comparison columns are derived with `lag` over the bucketed series:
//! one bucket back for the previous period, `periods_per_year` buckets
//! back for the previous year, six back for the trailing comparison, and
//! a three-row window average. Percent changes divide through
//! `NULLIF(..., 0)` so a zero denominator yields NULL, never an error.

use chrono::NaiveDate;

use crate::calendar::{period_bounds, TimeGrain};
use crate::model::{Metric, MetricDimension, MetricFilter};
use crate::sql::dialect::{Dialect, SqlDialect};

/// The parameter set a time-series template is rendered from.
///
/// Field names mirror the stable template-parameter contract
/// (`schema`, `table`, `date_field`, `time_grain`, `start_date`,
/// `end_date`, `filters`, `periods_per_year`, `is_mid_period`,
/// `days_into_current_period`).
#[derive(Debug, Clone)]
pub struct QueryParams<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub date_field: &'a str,
    pub time_grain: TimeGrain,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// The metric's aggregation expression.
    pub metric_sql: &'a str,
    /// Applied filters only; filters without values are dropped before
    /// rendering so they cannot alter the query text.
    pub filters: Vec<&'a MetricFilter>,
    pub periods_per_year: u32,
    pub is_mid_period: bool,
    pub days_into_current_period: i64,
    /// Start of the bucket containing `end_date`; the final row of the
    /// output, and the one labeled `Mid Period` when applicable.
    pub current_period_start: NaiveDate,
}

impl<'a> QueryParams<'a> {
    /// Build the parameter set for a metric and resolved date range.
    pub fn for_metric(
        metric: &'a Metric,
        grain: TimeGrain,
        start_date: NaiveDate,
        end_date: NaiveDate,
        filters: &'a [MetricFilter],
        is_mid_period: bool,
    ) -> Self {
        let current_period_start = period_bounds(end_date, grain).start;
        Self {
            schema: &metric.schema,
            table: &metric.model,
            date_field: &metric.timestamp,
            time_grain: grain,
            start_date,
            end_date,
            metric_sql: &metric.sql,
            filters: filters.iter().filter(|f| f.is_applied()).collect(),
            periods_per_year: grain.periods_per_year(),
            is_mid_period,
            days_into_current_period: (end_date - current_period_start).num_days() + 1,
            current_period_start,
        }
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }
}

/// Generate the time-series comparison query for a metric.
///
/// `end_date` is the resolved query end (see the planner); `is_mid_period`
/// marks whether the final bucket should be labeled `Mid Period`.
pub fn generate_time_series_query(
    dialect: Dialect,
    metric: &Metric,
    grain: TimeGrain,
    start_date: NaiveDate,
    end_date: NaiveDate,
    filters: &[MetricFilter],
    is_mid_period: bool,
) -> String {
    let params = QueryParams::for_metric(metric, grain, start_date, end_date, filters, is_mid_period);
    let with_to_date = is_mid_period && !metric.is_pre_aggregated;
    render_time_series(dialect, &params, with_to_date)
}

/// Generate the slice query: one row per (period, dimension value), with
/// the primary aggregated value only.
pub fn generate_slice_query(
    dialect: Dialect,
    metric: &Metric,
    grain: TimeGrain,
    start_date: NaiveDate,
    end_date: NaiveDate,
    filters: &[MetricFilter],
    dimensions: &[MetricDimension],
) -> String {
    let params = QueryParams::for_metric(metric, grain, start_date, end_date, filters, false);
    let ts = dialect.quote_identifier(params.date_field);
    let bucket = dialect.date_trunc(grain, &ts);

    let mut lines: Vec<String> = Vec::new();
    lines.push("SELECT".to_string());
    lines.push(format!("    {bucket} AS period_start,"));
    for dimension in dimensions {
        lines.push(format!("    {},", dialect.quote_identifier(&dimension.name)));
    }
    lines.push(format!("    {} AS metric_value", params.metric_sql));
    lines.push(format!(
        "FROM {}.{}",
        dialect.quote_identifier(params.schema),
        dialect.quote_identifier(params.table)
    ));
    lines.push(format!(
        "WHERE {ts} >= {}",
        dialect.format_date_literal(params.start_date)
    ));
    lines.push(format!(
        "  AND {ts} <= {}",
        dialect.format_date_literal(params.end_date)
    ));
    for filter in &params.filters {
        lines.push(format!("  AND {}", in_clause(dialect, filter)));
    }

    let group_positions: Vec<String> = (1..=dimensions.len() + 1).map(|i| i.to_string()).collect();
    lines.push(format!("GROUP BY {}", group_positions.join(", ")));

    let dim_positions: Vec<String> = (2..=dimensions.len() + 1).map(|i| i.to_string()).collect();
    if dim_positions.is_empty() {
        lines.push("ORDER BY period_start DESC".to_string());
    } else {
        lines.push(format!("ORDER BY period_start DESC, {}", dim_positions.join(", ")));
    }

    lines.join("\n")
}

/// Generate the filter-options query: the distinct observed values of
/// each filterable field, tagged with the field each row belongs to.
///
/// Returns an empty string when no fields are given.
pub fn generate_options_query(
    dialect: Dialect,
    schema: &str,
    table: &str,
    filters: &[MetricFilter],
) -> String {
    let source = format!(
        "{}.{}",
        dialect.quote_identifier(schema),
        dialect.quote_identifier(table)
    );

    let mut lines: Vec<String> = Vec::new();
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            lines.push("UNION ALL".to_string());
        }
        lines.push("SELECT DISTINCT".to_string());
        lines.push(format!("    {} AS dimension,", dialect.quote_string(&filter.field)));
        lines.push(format!(
            "    {} AS dimension_value",
            dialect.quote_identifier(&filter.field)
        ));
        lines.push(format!("FROM {source}"));
    }
    if lines.is_empty() {
        return String::new();
    }
    lines.push("ORDER BY dimension, dimension_value".to_string());
    lines.join("\n")
}

// ============================================================================
// Time-series rendering
// ============================================================================

const COMPARISONS: [&str; 4] = [
    "previous_period",
    "trailing_six",
    "previous_year",
    "moving_average",
];

fn render_time_series(dialect: Dialect, p: &QueryParams, with_to_date: bool) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("WITH period_rollup AS (".to_string());
    push_rollup(&mut lines, dialect, p, false);
    if with_to_date {
        lines.push("),".to_string());
        lines.push("period_rollup_to_date AS (".to_string());
        push_rollup(&mut lines, dialect, p, true);
    }
    lines.push("),".to_string());
    lines.push("windowed AS (".to_string());
    push_windowed(&mut lines, p, with_to_date);
    if with_to_date {
        lines.push("),".to_string());
        lines.push("resolved AS (".to_string());
        push_resolved(&mut lines, dialect, p);
    }
    lines.push(")".to_string());
    push_final_select(&mut lines, dialect, p, with_to_date);

    lines.join("\n")
}

fn push_rollup(lines: &mut Vec<String>, dialect: Dialect, p: &QueryParams, to_date: bool) {
    let ts = dialect.quote_identifier(p.date_field);
    let bucket = dialect.date_trunc(p.time_grain, &ts);

    lines.push("    SELECT".to_string());
    lines.push(format!("        {bucket} AS period_start,"));
    lines.push(format!("        {} AS metric_value", p.metric_sql));
    lines.push(format!(
        "    FROM {}.{}",
        dialect.quote_identifier(p.schema),
        dialect.quote_identifier(p.table)
    ));
    lines.push(format!(
        "    WHERE {ts} >= {}",
        dialect.format_date_literal(p.start_date)
    ));
    lines.push(format!(
        "      AND {ts} <= {}",
        dialect.format_date_literal(p.end_date)
    ));
    if to_date {
        lines.push(format!(
            "      AND {} + 1 <= {}",
            dialect.date_diff_days(&bucket, &ts),
            p.days_into_current_period
        ));
    }
    for filter in &p.filters {
        lines.push(format!("      AND {}", in_clause(dialect, filter)));
    }
    lines.push("    GROUP BY 1".to_string());
}

fn push_windowed(lines: &mut Vec<String>, p: &QueryParams, with_to_date: bool) {
    let lag_distance = |name: &str| -> u32 {
        match name {
            "previous_period" => 1,
            "trailing_six" => 6,
            "previous_year" => p.periods_per_year,
            _ => unreachable!("moving_average is window-averaged, not lagged"),
        }
    };

    lines.push("    SELECT".to_string());
    if with_to_date {
        let over = "OVER (ORDER BY totals.period_start)";
        lines.push("        totals.period_start,".to_string());
        lines.push("        totals.metric_value,".to_string());
        for source in ["totals", "ptd"] {
            let suffix = if source == "totals" { "full" } else { "to_date" };
            for name in &COMPARISONS[..3] {
                lines.push(format!(
                    "        lag({source}.metric_value, {}) {over} AS {name}_{suffix},",
                    lag_distance(name)
                ));
            }
            let trailing_comma = if source == "totals" { "," } else { "" };
            lines.push(format!(
                "        avg({source}.metric_value) OVER (ORDER BY totals.period_start ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) AS moving_average_{suffix}{trailing_comma}"
            ));
        }
        lines.push("    FROM period_rollup AS totals".to_string());
        lines.push("    LEFT JOIN period_rollup_to_date AS ptd".to_string());
        lines.push("        ON ptd.period_start = totals.period_start".to_string());
    } else {
        let over = "OVER (ORDER BY period_start)";
        lines.push("        period_start,".to_string());
        lines.push("        metric_value,".to_string());
        for name in &COMPARISONS[..3] {
            lines.push(format!(
                "        lag(metric_value, {}) {over} AS {name}_value,",
                lag_distance(name)
            ));
        }
        lines.push(
            "        avg(metric_value) OVER (ORDER BY period_start ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) AS moving_average_value"
                .to_string(),
        );
        lines.push("    FROM period_rollup".to_string());
    }
}

fn push_resolved(lines: &mut Vec<String>, dialect: Dialect, p: &QueryParams) {
    let mid_row = format!(
        "period_start = {}",
        dialect.format_date_literal(p.current_period_start)
    );

    lines.push("    SELECT".to_string());
    lines.push("        period_start,".to_string());
    lines.push("        metric_value,".to_string());
    for (index, name) in COMPARISONS.iter().enumerate() {
        let trailing_comma = if index + 1 < COMPARISONS.len() { "," } else { "" };
        lines.push(format!(
            "        CASE WHEN {mid_row} THEN {name}_to_date ELSE {name}_full END AS {name}_value{trailing_comma}"
        ));
    }
    lines.push("    FROM windowed".to_string());
}

fn push_final_select(lines: &mut Vec<String>, dialect: Dialect, p: &QueryParams, with_to_date: bool) {
    let source = if with_to_date { "resolved" } else { "windowed" };
    let one_period = dialect.one_period_interval(p.time_grain);
    let one_day = dialect.one_period_interval(TimeGrain::Day);
    let period_end = format!("period_start + {one_period} - {one_day}");
    let full_days = format!(
        "{} + 1",
        dialect.date_diff_days("period_start", &period_end)
    );

    lines.push("SELECT".to_string());
    lines.push("    period_start,".to_string());
    if p.is_mid_period {
        let mid_row = format!(
            "period_start = {}",
            dialect.format_date_literal(p.current_period_start)
        );
        lines.push(format!(
            "    CASE WHEN {mid_row} THEN {} ELSE {period_end} END AS period_end,",
            dialect.format_date_literal(p.end_date)
        ));
        lines.push(format!(
            "    CASE WHEN {mid_row} THEN 'Mid Period' ELSE 'Completed Period' END AS period_type,"
        ));
        lines.push(format!(
            "    CASE WHEN {mid_row} THEN {} ELSE {full_days} END AS days_into_period,",
            p.days_into_current_period
        ));
    } else {
        lines.push(format!("    {period_end} AS period_end,"));
        lines.push("    'Completed Period' AS period_type,".to_string());
        lines.push(format!("    {full_days} AS days_into_period,"));
    }
    lines.push("    metric_value,".to_string());
    for (index, name) in COMPARISONS.iter().enumerate() {
        let last = index + 1 == COMPARISONS.len();
        lines.push(format!("    {name}_value,"));
        lines.push(format!(
            "    metric_value - {name}_value AS {name}_change,"
        ));
        let trailing_comma = if last { "" } else { "," };
        lines.push(format!(
            "    (metric_value - {name}_value) / NULLIF({name}_value, 0) AS {name}_percent_change{trailing_comma}"
        ));
    }
    lines.push(format!("FROM {source}"));
    lines.push("ORDER BY period_start DESC".to_string());
}

fn in_clause(dialect: Dialect, filter: &MetricFilter) -> String {
    let values: Vec<String> = filter
        .filter_values
        .iter()
        .map(|v| dialect.quote_string(v))
        .collect();
    format!(
        "{} IN ({})",
        dialect.quote_identifier(&filter.field),
        values.join(", ")
    )
}
