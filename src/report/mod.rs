//! Result shaping: from tabular query output to named metrics.
//!
//! A time-series result set parses into [`ComparisonRow`] values; the
//! latest mid-period and completed rows then flatten into a map of named
//! metrics for KPI cards. Absent keys mean "not applicable" — a missing
//! comparison period or a zero denominator produces no entry, never a
//! zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::executor::{ResultSet, Value};

/// Errors raised while interpreting a result set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShapeError {
    #[error("Result set is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Unexpected value in column '{column}' at row {row}")]
    InvalidCell { column: String, row: usize },

    #[error("Unknown period type '{0}'")]
    UnknownPeriodType(String),

    #[error("Result set contains more than one mid-period row")]
    DuplicateMidPeriod,

    #[error("The mid-period row must be the most recent period")]
    MidPeriodOutOfOrder,
}

/// Whether a row covers a completed bucket or the in-flight one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
    MidPeriod,
    CompletedPeriod,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::MidPeriod => "Mid Period",
            PeriodType::CompletedPeriod => "Completed Period",
        }
    }

    fn parse(s: &str) -> Result<Self, ShapeError> {
        match s {
            "Mid Period" => Ok(PeriodType::MidPeriod),
            "Completed Period" => Ok(PeriodType::CompletedPeriod),
            other => Err(ShapeError::UnknownPeriodType(other.to_string())),
        }
    }
}

/// One period's metric value and its full comparison suite.
///
/// Comparison cells are `None` when the comparison falls outside the
/// queried range or its denominator was zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub period_label: String,
    pub period_type: PeriodType,
    pub days_into_period: i64,
    pub metric_value: Option<f64>,
    pub previous_period_value: Option<f64>,
    pub previous_period_change: Option<f64>,
    pub previous_period_percent_change: Option<f64>,
    pub trailing_six_value: Option<f64>,
    pub trailing_six_change: Option<f64>,
    pub trailing_six_percent_change: Option<f64>,
    pub previous_year_value: Option<f64>,
    pub previous_year_change: Option<f64>,
    pub previous_year_percent_change: Option<f64>,
    pub moving_average_value: Option<f64>,
    pub moving_average_change: Option<f64>,
    pub moving_average_percent_change: Option<f64>,
}

/// Parse a time-series result set into comparison rows.
///
/// Validates the mid-period contract: at most one `Mid Period` row, and
/// it must be the chronologically last period.
pub fn comparison_rows(result: &ResultSet) -> Result<Vec<ComparisonRow>, ShapeError> {
    let mut rows = Vec::with_capacity(result.len());

    for index in 0..result.len() {
        let period_start = require_date(result, index, "period_start")?;
        let period_end = require_date(result, index, "period_end")?;
        let period_type = match require_cell(result, index, "period_type")? {
            Value::Text(s) => PeriodType::parse(s)?,
            _ => {
                return Err(ShapeError::InvalidCell {
                    column: "period_type".to_string(),
                    row: index,
                })
            }
        };
        let days_into_period = match require_cell(result, index, "days_into_period")? {
            Value::Int(days) => *days,
            Value::Float(days) => *days as i64,
            _ => {
                return Err(ShapeError::InvalidCell {
                    column: "days_into_period".to_string(),
                    row: index,
                })
            }
        };

        rows.push(ComparisonRow {
            period_start,
            period_end,
            period_label: period_start.format("%Y-%m-%d").to_string(),
            period_type,
            days_into_period,
            metric_value: optional_f64(result, index, "metric_value")?,
            previous_period_value: optional_f64(result, index, "previous_period_value")?,
            previous_period_change: optional_f64(result, index, "previous_period_change")?,
            previous_period_percent_change: optional_f64(
                result,
                index,
                "previous_period_percent_change",
            )?,
            trailing_six_value: optional_f64(result, index, "trailing_six_value")?,
            trailing_six_change: optional_f64(result, index, "trailing_six_change")?,
            trailing_six_percent_change: optional_f64(
                result,
                index,
                "trailing_six_percent_change",
            )?,
            previous_year_value: optional_f64(result, index, "previous_year_value")?,
            previous_year_change: optional_f64(result, index, "previous_year_change")?,
            previous_year_percent_change: optional_f64(
                result,
                index,
                "previous_year_percent_change",
            )?,
            moving_average_value: optional_f64(result, index, "moving_average_value")?,
            moving_average_change: optional_f64(result, index, "moving_average_change")?,
            moving_average_percent_change: optional_f64(
                result,
                index,
                "moving_average_percent_change",
            )?,
        });
    }

    let mid_count = rows
        .iter()
        .filter(|r| r.period_type == PeriodType::MidPeriod)
        .count();
    if mid_count > 1 {
        return Err(ShapeError::DuplicateMidPeriod);
    }
    if let Some(mid) = rows.iter().find(|r| r.period_type == PeriodType::MidPeriod) {
        let latest = rows.iter().map(|r| r.period_start).max();
        if latest != Some(mid.period_start) {
            return Err(ShapeError::MidPeriodOutOfOrder);
        }
    }

    Ok(rows)
}

/// Flatten the latest mid-period and completed rows into named metrics.
///
/// The `_ptd` family is present only when a mid-period row exists; the
/// completed family only when a completed row exists. Individual keys are
/// present only when their cell is non-null.
pub fn standard_metrics(rows: &[ComparisonRow]) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();

    let mid = rows
        .iter()
        .filter(|r| r.period_type == PeriodType::MidPeriod)
        .max_by_key(|r| r.period_start);
    let completed = rows
        .iter()
        .filter(|r| r.period_type == PeriodType::CompletedPeriod)
        .max_by_key(|r| r.period_start);

    if let Some(row) = mid {
        insert(&mut metrics, "current_ptd", row.metric_value);
        insert(&mut metrics, "previous_period_ptd", row.previous_period_value);
        insert(
            &mut metrics,
            "trailing_six_periods_ptd",
            row.trailing_six_value,
        );
        insert(&mut metrics, "last_year_ptd", row.previous_year_value);
        insert(&mut metrics, "moving_average_ptd", row.moving_average_value);
        insert(
            &mut metrics,
            "period_over_period_change_ptd",
            row.previous_period_change,
        );
        insert(
            &mut metrics,
            "trailing_six_periods_change_ptd",
            row.trailing_six_change,
        );
        insert(
            &mut metrics,
            "year_over_year_change_ptd",
            row.previous_year_change,
        );
        insert(
            &mut metrics,
            "moving_average_change_ptd",
            row.moving_average_change,
        );
        insert(
            &mut metrics,
            "period_over_period_percent_change_ptd",
            row.previous_period_percent_change,
        );
        insert(
            &mut metrics,
            "trailing_six_periods_percent_change_ptd",
            row.trailing_six_percent_change,
        );
        insert(
            &mut metrics,
            "year_over_year_percent_change_ptd",
            row.previous_year_percent_change,
        );
        insert(
            &mut metrics,
            "moving_average_percent_change_ptd",
            row.moving_average_percent_change,
        );
    }

    if let Some(row) = completed {
        insert(&mut metrics, "current_period", row.metric_value);
        insert(&mut metrics, "previous_period", row.previous_period_value);
        insert(&mut metrics, "trailing_six_periods", row.trailing_six_value);
        insert(&mut metrics, "last_year", row.previous_year_value);
        insert(&mut metrics, "moving_average", row.moving_average_value);
        insert(
            &mut metrics,
            "period_over_period_change",
            row.previous_period_change,
        );
        insert(
            &mut metrics,
            "trailing_six_periods_change",
            row.trailing_six_change,
        );
        insert(
            &mut metrics,
            "year_over_year_change",
            row.previous_year_change,
        );
        insert(
            &mut metrics,
            "moving_average_change",
            row.moving_average_change,
        );
        insert(
            &mut metrics,
            "period_over_period_percent_change",
            row.previous_period_percent_change,
        );
        insert(
            &mut metrics,
            "trailing_six_periods_percent_change",
            row.trailing_six_percent_change,
        );
        insert(
            &mut metrics,
            "year_over_year_percent_change",
            row.previous_year_percent_change,
        );
        insert(
            &mut metrics,
            "moving_average_percent_change",
            row.moving_average_percent_change,
        );
    }

    metrics
}

fn insert(metrics: &mut BTreeMap<String, f64>, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        metrics.insert(key.to_string(), value);
    }
}

fn require_cell<'a>(
    result: &'a ResultSet,
    row: usize,
    column: &str,
) -> Result<&'a Value, ShapeError> {
    if result.column_index(column).is_none() {
        return Err(ShapeError::MissingColumn(column.to_string()));
    }
    result.cell(row, column).ok_or_else(|| ShapeError::InvalidCell {
        column: column.to_string(),
        row,
    })
}

fn require_date(result: &ResultSet, row: usize, column: &str) -> Result<NaiveDate, ShapeError> {
    require_cell(result, row, column)?
        .as_date()
        .ok_or_else(|| ShapeError::InvalidCell {
            column: column.to_string(),
            row,
        })
}

fn optional_f64(result: &ResultSet, row: usize, column: &str) -> Result<Option<f64>, ShapeError> {
    let cell = require_cell(result, row, column)?;
    if cell.is_null() {
        return Ok(None);
    }
    cell.as_f64()
        .map(Some)
        .ok_or_else(|| ShapeError::InvalidCell {
            column: column.to_string(),
            row,
        })
}
