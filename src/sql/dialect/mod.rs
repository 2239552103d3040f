//! SQL dialect definitions.
//!
//! The generator emits one query text per request; everything that can
//! differ between backends (identifier quoting, date literals, the
//! date-truncation and day-difference functions, interval steps) goes
//! through the [`SqlDialect`] trait so a backend swap never touches the
//! templates. Default implementations follow ANSI-style syntax shared by
//! the supported backends.

mod duckdb;
pub mod helpers;
mod snowflake;

pub use duckdb::DuckDb;
pub use snowflake::Snowflake;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::TimeGrain;

/// SQL dialect trait - defines how query fragments are rendered.
pub trait SqlDialect: fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (schema, table, column).
    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_single(s)
    }

    /// Format a date literal.
    fn format_date_literal(&self, date: NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    /// Truncate an expression to the start of its grain bucket.
    fn date_trunc(&self, grain: TimeGrain, expr: &str) -> String {
        format!("date_trunc('{}', {})", grain.as_str(), expr)
    }

    /// Whole days from `start` to `end`.
    fn date_diff_days(&self, start: &str, end: &str) -> String {
        format!("datediff('day', {}, {})", start, end)
    }

    /// The interval literal advancing a date by exactly one grain bucket.
    fn one_period_interval(&self, grain: TimeGrain) -> &'static str {
        match grain {
            TimeGrain::Day => "INTERVAL '1 day'",
            TimeGrain::Week => "INTERVAL '7 days'",
            TimeGrain::Month => "INTERVAL '1 month'",
            TimeGrain::Quarter => "INTERVAL '3 months'",
            TimeGrain::Year => "INTERVAL '1 year'",
        }
    }
}

/// Supported SQL dialects.
///
/// DuckDb serves the local embedded analytical database; Snowflake the
/// cloud warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Snowflake,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
            Dialect::Snowflake => &Snowflake,
        }
    }
}

// Implement SqlDialect for the enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_date_literal(&self, date: NaiveDate) -> String {
        self.dialect().format_date_literal(date)
    }

    fn date_trunc(&self, grain: TimeGrain, expr: &str) -> String {
        self.dialect().date_trunc(grain, expr)
    }

    fn date_diff_days(&self, start: &str, end: &str) -> String {
        self.dialect().date_diff_days(start, end)
    }

    fn one_period_interval(&self, grain: TimeGrain) -> &'static str {
        self.dialect().one_period_interval(grain)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duckdb" => Ok(Dialect::DuckDb),
            "snowflake" => Ok(Dialect::Snowflake),
            other => Err(format!(
                "unknown dialect '{other}', expected duckdb or snowflake"
            )),
        }
    }
}
