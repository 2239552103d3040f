//! The query-executor boundary.
//!
//! The core is backend-agnostic: it renders query text and hands it to a
//! [`QueryExecutor`], which owns the connection, timeouts, and any retry
//! policy. Executors return a [`ResultSet`] of typed [`Value`] cells.

pub mod testing;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sql::dialect::Dialect;

/// Errors surfaced by query executors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutorError {
    /// The backend rejected or failed the query; the backend's own
    /// message is attached. The core never retries.
    #[error("Query execution failed on {backend}: {message}")]
    QueryExecutionFailed { backend: String, message: String },

    /// The backend could not be reached at all.
    #[error("Connection to {backend} failed: {message}")]
    ConnectionFailed { backend: String, message: String },
}

/// One cell of a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date view of the cell; ISO-formatted text parses too, since some
    /// backends return dates as strings.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// A tabular query result: named columns and rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cell at (`row`, `column`), if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A backend that can execute generated SQL.
///
/// Implementations own the connection and its concurrency contract; the
/// core treats `execute` as an opaque synchronous call. `backend` is a
/// stable identity string used in error messages and cache keys.
pub trait QueryExecutor: Send + Sync {
    fn backend(&self) -> &str;

    fn dialect(&self) -> Dialect;

    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutorError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Box<T> {
    fn backend(&self) -> &str {
        (**self).backend()
    }

    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutorError> {
        (**self).execute(sql)
    }
}
