//! Test doubles for the executor boundary.
//!
//! `StaticExecutor` serves canned result sets (or a canned failure) and
//! records executions, so pipeline and cache behavior can be tested
//! without a live backend. `probe()` hands out a counter handle that
//! stays valid after the executor is boxed into a service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{ExecutorError, QueryExecutor, ResultSet};
use crate::sql::dialect::Dialect;

/// An executor that replays canned responses.
#[derive(Debug)]
pub struct StaticExecutor {
    backend: String,
    dialect: Dialect,
    response: ResultSet,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    executed: Arc<Mutex<Vec<String>>>,
}

/// A handle onto a [`StaticExecutor`]'s execution record.
#[derive(Debug, Clone)]
pub struct ExecutorProbe {
    calls: Arc<AtomicUsize>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl ExecutorProbe {
    /// How many times `execute` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The queries executed so far, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed.lock().expect("probe lock poisoned").clone()
    }
}

impl StaticExecutor {
    /// An executor that returns `response` for every query.
    pub fn returning(response: ResultSet) -> Self {
        Self {
            backend: "static".to_string(),
            dialect: Dialect::DuckDb,
            response,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An executor that fails every query with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            backend: "static".to_string(),
            dialect: Dialect::DuckDb,
            response: ResultSet::default(),
            failure: Some(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// A counting handle that outlives boxing the executor away.
    pub fn probe(&self) -> ExecutorProbe {
        ExecutorProbe {
            calls: Arc::clone(&self.calls),
            executed: Arc::clone(&self.executed),
        }
    }

    /// How many times `execute` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QueryExecutor for StaticExecutor {
    fn backend(&self) -> &str {
        &self.backend
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed
            .lock()
            .expect("executor lock poisoned")
            .push(sql.to_string());
        match &self.failure {
            Some(message) => Err(ExecutorError::QueryExecutionFailed {
                backend: self.backend.clone(),
                message: message.clone(),
            }),
            None => Ok(self.response.clone()),
        }
    }
}
