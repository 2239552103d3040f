//! Short-TTL result cache.
//!
//! An explicit cache service sits at the executor boundary: entries are
//! keyed by the SHA256 of the backend identity plus the fully-rendered
//! query text, and expire after a fixed TTL. Caching is a performance
//! optimization, not a correctness requirement; entries are safe to
//! evict at any time and a miss simply re-executes.
//!
//! # Key Format
//!
//! ```text
//! sha256({ backend, sql }) -> ResultSet + insertion time
//! ```

mod hash;
pub use hash::compute_hash;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::executor::{ExecutorError, QueryExecutor, ResultSet};
use crate::sql::dialect::Dialect;

/// Default TTL for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Serialize)]
struct CacheKey<'a> {
    backend: &'a str,
    sql: &'a str,
}

/// Build the cache key for a query against a backend.
pub fn query_key(backend: &str, sql: &str) -> String {
    compute_hash(&CacheKey { backend, sql }).expect("cache key serializes to JSON")
}

struct CacheEntry {
    result: ResultSet,
    inserted_at: Instant,
}

/// An in-memory TTL cache of query results.
pub struct QueryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, removing it if it has expired.
    pub fn get(&self, key: &str) -> Option<ResultSet> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, result: ResultSet) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// A [`QueryExecutor`] wrapper that consults the cache before executing.
pub struct CachedExecutor<E: QueryExecutor> {
    inner: E,
    cache: QueryCache,
}

impl<E: QueryExecutor> CachedExecutor<E> {
    pub fn new(inner: E, ttl: Duration) -> Self {
        Self {
            inner,
            cache: QueryCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

impl<E: QueryExecutor> QueryExecutor for CachedExecutor<E> {
    fn backend(&self) -> &str {
        self.inner.backend()
    }

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn execute(&self, sql: &str) -> Result<ResultSet, ExecutorError> {
        let key = query_key(self.inner.backend(), sql);
        if let Some(result) = self.cache.get(&key) {
            debug!(backend = self.inner.backend(), "query cache hit");
            return Ok(result);
        }
        debug!(backend = self.inner.backend(), "query cache miss");
        let result = self.inner.execute(sql)?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }
}
