//! DuckDB SQL dialect.
//!
//! DuckDB is the local embedded analytical backend. It is
//! PostgreSQL-compatible and shares the ANSI defaults: double-quoted
//! identifiers, `DATE '...'` literals, `date_trunc`, and `datediff`.

use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    // Uses the shared defaults for quoting, date literals, date_trunc,
    // datediff, and interval steps.
}
