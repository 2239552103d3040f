//! Snowflake SQL dialect.
//!
//! Snowflake is the cloud warehouse backend. Its date functions accept
//! the same quoted part names the defaults emit; unquoted identifiers
//! are uppercased by the engine, so identifiers are always quoted.

use super::SqlDialect;

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    // Uses the shared defaults; `date_trunc('week', ...)` starts weeks
    // on Monday in both supported backends.
}
