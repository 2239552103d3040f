//! SQL generation: dialect definitions and the query templates.

pub mod dialect;
pub mod generator;

pub use dialect::{Dialect, SqlDialect};
pub use generator::{
    generate_options_query, generate_slice_query, generate_time_series_query, QueryParams,
};
