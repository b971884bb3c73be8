//! Query execution and result decoding.
//!
//! This module holds the query model, the row decoder and the executor
//! that ties them to a remote engine.

pub mod decode;
pub mod executor;
pub mod project;
pub mod types;

pub use decode::{decode_cell, decode_row, decode_rows};
pub use executor::QueryExecutor;
pub use project::ProjectSelector;
pub use types::{
    CellValue, ColumnSchema, DeclaredType, ExecutionOutcome, Field, ParameterValue, Query,
    QueryOutput, QueryParameter, RawRow, ResultRow, SchemaField,
};
