//! Schema compiler subsystem
//!
//! Converts descriptor column maps into runtime schemas that validate and
//! prepare records before they reach the document store.
//!
//! # Rules
//!
//! - `createdAt` is injected unless disabled or declared
//! - `updatedAt` handling follows [`TimestampMode`]
//! - Required columns must be present and non-null on save
//! - Type checks are skipped for Mixed and unrecognized columns
//! - Undeclared fields are dropped on save
//! - Fields prefixed with `__` never appear in public views

mod compiler;
mod errors;
mod types;
mod validator;

pub use compiler::{CompiledSchema, SchemaCompiler, CREATED_AT, ID_FIELD, REVISION_FIELD, UPDATED_AT};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use types::{
    timestamp_value, ColumnDefault, ColumnDescription, ColumnSpec, ColumnType, ExtraOptions,
    TimestampMode, NOW_DEFAULT,
};
pub use validator::RecordValidator;
pub(crate) use validator::json_type_name;
