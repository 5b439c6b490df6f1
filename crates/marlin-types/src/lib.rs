//! Shared wire-level types for the marlin client library.
//!
//! Everything here is protocol vocabulary: the column type tags the server
//! sends in result metadata, the projected-column metadata itself, the
//! dynamically-typed value union rows decode into, and the bind parameter
//! wrappers mutation statements are executed with.

mod column;
mod value;

pub use column::{ColumnMeta, ColumnType, EncodeMode};
pub use value::{BindParam, SqlValue};
