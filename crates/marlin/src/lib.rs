//! Public API facade for marlin.
//!
//! Re-exports the editable row-set surface: the value and metadata
//! vocabulary, the collaborator traits a driver implements, and
//! [`UpdatableRowSet`] itself. The integration suite under `tests/`
//! exercises the whole surface against a scripted in-memory server.

pub use marlin_error::{MarlinError, Result};
pub use marlin_rowset::{
    ColumnRef, Connection, CursorPosition, EditState, Eligibility, FetchedRow, MemoryCursor,
    ReconciledColumn, RowCursor, SharedConnection, TableIdentity, UpdatableRowSet, ValueInput,
};
pub use marlin_types::{BindParam, ColumnMeta, ColumnType, EncodeMode, SqlValue};
