//! The mutable projection layer: turns a read-only, cursor-based query
//! result into an editable view that synthesizes and executes INSERT,
//! UPDATE, DELETE, and refresh statements against the originating table.
//!
//! The layer sits between two collaborators it does not own: a
//! [`conn::Connection`] that runs statements on the wire, and a
//! [`cursor::RowCursor`] that owns row positioning and decoding. At
//! construction the [`metadata`] reconciler merges the projection's column
//! metadata with the live table schema and decides, once and permanently,
//! whether the result set may update, insert, and refresh. Each mutating
//! call is then gated by a result-set-wide edit state machine in
//! [`rowset::UpdatableRowSet`].

pub mod conn;
pub mod convert;
pub mod cursor;
pub mod metadata;
pub mod rowset;
mod statement;

pub use conn::{Connection, FetchedRow, SharedConnection};
pub use convert::ValueInput;
pub use cursor::{CursorPosition, MemoryCursor, RowCursor};
pub use metadata::{Eligibility, ReconciledColumn, TableIdentity};
pub use rowset::{ColumnRef, EditState, UpdatableRowSet};
