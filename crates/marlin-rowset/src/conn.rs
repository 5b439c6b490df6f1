//! Connection collaborator boundary.
//!
//! The row set never talks to the wire protocol directly: it hands
//! synthesized SQL plus staged parameters to the owning connection and
//! consumes whatever rows come back. Encoding and decoding of values is
//! entirely the connection's concern.

use std::cell::RefCell;
use std::rc::Rc;

use marlin_error::Result;
use marlin_types::{BindParam, EncodeMode, SqlValue};

/// One row fetched from the server.
///
/// Carries both the wire-encoded payload (which the base cursor stores
/// verbatim) and the values the connection decoded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    pub raw: Vec<u8>,
    pub values: Vec<SqlValue>,
}

impl FetchedRow {
    pub fn new(raw: Vec<u8>, values: Vec<SqlValue>) -> Self {
        Self { raw, values }
    }
}

/// The owning database session, as seen by a row set.
///
/// Implementations block until the round trip completes; this layer adds
/// no retry, cancellation, or timeout semantics of its own.
pub trait Connection {
    /// Execute a DML statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[BindParam]) -> Result<u64>;

    /// Run a statement that produces rows (SELECT or schema
    /// introspection) under the given row encoding.
    fn query(
        &mut self,
        sql: &str,
        params: &[BindParam],
        mode: EncodeMode,
    ) -> Result<Vec<FetchedRow>>;
}

/// A connection shared between a row set and whatever else the session is
/// doing, under the crate's single-threaded execution model.
pub type SharedConnection = Rc<RefCell<dyn Connection>>;
