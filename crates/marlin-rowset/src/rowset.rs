//! The editable row set.
//!
//! `UpdatableRowSet` composes the base cursor and the owning connection
//! behind their collaborator traits, holds the reconciled column table
//! computed at construction, and drives every mutation through a
//! result-set-wide edit state machine: exactly one row is in edit at a
//! time, mirroring one-position-at-a-time cursor access. Callers must
//! serialize access; nothing here is thread-safe.

use std::cell::OnceCell;
use std::io::Read;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use marlin_error::{MarlinError, Result};
use marlin_types::{BindParam, ColumnMeta, SqlValue};
use tracing::debug;

use crate::conn::SharedConnection;
use crate::convert::{self, ValueInput};
use crate::cursor::{CursorPosition, RowCursor};
use crate::metadata::{self, Eligibility, ReconciledColumn, TableIdentity};
use crate::statement;

/// Edit mode of the whole row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No edit in progress.
    Standard,
    /// Values staged against the current row.
    Update,
    /// Values staged for a new row.
    Insert,
    /// A committed update is being re-read.
    Updated,
}

/// Column addressing: one-based index or label.
///
/// Labels resolve through the owning cursor's lookup, so every setter
/// accepts either form.
pub trait ColumnRef {
    fn resolve<C: RowCursor>(&self, rows: &UpdatableRowSet<C>) -> Result<usize>;
}

impl ColumnRef for usize {
    fn resolve<C: RowCursor>(&self, _rows: &UpdatableRowSet<C>) -> Result<usize> {
        Ok(*self)
    }
}

impl ColumnRef for &str {
    fn resolve<C: RowCursor>(&self, rows: &UpdatableRowSet<C>) -> Result<usize> {
        rows.cursor
            .find_column(self)
            .ok_or_else(|| MarlinError::NoSuchColumn {
                name: (*self).to_owned(),
            })
    }
}

/// An editable view over a read-only cursor result.
pub struct UpdatableRowSet<C: RowCursor> {
    conn: SharedConnection,
    cursor: C,
    identity: Option<TableIdentity>,
    columns: Arc<[ReconciledColumn]>,
    eligibility: Eligibility,
    state: EditState,
    pending: Vec<Option<BindParam>>,
    insert_sql: OnceCell<String>,
    delete_sql: OnceCell<String>,
    refresh_sql: OnceCell<String>,
    row_updated: bool,
    row_inserted: bool,
    row_deleted: bool,
}

impl<C: RowCursor> UpdatableRowSet<C> {
    /// Build the editable view.
    ///
    /// Reconciles the projected metadata against the live table schema
    /// (one introspection round trip). Schema-level problems do not fail
    /// construction; they disable eligibility and surface at the first
    /// mutating call.
    pub fn new(conn: SharedConnection, cursor: C, projected: Vec<ColumnMeta>) -> Result<Self> {
        let reconciled = metadata::reconcile(&conn, &projected)?;
        let pending = vec![None; reconciled.columns.len()];
        Ok(Self {
            conn,
            cursor,
            identity: reconciled.identity,
            columns: reconciled.columns,
            eligibility: reconciled.eligibility,
            state: EditState::Standard,
            pending,
            insert_sql: OnceCell::new(),
            delete_sql: OnceCell::new(),
            refresh_sql: OnceCell::new(),
            row_updated: false,
            row_inserted: false,
            row_deleted: false,
        })
    }

    /// Number of projected columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The reconciled column table, in projected order.
    pub fn columns(&self) -> &[ReconciledColumn] {
        &self.columns
    }

    /// The single table this projection resolved to, if any.
    pub fn table(&self) -> Option<&TableIdentity> {
        self.identity.as_ref()
    }

    /// Eligibility verdicts computed at construction.
    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    /// Current edit mode.
    pub fn state(&self) -> EditState {
        self.state
    }

    /// The base cursor.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    /// The base cursor, mutably (positioning).
    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    /// Whether this row set has ever committed an update.
    pub fn row_updated(&self) -> bool {
        self.row_updated
    }

    /// Whether this row set has ever inserted a row.
    pub fn row_inserted(&self) -> bool {
        self.row_inserted
    }

    /// Whether this row set has ever deleted a row.
    pub fn row_deleted(&self) -> bool {
        self.row_deleted
    }

    /// Gate for every staging call.
    ///
    /// Validates the column index, promotes STANDARD to UPDATE, and
    /// enforces position plus the eligibility verdict for the current
    /// mode. The promotion is not rolled back on failure.
    fn check_updatable(&mut self, index: usize) -> Result<()> {
        if index == 0 || index > self.columns.len() {
            return Err(MarlinError::ColumnIndexOutOfRange {
                index,
                count: self.columns.len(),
            });
        }
        if self.state == EditState::Standard {
            self.state = EditState::Update;
        }
        if self.state == EditState::Update {
            match self.cursor.position() {
                CursorPosition::BeforeFirst => return Err(MarlinError::BeforeFirstRow),
                CursorPosition::AfterLast => return Err(MarlinError::AfterLastRow),
                CursorPosition::Row(_) => {}
            }
            if !self.eligibility.can_update() {
                return Err(self.eligibility.update_error());
            }
        }
        if self.state == EditState::Insert && !self.eligibility.can_insert() {
            return Err(self.eligibility.insert_error());
        }
        Ok(())
    }

    fn stage(&mut self, index: usize, param: BindParam) -> Result<()> {
        self.check_updatable(index)?;
        self.pending[index - 1] = Some(param);
        Ok(())
    }

    /// Stage SQL NULL, typed with the column's declared wire type.
    pub fn update_null(&mut self, col: impl ColumnRef) -> Result<()> {
        let index = col.resolve(self)?;
        self.check_updatable(index)?;
        let wire = self.columns[index - 1].meta.column_type;
        self.pending[index - 1] = Some(BindParam::Null(wire));
        Ok(())
    }

    /// Stage a boolean, transmitted as TINYINT 0/1.
    pub fn update_bool(&mut self, col: impl ColumnRef, value: bool) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::TinyInt(i8::from(value))))
    }

    /// Stage a TINYINT.
    pub fn update_i8(&mut self, col: impl ColumnRef, value: i8) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::TinyInt(value)))
    }

    /// Stage a SMALLINT.
    pub fn update_i16(&mut self, col: impl ColumnRef, value: i16) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::SmallInt(value)))
    }

    /// Stage an INT.
    pub fn update_i32(&mut self, col: impl ColumnRef, value: i32) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Int(value)))
    }

    /// Stage a BIGINT.
    pub fn update_i64(&mut self, col: impl ColumnRef, value: i64) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::BigInt(value)))
    }

    /// Stage a FLOAT.
    pub fn update_f32(&mut self, col: impl ColumnRef, value: f32) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Float(value)))
    }

    /// Stage a DOUBLE.
    pub fn update_f64(&mut self, col: impl ColumnRef, value: f64) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Double(value)))
    }

    /// Stage a DECIMAL from its textual form.
    pub fn update_decimal(&mut self, col: impl ColumnRef, value: &str) -> Result<()> {
        let index = col.resolve(self)?;
        self.check_updatable(index)?;
        if value.trim().parse::<f64>().is_err() {
            return Err(MarlinError::conversion(value, "DECIMAL"));
        }
        self.pending[index - 1] = Some(BindParam::Value(SqlValue::Decimal(value.to_owned())));
        Ok(())
    }

    /// Stage character data.
    pub fn update_str(&mut self, col: impl ColumnRef, value: &str) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Text(value.to_owned())))
    }

    /// Stage binary data.
    pub fn update_bytes(&mut self, col: impl ColumnRef, value: &[u8]) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Bytes(value.to_vec())))
    }

    /// Stage a DATE.
    pub fn update_date(&mut self, col: impl ColumnRef, value: NaiveDate) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Date(value)))
    }

    /// Stage a TIME.
    pub fn update_time(&mut self, col: impl ColumnRef, value: NaiveTime) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::Time(value)))
    }

    /// Stage a DATETIME / TIMESTAMP.
    pub fn update_datetime(&mut self, col: impl ColumnRef, value: NaiveDateTime) -> Result<()> {
        let index = col.resolve(self)?;
        self.stage(index, BindParam::Value(SqlValue::DateTime(value)))
    }

    /// Stage binary data drained from a reader.
    ///
    /// With a length, at most that many bytes are read; without one the
    /// reader is drained to end.
    pub fn update_binary_stream(
        &mut self,
        col: impl ColumnRef,
        reader: impl Read,
        length: Option<u64>,
    ) -> Result<()> {
        let index = col.resolve(self)?;
        self.check_updatable(index)?;
        let buf = drain(reader, length)?;
        self.pending[index - 1] = Some(BindParam::Value(SqlValue::Bytes(buf)));
        Ok(())
    }

    /// Stage character data drained from a reader; must be valid UTF-8.
    pub fn update_text_stream(
        &mut self,
        col: impl ColumnRef,
        reader: impl Read,
        length: Option<u64>,
    ) -> Result<()> {
        let index = col.resolve(self)?;
        self.check_updatable(index)?;
        let buf = drain(reader, length)?;
        let text = String::from_utf8(buf)
            .map_err(|_| MarlinError::conversion("a non-UTF-8 text stream", "TEXT"))?;
        self.pending[index - 1] = Some(BindParam::Value(SqlValue::Text(text)));
        Ok(())
    }

    /// Stage a value of any supported input kind, converted to the
    /// column's declared wire type.
    pub fn update_value(&mut self, col: impl ColumnRef, input: ValueInput) -> Result<()> {
        let index = col.resolve(self)?;
        self.check_updatable(index)?;
        let target = self.columns[index - 1].meta.column_type;
        let param = convert::coerce(input, target)?;
        self.pending[index - 1] = Some(param);
        Ok(())
    }

    /// Insert the staged row.
    ///
    /// No-op outside insert mode. Unset columns bind the server-side
    /// default marker; a default violation the server raises propagates
    /// unchanged, leaving the staged row intact for correction.
    pub fn insert_row(&mut self) -> Result<()> {
        if self.state != EditState::Insert {
            return Ok(());
        }
        if !self.eligibility.can_insert() {
            return Err(self.eligibility.insert_error());
        }
        let Some(identity) = &self.identity else {
            return Err(MarlinError::internal("insertable row set without a table"));
        };
        let sql = self
            .insert_sql
            .get_or_init(|| statement::insert_sql(identity, &self.columns))
            .clone();
        let params: Vec<BindParam> = self
            .pending
            .iter()
            .map(|slot| slot.clone().unwrap_or(BindParam::Default))
            .collect();
        debug!(sql = %sql, "executing synthesized insert");
        self.conn.borrow_mut().execute(&sql, &params)?;
        self.row_inserted = true;
        self.clear_pending();
        self.state = EditState::Standard;
        Ok(())
    }

    /// Commit the staged update against the current row.
    ///
    /// The WHERE clause binds the pre-update key values read from the
    /// current row; the follow-up refresh prefers staged key values so a
    /// key-changing update relocates itself. Without staged columns this
    /// is a no-op; during insert mode it is an error.
    pub fn update_row(&mut self) -> Result<()> {
        match self.state {
            EditState::Insert => Err(MarlinError::UpdateWhileInsert),
            EditState::Update => {
                let touched: Vec<bool> = self.pending.iter().map(Option::is_some).collect();
                if !touched.contains(&true) {
                    self.clear_pending();
                    self.state = EditState::Standard;
                    return Ok(());
                }
                let Some(identity) = &self.identity else {
                    return Err(MarlinError::internal("updatable row set without a table"));
                };
                let sql = statement::update_sql(identity, &self.columns, &touched);
                let mut params: Vec<BindParam> = self.pending.iter().flatten().cloned().collect();
                for (pos, col) in self.columns.iter().enumerate() {
                    if col.primary_key {
                        params.push(BindParam::Value(self.cursor.value_at(pos)?));
                    }
                }
                debug!(sql = %sql, "executing synthesized update");
                self.conn.borrow_mut().execute(&sql, &params)?;
                self.state = EditState::Updated;
                self.refresh_row()?;
                self.row_updated = true;
                self.clear_pending();
                self.state = EditState::Standard;
                Ok(())
            }
            EditState::Standard | EditState::Updated => Ok(()),
        }
    }

    /// Delete the current row from the database and the in-memory set.
    pub fn delete_row(&mut self) -> Result<()> {
        if !self.eligibility.can_update() {
            return Err(self.eligibility.update_error());
        }
        match self.cursor.position() {
            CursorPosition::BeforeFirst => return Err(MarlinError::BeforeFirstRow),
            CursorPosition::AfterLast => return Err(MarlinError::AfterLastRow),
            CursorPosition::Row(_) => {}
        }
        let Some(identity) = &self.identity else {
            return Err(MarlinError::internal("updatable row set without a table"));
        };
        let sql = self
            .delete_sql
            .get_or_init(|| statement::delete_sql(identity, &self.columns))
            .clone();
        let mut params = Vec::new();
        for (pos, col) in self.columns.iter().enumerate() {
            if col.primary_key {
                params.push(BindParam::Value(self.cursor.value_at(pos)?));
            }
        }
        debug!(sql = %sql, "executing synthesized delete");
        self.conn.borrow_mut().execute(&sql, &params)?;
        self.cursor.remove_current_row()?;
        self.row_deleted = true;
        Ok(())
    }

    /// Re-read the current row by primary key.
    ///
    /// No-op when the row set cannot refresh. While a committed update is
    /// being re-read, staged key values take precedence over the current
    /// row's. If the row was concurrently deleted the cursor keeps its
    /// prior contents.
    pub fn refresh_row(&mut self) -> Result<()> {
        if !self.eligibility.can_refresh() {
            return Ok(());
        }
        // The key must be selectable to identify the row to re-read.
        if !self.columns.iter().any(|col| col.primary_key) {
            return Ok(());
        }
        let Some(identity) = &self.identity else {
            return Err(MarlinError::internal("refreshable row set without a table"));
        };
        let sql = self
            .refresh_sql
            .get_or_init(|| statement::refresh_sql(identity, &self.columns))
            .clone();
        let mut params = Vec::new();
        for (pos, col) in self.columns.iter().enumerate() {
            if !col.primary_key {
                continue;
            }
            let param = match (self.state, &self.pending[pos]) {
                (EditState::Updated, Some(staged)) => staged.clone(),
                _ => BindParam::Value(self.cursor.value_at(pos)?),
            };
            params.push(param);
        }
        debug!(sql = %sql, "refreshing current row");
        let rows = self
            .conn
            .borrow_mut()
            .query(&sql, &params, self.cursor.encode_mode())?;
        if let Some(row) = rows.into_iter().next() {
            self.cursor.replace_current_row(row)?;
        }
        Ok(())
    }

    /// Discard staged values and leave edit mode.
    pub fn cancel_row_updates(&mut self) {
        self.clear_pending();
        self.state = EditState::Standard;
    }

    /// Enter insert mode with an empty staged row.
    pub fn move_to_insert_row(&mut self) {
        self.clear_pending();
        self.state = EditState::Insert;
    }

    /// Leave insert mode, discarding the staged row.
    pub fn move_to_current_row(&mut self) {
        self.clear_pending();
        self.state = EditState::Standard;
    }

    fn clear_pending(&mut self) {
        for slot in &mut self.pending {
            *slot = None;
        }
    }
}

fn drain(reader: impl Read, length: Option<u64>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match length {
        Some(limit) => {
            let mut limited = reader.take(limit);
            limited.read_to_end(&mut buf)?;
        }
        None => {
            let mut reader = reader;
            reader.read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}
