//! Base cursor collaborator boundary, plus the in-memory implementation.
//!
//! The base cursor owns row positioning and raw column decoding; the
//! mutable layer only consumes the operations listed on [`RowCursor`].

use marlin_error::{MarlinError, Result};
use marlin_types::{EncodeMode, SqlValue};

use crate::conn::FetchedRow;

/// Where the cursor currently points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    /// Before the first row (initial state).
    BeforeFirst,
    /// On the row at this zero-based index.
    Row(usize),
    /// Past the last row.
    AfterLast,
}

/// Operations the mutable layer consumes from the base read-only cursor.
pub trait RowCursor {
    /// Current cursor position.
    fn position(&self) -> CursorPosition;

    /// Number of rows currently materialized.
    fn row_count(&self) -> usize;

    /// Decoded value of the current row at the zero-based column index.
    fn value_at(&self, column: usize) -> Result<SqlValue>;

    /// Replace the current row with a freshly fetched one.
    fn replace_current_row(&mut self, row: FetchedRow) -> Result<()>;

    /// Remove the current row from the in-memory row set.
    fn remove_current_row(&mut self) -> Result<()>;

    /// Resolve a column label to its one-based index.
    fn find_column(&self, label: &str) -> Option<usize>;

    /// Row encoding this result set was fetched with.
    fn encode_mode(&self) -> EncodeMode;
}

/// In-memory cursor over fully materialized rows.
#[derive(Debug)]
pub struct MemoryCursor {
    labels: Vec<String>,
    rows: Vec<FetchedRow>,
    position: CursorPosition,
    mode: EncodeMode,
}

impl MemoryCursor {
    /// Create a cursor positioned before the first row.
    pub fn new(labels: Vec<String>, rows: Vec<FetchedRow>, mode: EncodeMode) -> Self {
        Self {
            labels,
            rows,
            position: CursorPosition::BeforeFirst,
            mode,
        }
    }

    /// Advance to the next row. Returns false once past the last row.
    pub fn next(&mut self) -> bool {
        self.position = match self.position {
            CursorPosition::BeforeFirst if !self.rows.is_empty() => CursorPosition::Row(0),
            CursorPosition::Row(i) if i + 1 < self.rows.len() => CursorPosition::Row(i + 1),
            _ => CursorPosition::AfterLast,
        };
        matches!(self.position, CursorPosition::Row(_))
    }

    /// Reposition before the first row.
    pub fn before_first(&mut self) {
        self.position = CursorPosition::BeforeFirst;
    }

    /// Position on the row at the zero-based index.
    pub fn seek(&mut self, index: usize) -> bool {
        if index < self.rows.len() {
            self.position = CursorPosition::Row(index);
            true
        } else {
            false
        }
    }

    /// All materialized rows, in order.
    pub fn rows(&self) -> &[FetchedRow] {
        &self.rows
    }

    fn current_index(&self) -> Result<usize> {
        match self.position {
            CursorPosition::BeforeFirst => Err(MarlinError::BeforeFirstRow),
            CursorPosition::AfterLast => Err(MarlinError::AfterLastRow),
            CursorPosition::Row(i) => Ok(i),
        }
    }
}

impl RowCursor for MemoryCursor {
    fn position(&self) -> CursorPosition {
        self.position
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value_at(&self, column: usize) -> Result<SqlValue> {
        let row = &self.rows[self.current_index()?];
        row.values
            .get(column)
            .cloned()
            .ok_or(MarlinError::ColumnIndexOutOfRange {
                index: column + 1,
                count: row.values.len(),
            })
    }

    fn replace_current_row(&mut self, row: FetchedRow) -> Result<()> {
        let index = self.current_index()?;
        self.rows[index] = row;
        Ok(())
    }

    fn remove_current_row(&mut self) -> Result<()> {
        let index = self.current_index()?;
        self.rows.remove(index);
        self.position = if self.rows.is_empty() {
            CursorPosition::BeforeFirst
        } else if index < self.rows.len() {
            CursorPosition::Row(index)
        } else {
            CursorPosition::AfterLast
        };
        Ok(())
    }

    fn find_column(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|name| name.eq_ignore_ascii_case(label))
            .map(|i| i + 1)
    }

    fn encode_mode(&self) -> EncodeMode {
        self.mode
    }
}
