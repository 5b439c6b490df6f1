use thiserror::Error;

/// Primary error type for marlin row-set operations.
///
/// Structured variants for the conditions a mutable row set can raise:
/// eligibility refusals computed at construction, cursor positioning,
/// column addressing, value conversion, and statement execution.
#[derive(Error, Debug)]
pub enum MarlinError {
    // === Eligibility ===
    /// The row set cannot synthesize UPDATE/DELETE statements.
    ///
    /// The reason is computed once when the row set is built and never
    /// changes afterwards.
    #[error("row set cannot be updated or deleted: {reason}")]
    NotUpdatable { reason: String },

    /// The row set cannot synthesize INSERT statements.
    #[error("row set cannot insert rows: {reason}")]
    NotInsertable { reason: String },

    // === Cursor position ===
    /// A row-scoped mutation was attempted before the first row.
    #[error("current position is before the first row")]
    BeforeFirstRow,

    /// A row-scoped mutation was attempted after the last row.
    #[error("current position is after the last row")]
    AfterLastRow,

    // === Column addressing ===
    /// Column index outside `[1, column_count]`.
    #[error("no such column: {index} (row set has {count} columns)")]
    ColumnIndexOutOfRange { index: usize, count: usize },

    /// Column label did not resolve through the cursor's lookup.
    #[error("no such column: {name}")]
    NoSuchColumn { name: String },

    // === Conversion ===
    /// A supplied value cannot be converted to the target wire type.
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: String },

    /// The requested conversion or column kind is outside what this
    /// layer supports.
    #[error("{feature} not supported")]
    Unsupported { feature: String },

    // === Misuse ===
    /// `update_row` was called while the row set is in insert mode.
    #[error("cannot call update_row while inserting a new row")]
    UpdateWhileInsert,

    // === Execution ===
    /// NOT NULL constraint rejected by the server.
    #[error("column '{column}' cannot be null")]
    NotNullViolation { column: String },

    /// UNIQUE or PRIMARY KEY constraint rejected by the server.
    #[error("duplicate entry for key {key}")]
    UniqueViolation { key: String },

    /// The server rejected a synthesized statement.
    #[error("statement execution failed: {message}")]
    Execution { message: String },

    // === Infrastructure ===
    /// I/O error while draining a streamed value.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarlinError {
    /// SQLSTATE class for this error, for driver-level reporting.
    pub const fn sqlstate(&self) -> &'static str {
        match self {
            Self::BeforeFirstRow
            | Self::AfterLastRow
            | Self::ColumnIndexOutOfRange { .. }
            | Self::NoSuchColumn { .. }
            | Self::Conversion { .. } => "22023",
            Self::Unsupported { .. } => "0A000",
            Self::NotNullViolation { .. } | Self::UniqueViolation { .. } => "23000",
            Self::Io(_) => "08000",
            Self::NotUpdatable { .. }
            | Self::NotInsertable { .. }
            | Self::UpdateWhileInsert
            | Self::Execution { .. }
            | Self::Internal(_) => "HY000",
        }
    }

    /// Whether this error left the pending edit state intact, so the
    /// caller may correct the input and retry the same commit.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conversion { .. }
                | Self::NotNullViolation { .. }
                | Self::UniqueViolation { .. }
                | Self::Execution { .. }
        )
    }

    /// Create a not-updatable error.
    pub fn not_updatable(reason: impl Into<String>) -> Self {
        Self::NotUpdatable {
            reason: reason.into(),
        }
    }

    /// Create a not-insertable error.
    pub fn not_insertable(reason: impl Into<String>) -> Self {
        Self::NotInsertable {
            reason: reason.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Conversion {
            value: value.into(),
            target: target.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using [`MarlinError`].
pub type Result<T> = std::result::Result<T, MarlinError>;
