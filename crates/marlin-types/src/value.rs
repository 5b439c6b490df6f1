use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::ColumnType;

/// A dynamically-typed SQL value.
///
/// The closed union of value kinds this layer stages and decodes. Integer
/// widths are kept distinct so a staged value binds with the same type
/// metadata the setter declared; DECIMAL stays in its textual wire form.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// TINYINT.
    TinyInt(i8),
    /// SMALLINT.
    SmallInt(i16),
    /// INT / MEDIUMINT.
    Int(i32),
    /// BIGINT.
    BigInt(i64),
    /// FLOAT.
    Float(f32),
    /// DOUBLE.
    Double(f64),
    /// DECIMAL in its textual wire form.
    Decimal(String),
    /// Character data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// DATE.
    Date(NaiveDate),
    /// TIME.
    Time(NaiveTime),
    /// DATETIME / TIMESTAMP.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Returns true if this is a NULL value.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Widen any integer variant to `i64`.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::TinyInt(v) => Some(*v as i64),
            Self::SmallInt(v) => Some(*v as i64),
            Self::Int(v) => Some(*v as i64),
            Self::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen either floating variant to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract a text reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a byte-slice reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The wire type that best describes this value, used as bind
    /// metadata when the value travels as a statement parameter.
    pub const fn wire_type(&self) -> ColumnType {
        match self {
            Self::Null => ColumnType::Null,
            Self::TinyInt(_) => ColumnType::Tiny,
            Self::SmallInt(_) => ColumnType::Short,
            Self::Int(_) => ColumnType::Long,
            Self::BigInt(_) => ColumnType::LongLong,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Decimal(_) => ColumnType::NewDecimal,
            Self::Text(_) => ColumnType::VarString,
            Self::Bytes(_) => ColumnType::Blob,
            Self::Date(_) => ColumnType::Date,
            Self::Time(_) => ColumnType::Time,
            Self::DateTime(_) => ColumnType::DateTime,
        }
    }
}

/// A parameter staged for a synthesized mutation statement.
///
/// `Null` carries the target column's declared wire type so an explicit
/// NULL is transmitted with correct type metadata; `Default` asks the
/// server to apply the column default (INSERT binding only). An unset
/// pending slot is represented outside this type, as `Option::None`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BindParam {
    /// A concrete value.
    Value(SqlValue),
    /// Explicit SQL NULL with the column's declared wire type.
    Null(ColumnType),
    /// The column's server-side default.
    Default,
}

impl BindParam {
    /// Returns true when this parameter transmits SQL NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_) | Self::Value(SqlValue::Null))
    }

    /// Returns true for the server-side default marker.
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// The concrete value, if this parameter carries one.
    pub const fn as_value(&self) -> Option<&SqlValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<SqlValue> for BindParam {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}
