//! Generic value staging.
//!
//! The `update_value` entry point accepts a closed union of input kinds
//! and dispatches on input kind crossed with the target column's wire
//! type: textual inputs are parsed for numeric and temporal targets,
//! numeric inputs narrow with overflow checks, byte sequences only reach
//! binary columns. GEOMETRY is transported by the protocol but not
//! convertible here, so it is rejected before anything is staged.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use marlin_error::{MarlinError, Result};
use marlin_types::{BindParam, ColumnType, SqlValue};

/// The supported input kinds for generic value staging.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// Convert an input value into a parameter bound as `target`.
pub fn coerce(input: ValueInput, target: ColumnType) -> Result<BindParam> {
    if target == ColumnType::Geometry {
        return Err(MarlinError::unsupported("GEOMETRY values"));
    }
    match input {
        ValueInput::Null => Ok(BindParam::Null(target)),
        ValueInput::Bool(b) => from_bool(b, target),
        ValueInput::Int(v) => from_int(v, target),
        ValueInput::Float(v) => from_float(v, target),
        ValueInput::Decimal(s) => {
            if s.trim().parse::<f64>().is_err() {
                return Err(MarlinError::conversion(s, target.name()));
            }
            from_text(s, target)
        }
        ValueInput::Text(s) => from_text(s, target),
        ValueInput::Bytes(b) => from_bytes(b, target),
        ValueInput::Date(d) => from_date(d, target),
        ValueInput::Time(t) => from_time(t, target),
        ValueInput::DateTime(dt) => from_datetime(dt, target),
    }
}

fn value(v: SqlValue) -> Result<BindParam> {
    Ok(BindParam::Value(v))
}

fn from_text(s: String, target: ColumnType) -> Result<BindParam> {
    let fail = |s: &str| MarlinError::conversion(s, target.name());
    match target {
        ColumnType::Bit => {
            let falsy = s == "0" || s.eq_ignore_ascii_case("false");
            value(SqlValue::TinyInt(i8::from(!falsy)))
        }
        ColumnType::Tiny => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::TinyInt(v)),
        ),
        ColumnType::Short | ColumnType::Year => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::SmallInt(v)),
        ),
        ColumnType::Int24 | ColumnType::Long => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::Int(v)),
        ),
        ColumnType::LongLong => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::BigInt(v)),
        ),
        ColumnType::Float => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::Float(v)),
        ),
        ColumnType::Double => s.trim().parse().map_or_else(
            |_| Err(fail(&s)),
            |v| value(SqlValue::Double(v)),
        ),
        ColumnType::Decimal | ColumnType::NewDecimal => {
            if s.trim().parse::<f64>().is_err() {
                return Err(fail(&s));
            }
            value(SqlValue::Decimal(s))
        }
        ColumnType::VarChar
        | ColumnType::VarString
        | ColumnType::String
        | ColumnType::Json
        | ColumnType::Enum
        | ColumnType::Set => value(SqlValue::Text(s)),
        ColumnType::Date => {
            if s.starts_with("0000-00-00") {
                return Ok(BindParam::Null(target));
            }
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_or_else(|_| Err(fail(&s)), |d| value(SqlValue::Date(d)))
        }
        ColumnType::Time => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
            .map_or_else(|_| Err(fail(&s)), |t| value(SqlValue::Time(t))),
        ColumnType::DateTime | ColumnType::Timestamp => {
            if s.starts_with("0000-00-00") {
                return Ok(BindParam::Null(target));
            }
            NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
                .map_or_else(|_| Err(fail(&s)), |dt| value(SqlValue::DateTime(dt)))
        }
        _ => Err(fail(&s)),
    }
}

fn from_int(v: i64, target: ColumnType) -> Result<BindParam> {
    let fail = || MarlinError::conversion(v.to_string(), target.name());
    match target {
        ColumnType::Bit => value(SqlValue::TinyInt(i8::from(v != 0))),
        ColumnType::Tiny => i8::try_from(v)
            .map_or_else(|_| Err(fail()), |v| value(SqlValue::TinyInt(v))),
        ColumnType::Short | ColumnType::Year => i16::try_from(v)
            .map_or_else(|_| Err(fail()), |v| value(SqlValue::SmallInt(v))),
        ColumnType::Int24 | ColumnType::Long => i32::try_from(v)
            .map_or_else(|_| Err(fail()), |v| value(SqlValue::Int(v))),
        ColumnType::LongLong => value(SqlValue::BigInt(v)),
        #[allow(clippy::cast_precision_loss)]
        ColumnType::Float => value(SqlValue::Float(v as f32)),
        #[allow(clippy::cast_precision_loss)]
        ColumnType::Double => value(SqlValue::Double(v as f64)),
        ColumnType::Decimal | ColumnType::NewDecimal => {
            value(SqlValue::Decimal(v.to_string()))
        }
        ColumnType::VarChar
        | ColumnType::VarString
        | ColumnType::String
        | ColumnType::Enum
        | ColumnType::Set => value(SqlValue::Text(v.to_string())),
        _ => Err(fail()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn from_float(v: f64, target: ColumnType) -> Result<BindParam> {
    let fail = || MarlinError::conversion(v.to_string(), target.name());
    match target {
        ColumnType::Bit => value(SqlValue::TinyInt(i8::from(v != 0.0))),
        #[allow(clippy::cast_possible_truncation)]
        ColumnType::Float => value(SqlValue::Float(v as f32)),
        ColumnType::Double => value(SqlValue::Double(v)),
        ColumnType::Decimal | ColumnType::NewDecimal => {
            value(SqlValue::Decimal(v.to_string()))
        }
        ColumnType::Tiny
        | ColumnType::Short
        | ColumnType::Year
        | ColumnType::Int24
        | ColumnType::Long
        | ColumnType::LongLong => {
            // Truncation toward zero, rejected when out of i64 range.
            let truncated = v.trunc();
            if !truncated.is_finite()
                || truncated < -9_223_372_036_854_775_808.0
                || truncated >= 9_223_372_036_854_775_808.0
            {
                return Err(fail());
            }
            from_int(truncated as i64, target).map_err(|_| fail())
        }
        ColumnType::VarChar
        | ColumnType::VarString
        | ColumnType::String
        | ColumnType::Enum
        | ColumnType::Set => value(SqlValue::Text(v.to_string())),
        _ => Err(fail()),
    }
}

fn from_bool(b: bool, target: ColumnType) -> Result<BindParam> {
    match target {
        ColumnType::Bit | ColumnType::Tiny => value(SqlValue::TinyInt(i8::from(b))),
        ColumnType::Short | ColumnType::Year => value(SqlValue::SmallInt(i16::from(b))),
        ColumnType::Int24 | ColumnType::Long => value(SqlValue::Int(i32::from(b))),
        ColumnType::LongLong => value(SqlValue::BigInt(i64::from(b))),
        ColumnType::VarChar | ColumnType::VarString | ColumnType::String => {
            value(SqlValue::Text(if b { "1" } else { "0" }.to_owned()))
        }
        _ => Err(MarlinError::conversion(b.to_string(), target.name())),
    }
}

fn from_bytes(b: Vec<u8>, target: ColumnType) -> Result<BindParam> {
    if target.is_binary() || target == ColumnType::VarString {
        value(SqlValue::Bytes(b))
    } else {
        Err(MarlinError::conversion(
            format!("a {}-byte binary value", b.len()),
            target.name(),
        ))
    }
}

fn from_date(d: NaiveDate, target: ColumnType) -> Result<BindParam> {
    match target {
        ColumnType::Date | ColumnType::DateTime | ColumnType::Timestamp => {
            value(SqlValue::Date(d))
        }
        _ => Err(MarlinError::conversion(d.to_string(), target.name())),
    }
}

fn from_time(t: NaiveTime, target: ColumnType) -> Result<BindParam> {
    match target {
        ColumnType::Time => value(SqlValue::Time(t)),
        _ => Err(MarlinError::conversion(t.to_string(), target.name())),
    }
}

fn from_datetime(dt: NaiveDateTime, target: ColumnType) -> Result<BindParam> {
    match target {
        ColumnType::DateTime | ColumnType::Timestamp | ColumnType::Date => {
            value(SqlValue::DateTime(dt))
        }
        _ => Err(MarlinError::conversion(dt.to_string(), target.name())),
    }
}
