use std::fmt;

/// Wire-level column type tags from the MariaDB/MySQL protocols.
///
/// These are the type identifiers carried in result-set column metadata.
/// `Geometry` is transported but not convertible by the mutation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    Bit,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarChar,
    VarString,
    String,
    Geometry,
}

impl ColumnType {
    /// Protocol name of this type, as used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Decimal => "DECIMAL",
            Self::Tiny => "TINYINT",
            Self::Short => "SMALLINT",
            Self::Long => "INT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Null => "NULL",
            Self::Timestamp => "TIMESTAMP",
            Self::LongLong => "BIGINT",
            Self::Int24 => "MEDIUMINT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Year => "YEAR",
            Self::Bit => "BIT",
            Self::Json => "JSON",
            Self::NewDecimal => "DECIMAL",
            Self::Enum => "ENUM",
            Self::Set => "SET",
            Self::TinyBlob => "TINYBLOB",
            Self::MediumBlob => "MEDIUMBLOB",
            Self::LongBlob => "LONGBLOB",
            Self::Blob => "BLOB",
            Self::VarChar => "VARCHAR",
            Self::VarString => "VARSTRING",
            Self::String => "CHAR",
            Self::Geometry => "GEOMETRY",
        }
    }

    /// True for the integer and floating wire types (DECIMAL excluded).
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Tiny
                | Self::Short
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::LongLong
                | Self::Int24
                | Self::Year
                | Self::Bit
        )
    }

    /// True for the date/time wire types.
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Timestamp | Self::Date | Self::Time | Self::DateTime
        )
    }

    /// True for the character wire types (values travel as text).
    pub const fn is_character(self) -> bool {
        matches!(
            self,
            Self::VarChar | Self::VarString | Self::String | Self::Json | Self::Enum | Self::Set
        )
    }

    /// True for the binary large-object wire types.
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            Self::TinyBlob | Self::MediumBlob | Self::LongBlob | Self::Blob
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text or binary row encoding of a result set.
///
/// A row set re-reads rows with the same encoding its own rows were
/// fetched with, so the decoding path stays uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EncodeMode {
    Text,
    Binary,
}

/// Metadata of one projected result column, as delivered by the wire.
///
/// `table`/`name` carry any aliases the query applied; `org_table` and
/// `org_name` are the underlying table and column names and drive all
/// schema reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub column_type: ColumnType,
}

impl ColumnMeta {
    /// Metadata for an unaliased projection of `schema`.`table`.`name`.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        let table = table.into();
        let name = name.into();
        Self {
            schema: schema.into(),
            org_table: table.clone(),
            table,
            org_name: name.clone(),
            name,
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_kind_predicates() {
        assert!(ColumnType::Long.is_numeric());
        assert!(ColumnType::Bit.is_numeric());
        assert!(!ColumnType::NewDecimal.is_numeric());
        assert!(ColumnType::Timestamp.is_temporal());
        assert!(!ColumnType::Year.is_temporal());
        assert!(ColumnType::Json.is_character());
        assert!(ColumnType::LongBlob.is_binary());
        assert!(!ColumnType::VarChar.is_binary());
    }

    #[test]
    fn type_display_name() {
        assert_eq!(ColumnType::LongLong.to_string(), "BIGINT");
        assert_eq!(ColumnType::NewDecimal.to_string(), "DECIMAL");
        assert_eq!(ColumnType::String.to_string(), "CHAR");
    }

    #[test]
    fn unaliased_meta_mirrors_names() {
        let meta = ColumnMeta::new("shop", "orders", "id", ColumnType::Long);
        assert_eq!(meta.table, "orders");
        assert_eq!(meta.org_table, "orders");
        assert_eq!(meta.name, "id");
        assert_eq!(meta.org_name, "id");
    }
}
