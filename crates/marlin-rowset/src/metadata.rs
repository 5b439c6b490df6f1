//! Metadata reconciliation.
//!
//! At row-set construction the projected column metadata is validated for
//! single-table origin and merged with the live table schema (one
//! `SHOW COLUMNS` round trip). The outcome, per-column flags plus the
//! three eligibility verdicts, is immutable for the life of the row set;
//! mutating calls only ever re-read it.

use std::fmt;
use std::sync::Arc;

use marlin_error::{MarlinError, Result};
use marlin_types::{ColumnMeta, EncodeMode, SqlValue};
use tracing::debug;

use crate::conn::SharedConnection;
use crate::statement::quote_ident;

/// The single table a mutable projection resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdentity {
    pub schema: String,
    pub table: String,
}

impl TableIdentity {
    /// Backtick-quoted `schema`.`table` form used in synthesized SQL.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// A projected column stamped with its schema-derived mutation flags.
#[derive(Debug, Clone)]
pub struct ReconciledColumn {
    pub meta: ColumnMeta,
    pub nullable: bool,
    pub has_default: bool,
    pub generated: bool,
    pub primary_key: bool,
}

impl ReconciledColumn {
    fn unstamped(meta: ColumnMeta) -> Self {
        Self {
            meta,
            nullable: false,
            has_default: false,
            generated: false,
            primary_key: false,
        }
    }
}

/// What the row set is permitted to do, decided once at construction.
///
/// The first failure per category wins: later checks may find more
/// reasons, but the stored message never changes once set.
#[derive(Debug, Clone)]
pub struct Eligibility {
    can_update: bool,
    can_insert: bool,
    can_refresh: bool,
    update_reason: Option<String>,
    insert_reason: Option<String>,
}

impl Eligibility {
    fn permissive() -> Self {
        Self {
            can_update: true,
            can_insert: true,
            can_refresh: false,
            update_reason: None,
            insert_reason: None,
        }
    }

    pub const fn can_update(&self) -> bool {
        self.can_update
    }

    pub const fn can_insert(&self) -> bool {
        self.can_insert
    }

    pub const fn can_refresh(&self) -> bool {
        self.can_refresh
    }

    /// Reason update/delete is disabled, if it is.
    pub fn update_reason(&self) -> Option<&str> {
        self.update_reason.as_deref()
    }

    /// Reason insert is disabled, if it is.
    pub fn insert_reason(&self) -> Option<&str> {
        self.insert_reason.as_deref()
    }

    /// The error a refused update/delete call reports.
    pub fn update_error(&self) -> MarlinError {
        MarlinError::not_updatable(self.update_reason.clone().unwrap_or_default())
    }

    /// The error a refused insert call reports.
    pub fn insert_error(&self) -> MarlinError {
        MarlinError::not_insertable(self.insert_reason.clone().unwrap_or_default())
    }

    fn deny_update(&mut self, reason: &str) {
        if self.update_reason.is_none() {
            self.update_reason = Some(reason.to_owned());
        }
        self.can_update = false;
    }

    fn deny_insert(&mut self, reason: &str) {
        if self.insert_reason.is_none() {
            self.insert_reason = Some(reason.to_owned());
        }
        self.can_insert = false;
    }

    fn deny_both(&mut self, reason: &str) {
        self.deny_update(reason);
        self.deny_insert(reason);
    }
}

/// One parsed `SHOW COLUMNS` row.
///
/// Field layout is positional: Field, Type, Null, Key, Default, Extra.
/// UNIQUE indexes are reported as `PRI` by the introspection source, so a
/// single `PRI` test covers both.
#[derive(Debug, Clone)]
struct SchemaColumn {
    name: String,
    nullable: bool,
    has_default: bool,
    primary: bool,
    extra: String,
}

impl SchemaColumn {
    fn from_row(values: &[SqlValue]) -> Result<Self> {
        let text = |index: usize| -> Result<&str> {
            match values.get(index) {
                Some(SqlValue::Text(s)) => Ok(s),
                _ => Err(MarlinError::internal(format!(
                    "malformed SHOW COLUMNS row: field {index} missing or not text"
                ))),
            }
        };
        Ok(Self {
            name: text(0)?.to_owned(),
            nullable: text(2)? == "YES",
            primary: text(3)? == "PRI",
            has_default: values.get(4).is_some_and(|v| !v.is_null()),
            extra: text(5)?.to_owned(),
        })
    }

    fn is_generated(&self) -> bool {
        !self.extra.is_empty()
    }

    fn is_auto_increment(&self) -> bool {
        self.extra.contains("auto_increment")
    }
}

/// Outcome of metadata reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub identity: Option<TableIdentity>,
    pub columns: Arc<[ReconciledColumn]>,
    pub eligibility: Eligibility,
}

/// Merge the projected columns with the live schema of their table.
///
/// Errors are returned only for infrastructure failures (introspection
/// round trip, malformed introspection rows); every schema-level problem
/// instead lands in the returned [`Eligibility`] and surfaces lazily at
/// the first mutating call.
pub fn reconcile(conn: &SharedConnection, projected: &[ColumnMeta]) -> Result<Reconciled> {
    let mut eligibility = Eligibility::permissive();

    // Every projected column must agree on one non-empty schema + table.
    let mut schema: Option<&str> = None;
    let mut table: Option<&str> = None;
    for col in projected {
        if col.schema.is_empty() {
            eligibility.deny_both("unknown database");
        } else {
            if schema.is_some_and(|s| s != col.schema) {
                eligibility.deny_both("query spans different databases");
            }
            schema = Some(&col.schema);
        }
        if col.org_table.is_empty() {
            eligibility.deny_both("unknown table");
        } else {
            if table.is_some_and(|t| t != col.org_table) {
                eligibility.deny_both("query spans different tables");
            }
            table = Some(&col.org_table);
        }
    }
    if schema.is_none() {
        eligibility.deny_both("unknown database");
    }
    if table.is_none() {
        eligibility.deny_both("unknown table");
    }

    let identity = schema.zip(table).map(|(schema, table)| TableIdentity {
        schema: schema.to_owned(),
        table: table.to_owned(),
    });

    let mut columns: Vec<ReconciledColumn> = projected
        .iter()
        .cloned()
        .map(ReconciledColumn::unstamped)
        .collect();

    if eligibility.can_update() {
        let Some(identity) = &identity else {
            return Err(MarlinError::internal(
                "table identity missing for an updatable projection",
            ));
        };
        let sql = format!("SHOW COLUMNS FROM {}", identity.qualified());
        debug!(sql = %sql, "introspecting table schema");
        let rows = conn.borrow_mut().query(&sql, &[], EncodeMode::Text)?;

        let mut matched = 0usize;
        let mut primary_found = false;
        for fetched in &rows {
            let schema_col = SchemaColumn::from_row(&fetched.values)?;
            if schema_col.primary {
                primary_found = true;
            }

            match projected
                .iter()
                .position(|col| col.org_name == schema_col.name)
            {
                Some(index) => {
                    let stamped = &mut columns[index];
                    stamped.nullable = schema_col.nullable;
                    stamped.has_default = schema_col.has_default;
                    stamped.generated = schema_col.is_generated();
                    stamped.primary_key = schema_col.primary;
                    matched += 1;
                }
                None => {
                    if schema_col.primary {
                        // The key must be selectable to locate rows.
                        eligibility.deny_update(&format!(
                            "primary key column `{}` is not in the projection",
                            schema_col.name
                        ));
                        if !schema_col.is_auto_increment() {
                            eligibility.deny_insert(&format!(
                                "primary key column `{}` is not auto-generated and is not in the projection",
                                schema_col.name
                            ));
                        }
                    }
                    if !schema_col.nullable
                        && !schema_col.has_default
                        && !schema_col.is_generated()
                    {
                        eligibility.deny_update(&format!(
                            "column `{}` is not in the projection and cannot be null",
                            schema_col.name
                        ));
                    }
                }
            }
        }

        if primary_found {
            eligibility.can_refresh = true;
        } else {
            eligibility
                .deny_update(&format!("table {} has no primary key", identity.qualified()));
        }

        if matched != projected.len() {
            eligibility.deny_both(&format!(
                "column metadata for table {} is inconsistent",
                identity.qualified()
            ));
        }
    }

    debug!(
        can_update = eligibility.can_update(),
        can_insert = eligibility.can_insert(),
        can_refresh = eligibility.can_refresh(),
        "reconciled result-set metadata"
    );

    Ok(Reconciled {
        identity,
        columns: columns.into(),
        eligibility,
    })
}
