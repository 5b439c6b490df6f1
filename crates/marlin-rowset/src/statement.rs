//! Synthesized DML text.
//!
//! INSERT, DELETE, and the refresh SELECT depend only on the reconciled
//! schema and are built once per row set; UPDATE varies with the touched
//! column set and is rebuilt on every commit.

use std::fmt::Write as _;

use crate::metadata::{ReconciledColumn, TableIdentity};

/// Backtick-quote an identifier, doubling embedded backticks.
pub(crate) fn quote_ident(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for ch in name.chars() {
        if ch == '`' {
            quoted.push('`');
        }
        quoted.push(ch);
    }
    quoted.push('`');
    quoted
}

/// `WHERE` conjunction over every primary-key column, in descriptor order.
fn key_predicates(columns: &[ReconciledColumn]) -> String {
    let mut clause = String::new();
    for col in columns.iter().filter(|col| col.primary_key) {
        if !clause.is_empty() {
            clause.push_str(" AND ");
        }
        let _ = write!(clause, "{} = ?", quote_ident(&col.meta.org_name));
    }
    clause
}

/// INSERT listing every reconciled column with one placeholder each.
pub(crate) fn insert_sql(table: &TableIdentity, columns: &[ReconciledColumn]) -> String {
    let mut names = String::new();
    let mut placeholders = String::new();
    for (pos, col) in columns.iter().enumerate() {
        if pos != 0 {
            names.push(',');
            placeholders.push(',');
        }
        names.push_str(&quote_ident(&col.meta.org_name));
        placeholders.push('?');
    }
    format!(
        "INSERT {} ({}) VALUES ({})",
        table.qualified(),
        names,
        placeholders
    )
}

/// UPDATE over exactly the touched columns, keyed on the primary key.
pub(crate) fn update_sql(
    table: &TableIdentity,
    columns: &[ReconciledColumn],
    touched: &[bool],
) -> String {
    let mut set_clause = String::new();
    for (col, _) in columns
        .iter()
        .zip(touched)
        .filter(|(_, touched)| **touched)
    {
        if !set_clause.is_empty() {
            set_clause.push_str(", ");
        }
        let _ = write!(set_clause, "{} = ?", quote_ident(&col.meta.org_name));
    }
    format!(
        "UPDATE {} SET {} WHERE {}",
        table.qualified(),
        set_clause,
        key_predicates(columns)
    )
}

/// DELETE keyed on the primary key.
pub(crate) fn delete_sql(table: &TableIdentity, columns: &[ReconciledColumn]) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        table.qualified(),
        key_predicates(columns)
    )
}

/// SELECT of every reconciled column, keyed on the primary key, used to
/// re-read a row after a committed update.
pub(crate) fn refresh_sql(table: &TableIdentity, columns: &[ReconciledColumn]) -> String {
    let mut names = String::new();
    for (pos, col) in columns.iter().enumerate() {
        if pos != 0 {
            names.push(',');
        }
        names.push_str(&quote_ident(&col.meta.org_name));
    }
    format!(
        "SELECT {} FROM {} WHERE {}",
        names,
        table.qualified(),
        key_predicates(columns)
    )
}
