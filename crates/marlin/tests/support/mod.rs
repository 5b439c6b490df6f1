//! Scripted in-memory server for the integration suite.
//!
//! Implements [`Connection`] over a single table. It understands exactly
//! the statement shapes the row set synthesizes (plus `SHOW COLUMNS`),
//! applies column defaults and auto-increment the way the real server
//! would, and records every statement for assertions.

use std::cell::RefCell;
use std::rc::Rc;

use marlin::{
    BindParam, ColumnMeta, ColumnType, Connection, EncodeMode, FetchedRow, MarlinError,
    MemoryCursor, Result, SharedConnection, SqlValue, UpdatableRowSet,
};

pub struct TestColumn {
    pub name: String,
    pub type_name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<SqlValue>,
    pub auto_increment: bool,
    pub primary: bool,
}

impl TestColumn {
    pub fn int(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_name: "int(11)".to_owned(),
            column_type: ColumnType::Long,
            nullable: false,
            default: None,
            auto_increment: false,
            primary: false,
        }
    }

    pub fn varchar(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_name: "varchar(50)".to_owned(),
            column_type: ColumnType::VarChar,
            nullable: false,
            default: None,
            auto_increment: false,
            primary: false,
        }
    }

    pub fn date(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_name: "date".to_owned(),
            column_type: ColumnType::Date,
            nullable: true,
            default: None,
            auto_increment: false,
            primary: false,
        }
    }

    pub fn geometry(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_name: "geometry".to_owned(),
            column_type: ColumnType::Geometry,
            nullable: true,
            default: None,
            auto_increment: false,
            primary: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_text(mut self, value: &str) -> Self {
        self.default = Some(SqlValue::Text(value.to_owned()));
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary = true;
        self
    }
}

pub struct TestServer {
    pub schema: String,
    pub table: String,
    pub columns: Vec<TestColumn>,
    pub rows: Vec<Vec<SqlValue>>,
    pub executed: Vec<(String, Vec<BindParam>)>,
    pub queries: Vec<(String, EncodeMode)>,
}

impl TestServer {
    pub fn new(schema: &str, table: &str, columns: Vec<TestColumn>) -> Self {
        Self {
            schema: schema.to_owned(),
            table: table.to_owned(),
            columns,
            rows: Vec::new(),
            executed: Vec::new(),
            queries: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<SqlValue>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Count of executed statements starting with the given keyword.
    pub fn executed_starting_with(&self, prefix: &str) -> usize {
        self.executed
            .iter()
            .filter(|(sql, _)| sql.starts_with(prefix))
            .count()
    }

    fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// What the server stores when a column is left at its default.
    fn generated_value(&self, index: usize) -> Result<SqlValue> {
        let col = &self.columns[index];
        if col.auto_increment {
            let next = self
                .rows
                .iter()
                .filter_map(|row| row[index].as_i64())
                .max()
                .unwrap_or(0)
                + 1;
            return Ok(SqlValue::Int(i32::try_from(next).expect("test id range")));
        }
        if let Some(default) = &col.default {
            return Ok(default.clone());
        }
        if col.nullable {
            return Ok(SqlValue::Null);
        }
        Err(MarlinError::execution(format!(
            "Field '{}' doesn't have a default value",
            col.name
        )))
    }

    fn show_columns(&self) -> Vec<FetchedRow> {
        self.columns
            .iter()
            .map(|col| {
                FetchedRow::new(
                    Vec::new(),
                    vec![
                        SqlValue::Text(col.name.clone()),
                        SqlValue::Text(col.type_name.clone()),
                        SqlValue::Text(if col.nullable { "YES" } else { "NO" }.to_owned()),
                        SqlValue::Text(if col.primary { "PRI" } else { "" }.to_owned()),
                        col.default
                            .as_ref()
                            .map_or(SqlValue::Null, |d| SqlValue::Text(render(d))),
                        SqlValue::Text(
                            if col.auto_increment {
                                "auto_increment"
                            } else {
                                ""
                            }
                            .to_owned(),
                        ),
                    ],
                )
            })
            .collect()
    }

    fn handle_insert(&mut self, sql: &str, params: &[BindParam]) -> Result<u64> {
        let open = sql.find('(').ok_or_else(|| bad_sql(sql))?;
        let close = sql.find(") VALUES").ok_or_else(|| bad_sql(sql))?;
        let listed = idents(&sql[open..close]);

        let mut row = Vec::with_capacity(self.columns.len());
        for (index, col) in self.columns.iter().enumerate() {
            let value = match listed.iter().position(|name| name == &col.name) {
                Some(p) => match &params[p] {
                    BindParam::Default => self.generated_value(index)?,
                    BindParam::Null(_) => SqlValue::Null,
                    BindParam::Value(v) => v.clone(),
                },
                None => self.generated_value(index)?,
            };
            if value.is_null() && !col.nullable {
                return Err(MarlinError::NotNullViolation {
                    column: col.name.clone(),
                });
            }
            row.push(value);
        }
        self.rows.push(row);
        Ok(1)
    }

    fn handle_update(&mut self, sql: &str, params: &[BindParam]) -> Result<u64> {
        let set_start = sql.find(" SET ").ok_or_else(|| bad_sql(sql))?;
        let where_start = sql.find(" WHERE ").ok_or_else(|| bad_sql(sql))?;
        let set_cols = resolve(self, idents(&sql[set_start..where_start]))?;
        let key_cols = resolve(self, idents(&sql[where_start..]))?;
        let (set_params, key_params) = params.split_at(set_cols.len());

        let mut affected = 0;
        for row in &mut self.rows {
            if !matches_key(row, &key_cols, key_params) {
                continue;
            }
            for (index, param) in set_cols.iter().zip(set_params) {
                row[*index] = match param {
                    BindParam::Value(v) => v.clone(),
                    BindParam::Null(_) => SqlValue::Null,
                    BindParam::Default => return Err(bad_sql(sql)),
                };
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn handle_delete(&mut self, sql: &str, params: &[BindParam]) -> Result<u64> {
        let where_start = sql.find(" WHERE ").ok_or_else(|| bad_sql(sql))?;
        let key_cols = resolve(self, idents(&sql[where_start..]))?;
        let before = self.rows.len();
        self.rows
            .retain(|row| !matches_key(row, &key_cols, params));
        Ok((before - self.rows.len()) as u64)
    }

    fn handle_select(&mut self, sql: &str, params: &[BindParam]) -> Result<Vec<FetchedRow>> {
        let from_pos = sql.find(" FROM ").ok_or_else(|| bad_sql(sql))?;
        let where_start = sql.find(" WHERE ").ok_or_else(|| bad_sql(sql))?;
        let projected = resolve(self, idents(&sql[..from_pos]))?;
        let key_cols = resolve(self, idents(&sql[where_start..]))?;

        Ok(self
            .rows
            .iter()
            .filter(|row| matches_key(row, &key_cols, params))
            .map(|row| {
                let values: Vec<SqlValue> =
                    projected.iter().map(|index| row[*index].clone()).collect();
                FetchedRow::new(encode(&values), values)
            })
            .collect())
    }
}

impl Connection for TestServer {
    fn execute(&mut self, sql: &str, params: &[BindParam]) -> Result<u64> {
        self.executed.push((sql.to_owned(), params.to_vec()));
        if sql.starts_with("INSERT ") {
            self.handle_insert(sql, params)
        } else if sql.starts_with("UPDATE ") {
            self.handle_update(sql, params)
        } else if sql.starts_with("DELETE FROM ") {
            self.handle_delete(sql, params)
        } else {
            Err(bad_sql(sql))
        }
    }

    fn query(
        &mut self,
        sql: &str,
        params: &[BindParam],
        mode: EncodeMode,
    ) -> Result<Vec<FetchedRow>> {
        self.queries.push((sql.to_owned(), mode));
        if sql.starts_with("SHOW COLUMNS FROM ") {
            Ok(self.show_columns())
        } else if sql.starts_with("SELECT ") {
            self.handle_select(sql, params)
        } else {
            Err(bad_sql(sql))
        }
    }
}

/// Build a row set projecting the named columns of the server's table.
pub fn open_rowset(
    server: &Rc<RefCell<TestServer>>,
    projected: &[&str],
    mode: EncodeMode,
) -> UpdatableRowSet<MemoryCursor> {
    let (metas, labels, rows) = {
        let s = server.borrow();
        let metas: Vec<ColumnMeta> = projected
            .iter()
            .map(|name| {
                let col = s
                    .columns
                    .iter()
                    .find(|col| col.name == *name)
                    .expect("projected column exists");
                ColumnMeta::new(s.schema.clone(), s.table.clone(), col.name.clone(), col.column_type)
            })
            .collect();
        let labels: Vec<String> = projected.iter().map(|name| (*name).to_owned()).collect();
        let rows: Vec<FetchedRow> = s
            .rows
            .iter()
            .map(|row| {
                let values: Vec<SqlValue> = projected
                    .iter()
                    .map(|name| row[s.col_index(name).expect("projected column exists")].clone())
                    .collect();
                FetchedRow::new(encode(&values), values)
            })
            .collect();
        (metas, labels, rows)
    };
    let cursor = MemoryCursor::new(labels, rows, mode);
    let conn: SharedConnection = server.clone();
    UpdatableRowSet::new(conn, cursor, metas).expect("row set construction")
}

/// Build a row set from hand-rolled projection metadata (for ineligible
/// projections that never reach introspection).
pub fn open_rowset_with_metas(
    server: &Rc<RefCell<TestServer>>,
    metas: Vec<ColumnMeta>,
    labels: &[&str],
) -> UpdatableRowSet<MemoryCursor> {
    let cursor = MemoryCursor::new(
        labels.iter().map(|name| (*name).to_owned()).collect(),
        vec![FetchedRow::new(Vec::new(), vec![SqlValue::Int(1); metas.len()])],
        EncodeMode::Text,
    );
    let conn: SharedConnection = server.clone();
    UpdatableRowSet::new(conn, cursor, metas).expect("row set construction")
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_owned())
}

fn render(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.clone(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::BigInt(i) => i.to_string(),
        other => format!("{other:?}"),
    }
}

fn encode(values: &[SqlValue]) -> Vec<u8> {
    format!("{values:?}").into_bytes()
}

fn bad_sql(sql: &str) -> MarlinError {
    MarlinError::execution(format!("test server cannot parse: {sql}"))
}

/// Every backtick-quoted identifier in the fragment, in order.
fn idents(fragment: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = fragment;
    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('`') else { break };
        out.push(after[..end].to_owned());
        rest = &after[end + 1..];
    }
    out
}

fn resolve(server: &TestServer, names: Vec<String>) -> Result<Vec<usize>> {
    names
        .into_iter()
        .map(|name| {
            server
                .col_index(&name)
                .ok_or_else(|| MarlinError::execution(format!("unknown column {name}")))
        })
        .collect()
}

fn matches_key(row: &[SqlValue], key_cols: &[usize], key_params: &[BindParam]) -> bool {
    key_cols
        .iter()
        .zip(key_params)
        .all(|(index, param)| param_matches(param, &row[*index]))
}

fn param_matches(param: &BindParam, stored: &SqlValue) -> bool {
    match param {
        BindParam::Value(value) => value_eq(value, stored),
        BindParam::Null(_) => stored.is_null(),
        BindParam::Default => false,
    }
}

fn value_eq(a: &SqlValue, b: &SqlValue) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    a == b
}
