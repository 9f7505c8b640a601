//! Statement building and execution for [`Select`] and [`Write`] requests.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.
//! Table and column names are only ever interpolated from the static
//! registry in `schema.rs`; all values are bound.

use super::codec::{SqlValue, bind, decode_row, encode, now_timestamp};
use super::query::{Filter, FilterOp, Row, Select, Write};
use super::schema::{self, CodeSequence, Column, TableDef};
use crate::error::OpsError;
use crate::realtime::{ChangeEvent, ChangeKind};
use serde_json::Value;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::debug;

/// Rows returned by one write plus the change events it produced.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub rows: Vec<Row>,
    pub events: Vec<ChangeEvent>,
}

impl Outcome {
    fn changed(def: &TableDef, kind: ChangeKind, rows: Vec<Row>) -> Self {
        let events = rows
            .iter()
            .map(|row| ChangeEvent::new(def.name, kind, row.clone()))
            .collect();
        Self { rows, events }
    }
}

pub(crate) fn table_def(name: &str) -> Result<&'static TableDef, OpsError> {
    schema::table(name).ok_or_else(|| OpsError::UnknownTable(name.to_string()))
}

fn lookup(def: &'static TableDef, name: &str) -> Result<&'static Column, OpsError> {
    def.column(name).ok_or_else(|| OpsError::UnknownColumn {
        table: def.name.to_string(),
        column: name.to_string(),
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn where_clause(
    def: &'static TableDef,
    filters: &[Filter],
    params: &mut Vec<SqlValue>,
) -> Result<String, OpsError> {
    if filters.is_empty() {
        return Ok(String::new());
    }

    let mut parts = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = lookup(def, &filter.column)?;
        let part = match (filter.op, &filter.value) {
            (FilterOp::Eq, Value::Null) | (FilterOp::IsNull, _) => {
                format!("{} IS NULL", column.name)
            }
            (FilterOp::Neq, Value::Null) | (FilterOp::NotNull, _) => {
                format!("{} IS NOT NULL", column.name)
            }
            (FilterOp::In, Value::Array(items)) => {
                if items.is_empty() {
                    "0".to_string()
                } else {
                    for item in items {
                        params.push(encode(def, column, item)?);
                    }
                    format!("{} IN ({})", column.name, placeholders(items.len()))
                }
            }
            (FilterOp::In, _) => {
                return Err(OpsError::InvalidValue {
                    table: def.name.to_string(),
                    column: column.name.to_string(),
                    reason: "IN filter expects an array".to_string(),
                });
            }
            (FilterOp::Like, value) => {
                let pattern = value.as_str().ok_or_else(|| OpsError::InvalidValue {
                    table: def.name.to_string(),
                    column: column.name.to_string(),
                    reason: "LIKE filter expects a string pattern".to_string(),
                })?;
                params.push(SqlValue::Text(pattern.to_string()));
                format!("{} LIKE ?", column.name)
            }
            (op, value) => {
                params.push(encode(def, column, value)?);
                format!("{} {} ?", column.name, op.sql())
            }
        };
        parts.push(part);
    }

    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

async fn fetch(
    conn: &mut SqliteConnection,
    def: &'static TableDef,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<Row>, OpsError> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind(query, param);
    }
    let rows = query.fetch_all(&mut *conn).await?;
    rows.iter().map(|row| decode_row(def, row)).collect()
}

pub(crate) async fn select(conn: &mut SqliteConnection, q: &Select) -> Result<Vec<Row>, OpsError> {
    let def = table_def(&q.table)?;
    for alias in &q.embeds {
        if def.relation(alias).is_none() {
            return Err(OpsError::UnknownRelation {
                table: def.name.to_string(),
                relation: alias.clone(),
            });
        }
    }

    let mut params = Vec::new();
    let mut sql = format!("SELECT * FROM {}", def.name);
    sql.push_str(&where_clause(def, &q.filters, &mut params)?);
    if let Some(order) = &q.order {
        let column = lookup(def, &order.column)?;
        let direction = if order.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {} {direction}, id ASC", column.name));
    }
    if let Some(limit) = q.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut rows = fetch(conn, def, &sql, params).await?;
    for alias in &q.embeds {
        embed(conn, def, alias, &mut rows).await?;
    }
    Ok(rows)
}

/// Attach the referenced row (or null) under the relation alias.
async fn embed(
    conn: &mut SqliteConnection,
    def: &'static TableDef,
    alias: &str,
    rows: &mut [Row],
) -> Result<(), OpsError> {
    let Some(fk) = def.relation(alias) else {
        return Err(OpsError::UnknownRelation {
            table: def.name.to_string(),
            relation: alias.to_string(),
        });
    };
    let foreign = table_def(fk.table)?;

    let mut ids: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get(fk.column).and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();

    let mut by_id: HashMap<String, Row> = HashMap::with_capacity(ids.len());
    if !ids.is_empty() {
        let sql = format!(
            "SELECT * FROM {} WHERE id IN ({})",
            foreign.name,
            placeholders(ids.len())
        );
        let params = ids.into_iter().map(SqlValue::Text).collect();
        for row in fetch(conn, foreign, &sql, params).await? {
            if let Some(id) = row.get("id").and_then(Value::as_str).map(str::to_string) {
                by_id.insert(id, row);
            }
        }
    }

    for row in rows.iter_mut() {
        let related = row
            .get(fk.column)
            .and_then(Value::as_str)
            .and_then(|id| by_id.get(id))
            .cloned()
            .map_or(Value::Null, Value::Object);
        row.insert(fk.alias.to_string(), related);
    }
    Ok(())
}

async fn next_code(
    conn: &mut SqliteConnection,
    def: &TableDef,
    code: CodeSequence,
) -> Result<String, OpsError> {
    let sql = format!(
        "SELECT COALESCE(MAX(CAST(SUBSTR({col}, {start}) AS INTEGER)), 0) \
         FROM {table} WHERE {col} LIKE ?",
        col = code.column,
        start = code.prefix.len() + 2,
        table = def.name,
    );
    let last: i64 = sqlx::query_scalar(&sql)
        .bind(format!("{}-%", code.prefix))
        .fetch_one(&mut *conn)
        .await?;
    Ok(format!("{}-{:05}", code.prefix, last + 1))
}

/// Fill backend-owned fields (id, timestamps, code sequence) and reject
/// unknown columns.
async fn prepare_insert(
    conn: &mut SqliteConnection,
    def: &'static TableDef,
    mut row: Row,
) -> Result<Row, OpsError> {
    for name in row.keys() {
        lookup(def, name)?;
    }

    let missing = |row: &Row, name: &str| row.get(name).is_none_or(Value::is_null);

    if missing(&row, "id") {
        row.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }
    let now = now_timestamp();
    for stamp in ["created_at", "updated_at"] {
        if def.has_column(stamp) && missing(&row, stamp) {
            row.insert(stamp.to_string(), Value::String(now.clone()));
        }
    }
    if let Some(code) = def.code
        && missing(&row, code.column)
    {
        let next = next_code(conn, def, code).await?;
        row.insert(code.column.to_string(), Value::String(next));
    }
    Ok(row)
}

fn insert_sql(
    def: &'static TableDef,
    row: &Row,
    on_conflict: Option<&[&'static Column]>,
) -> Result<(String, Vec<SqlValue>), OpsError> {
    let mut names = Vec::new();
    let mut params = Vec::new();
    for column in def.columns {
        let Some(value) = row.get(column.name) else {
            continue;
        };
        // Let the column DEFAULT apply instead of writing NULL into it.
        if value.is_null() && column.default.is_some() {
            continue;
        }
        names.push(column.name);
        params.push(encode(def, column, value)?);
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        def.name,
        names.join(", "),
        placeholders(names.len())
    );
    if let Some(columns) = on_conflict {
        let target: Vec<&str> = columns.iter().map(|c| c.name).collect();
        sql.push_str(&format!(" ON CONFLICT({}) DO NOTHING", target.join(", ")));
    }
    sql.push_str(" RETURNING *");
    Ok((sql, params))
}

pub(crate) async fn write(conn: &mut SqliteConnection, write: Write) -> Result<Outcome, OpsError> {
    match write {
        Write::Insert { table, row } => {
            let def = table_def(&table)?;
            let row = prepare_insert(conn, def, row).await?;
            let (sql, params) = insert_sql(def, &row, None)?;
            let rows = fetch(conn, def, &sql, params).await?;
            debug!(table = def.name, affected = rows.len(), "db insert applied");
            Ok(Outcome::changed(def, ChangeKind::Insert, rows))
        }

        Write::Upsert {
            table,
            row,
            on_conflict,
        } => {
            let def = table_def(&table)?;
            if on_conflict.is_empty() {
                return Err(OpsError::validation(format!(
                    "upsert into {table} needs at least one conflict column"
                )));
            }
            let mut targets = Vec::with_capacity(on_conflict.len());
            for name in &on_conflict {
                let column = lookup(def, name)?;
                if !(column.unique || column.name == "id") {
                    return Err(OpsError::validation(format!(
                        "{table}.{name} is not unique and cannot be an upsert key"
                    )));
                }
                targets.push(column);
            }

            let row = prepare_insert(conn, def, row).await?;
            let (sql, params) = insert_sql(def, &row, Some(&targets))?;
            let inserted = fetch(conn, def, &sql, params).await?;
            if !inserted.is_empty() {
                debug!(table = def.name, "db upsert inserted");
                return Ok(Outcome::changed(def, ChangeKind::Insert, inserted));
            }

            let filters = targets
                .iter()
                .map(|c| Filter::eq(c.name, row.get(c.name).cloned().unwrap_or(Value::Null)))
                .collect();
            let existing = select(
                conn,
                &Select {
                    filters,
                    ..Select::from(def.name)
                },
            )
            .await?;
            debug!(table = def.name, "db upsert matched existing row");
            Ok(Outcome {
                rows: existing,
                events: Vec::new(),
            })
        }

        Write::Update {
            table,
            filters,
            patch,
            must_match,
        } => {
            let def = table_def(&table)?;
            if filters.is_empty() {
                return Err(OpsError::validation(format!(
                    "refusing to update {table} without filters"
                )));
            }

            let mut sets = Vec::with_capacity(patch.len() + 1);
            let mut params = Vec::with_capacity(patch.len() + filters.len() + 1);
            for (name, value) in &patch {
                if name == "id" || name == "created_at" {
                    return Err(OpsError::validation(format!("{table}.{name} cannot be patched")));
                }
                if name == "updated_at" {
                    continue;
                }
                let column = lookup(def, name)?;
                sets.push(format!("{} = ?", column.name));
                params.push(encode(def, column, value)?);
            }
            if def.has_column("updated_at") {
                sets.push("updated_at = ?".to_string());
                params.push(SqlValue::Text(now_timestamp()));
            }

            let filter_sql = where_clause(def, &filters, &mut params)?;
            let sql = format!(
                "UPDATE {} SET {}{} RETURNING *",
                def.name,
                sets.join(", "),
                filter_sql
            );
            let rows = fetch(conn, def, &sql, params).await?;
            if must_match && rows.is_empty() {
                return Err(OpsError::validation(format!(
                    "no {table} row matched the update filters"
                )));
            }
            debug!(
                table = def.name,
                affected = rows.len(),
                fields = patch.len(),
                "db patch applied"
            );
            Ok(Outcome::changed(def, ChangeKind::Update, rows))
        }

        Write::Delete { table, filters } => {
            let def = table_def(&table)?;
            if filters.is_empty() {
                return Err(OpsError::validation(format!(
                    "refusing to delete from {table} without filters"
                )));
            }
            let mut params = Vec::with_capacity(filters.len());
            let filter_sql = where_clause(def, &filters, &mut params)?;
            let sql = format!("DELETE FROM {}{} RETURNING *", def.name, filter_sql);
            let rows = fetch(conn, def, &sql, params).await?;
            debug!(table = def.name, affected = rows.len(), "db delete applied");
            Ok(Outcome::changed(def, ChangeKind::Delete, rows))
        }
    }
}
