//! Archive/restore with cascade onto declared dependents.

use crate::db::{Filter, Row, Store, Write, schema};
use crate::error::OpsError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub table: &'static str,
    pub id: String,
    pub archived: bool,
    /// Rows touched per dependent table, in declaration order.
    pub cascaded: Vec<CascadeCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CascadeCount {
    pub table: &'static str,
    pub rows: usize,
}

/// The writes that archive (or restore) `id` and exactly its dependents.
pub fn cascade_writes(table: &str, id: &str, archived: bool) -> Result<Vec<Write>, OpsError> {
    let def = schema::table(table).ok_or_else(|| OpsError::UnknownTable(table.to_string()))?;
    if !def.has_column("archived") {
        return Err(OpsError::validation(format!("{table} rows cannot be archived")));
    }

    let mut patch = Row::new();
    patch.insert("archived".to_string(), Value::Bool(archived));

    let mut writes = vec![Write::update_by_id(def.name, id, patch.clone())];
    writes.extend(def.archive_cascade.iter().map(|dep| {
        Write::update_where(dep.table, vec![Filter::eq(dep.column, id)], patch.clone())
    }));
    Ok(writes)
}

/// Flip `archived` on the parent and its dependents in one batch.
pub async fn set_archived(
    store: &Store,
    table: &str,
    id: &str,
    archived: bool,
) -> Result<ArchiveOutcome, OpsError> {
    let writes = cascade_writes(table, id, archived)?;
    let def = schema::table(table).ok_or_else(|| OpsError::UnknownTable(table.to_string()))?;

    let results = store.batch(writes).await?;
    let mut results = results.into_iter();
    if results.next().is_none_or(|rows| rows.is_empty()) {
        // Nothing matched the parent id; the dependents matched nothing either.
        return Err(OpsError::not_found(def.name, id));
    }

    let cascaded: Vec<CascadeCount> = def
        .archive_cascade
        .iter()
        .zip(results)
        .map(|(dep, rows)| CascadeCount {
            table: dep.table,
            rows: rows.len(),
        })
        .collect();

    info!(
        table = def.name,
        id,
        archived,
        cascaded = ?cascaded.iter().map(|c| (c.table, c.rows)).collect::<Vec<_>>(),
        "archive flag updated"
    );
    Ok(ArchiveOutcome {
        table: def.name,
        id: id.to_string(),
        archived,
        cascaded,
    })
}
