//! The data-access seam every page goes through.
//!
//! Pages only see [`Store`]; the backend behind it is a [`DataAccess`]
//! implementation (the SQLite actor in production, wrappers in tests).

use super::actor::DbActorHandle;
use super::query::{Filter, Row, Select, Write};
use crate::error::OpsError;
use async_trait::async_trait;
use opsdesk_schema::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn select(&self, select: Select) -> Result<Vec<Row>, OpsError>;

    async fn write(&self, write: Write) -> Result<Vec<Row>, OpsError>;

    /// All-or-nothing: on error no write of the batch persists.
    async fn batch(&self, writes: Vec<Write>) -> Result<Vec<Vec<Row>>, OpsError>;
}

#[async_trait]
impl DataAccess for DbActorHandle {
    async fn select(&self, select: Select) -> Result<Vec<Row>, OpsError> {
        DbActorHandle::select(self, select).await
    }

    async fn write(&self, write: Write) -> Result<Vec<Row>, OpsError> {
        DbActorHandle::write(self, write).await
    }

    async fn batch(&self, writes: Vec<Write>) -> Result<Vec<Vec<Row>>, OpsError> {
        DbActorHandle::batch(self, writes).await
    }
}

/// Serialize a value into a row; non-object values are rejected.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, OpsError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(OpsError::validation(format!(
            "expected an object, got {other}"
        ))),
    }
}

pub fn from_row<R: DeserializeOwned>(row: Row) -> Result<R, OpsError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Cloneable, typed front over a [`DataAccess`] backend.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn DataAccess>,
}

impl Store {
    pub fn new(inner: Arc<dyn DataAccess>) -> Self {
        Self { inner }
    }

    pub fn backend(&self) -> &Arc<dyn DataAccess> {
        &self.inner
    }

    pub async fn select(&self, select: Select) -> Result<Vec<Row>, OpsError> {
        self.inner.select(select).await
    }

    pub async fn write(&self, write: Write) -> Result<Vec<Row>, OpsError> {
        self.inner.write(write).await
    }

    pub async fn batch(&self, writes: Vec<Write>) -> Result<Vec<Vec<Row>>, OpsError> {
        self.inner.batch(writes).await
    }

    /// Typed list. `select.table` is overridden with `R::TABLE`.
    pub async fn list<R: Record>(&self, mut select: Select) -> Result<Vec<R>, OpsError> {
        select.table = R::TABLE.to_string();
        self.inner
            .select(select)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    pub async fn find<R: Record>(&self, id: &str, embeds: &[&str]) -> Result<Option<R>, OpsError> {
        let mut select = Select::from(R::TABLE).eq("id", id).limit(1);
        for alias in embeds {
            select = select.embed(alias);
        }
        self.list::<R>(select).await.map(|rows| rows.into_iter().next())
    }

    pub async fn get<R: Record>(&self, id: &str) -> Result<R, OpsError> {
        self.find::<R>(id, &[])
            .await?
            .ok_or_else(|| OpsError::not_found(R::TABLE, id))
    }

    pub async fn insert<R: Record>(&self, new: &impl Serialize) -> Result<R, OpsError> {
        let rows = self.inner.write(Write::insert(R::TABLE, to_row(new)?)).await?;
        single::<R>(rows, R::TABLE, "insert")
    }

    pub async fn update<R: Record>(&self, id: &str, patch: &impl Serialize) -> Result<R, OpsError> {
        self.update_fields::<R>(id, to_row(patch)?).await
    }

    pub async fn update_fields<R: Record>(&self, id: &str, patch: Row) -> Result<R, OpsError> {
        if patch.is_empty() {
            return self.get::<R>(id).await;
        }
        let rows = self
            .inner
            .write(Write::update_by_id(R::TABLE, id, patch))
            .await?;
        rows.into_iter()
            .next()
            .map(from_row)
            .transpose()?
            .ok_or_else(|| OpsError::not_found(R::TABLE, id))
    }

    pub async fn update_where(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Row,
    ) -> Result<Vec<Row>, OpsError> {
        self.inner
            .write(Write::update_where(table, filters, patch))
            .await
    }

    pub async fn delete<R: Record>(&self, id: &str) -> Result<(), OpsError> {
        let rows = self.inner.write(Write::delete_by_id(R::TABLE, id)).await?;
        if rows.is_empty() {
            return Err(OpsError::not_found(R::TABLE, id));
        }
        Ok(())
    }
}

fn single<R: DeserializeOwned>(rows: Vec<Row>, table: &str, op: &str) -> Result<R, OpsError> {
    let row = rows.into_iter().next().ok_or_else(|| {
        OpsError::validation(format!("{op} into {table} returned no row"))
    })?;
    from_row(row)
}
