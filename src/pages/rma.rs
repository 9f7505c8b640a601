use super::archive::{ArchiveOutcome, set_archived};
use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::{Row, Write, from_row, to_row};
use crate::error::OpsError;
use opsdesk_schema::{NewRma, Record, Rma, RmaPatch, Serial};
use serde_json::Value;
use tracing::info;

/// Serial status once a unit is under an RMA.
const RETURNED: &str = "returned";

impl Pages {
    pub async fn list_rmas(&self, params: &ListParams) -> Result<Vec<Rma>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn rma_detail(&self, id: &str) -> Result<Rma, OpsError> {
        self.store
            .find::<Rma>(id, &["serial"])
            .await?
            .ok_or_else(|| OpsError::not_found(Rma::TABLE, id))
    }

    /// Open an RMA. A referenced serial is marked returned in the same batch,
    /// and lends its customer when none is given.
    pub async fn open_rma(&self, new: &NewRma) -> Result<Rma, OpsError> {
        require("reason", &new.reason)?;

        let serial = match new.serial_id.as_deref() {
            Some(serial_id) => Some(self.store.get::<Serial>(serial_id).await?),
            None => None,
        };

        let mut row = to_row(new)?;
        if let Some(serial) = &serial
            && new.customer_id.is_none()
            && let Some(customer_id) = &serial.customer_id
        {
            row.insert("customer_id".to_string(), Value::String(customer_id.clone()));
        }

        let mut writes = vec![Write::insert(Rma::TABLE, row)];
        if let Some(serial) = &serial {
            let mut patch = Row::new();
            patch.insert("status".to_string(), Value::String(RETURNED.to_string()));
            writes.push(Write::update_by_id(Serial::TABLE, &serial.id, patch));
        }

        let rows = self.store.batch(writes).await?;
        let row = rows
            .into_iter()
            .next()
            .and_then(|rows| rows.into_iter().next())
            .ok_or_else(|| OpsError::validation("insert into rmas returned no row"))?;
        let rma: Rma = from_row(row)?;
        info!(
            rma_id = %rma.id,
            rma_number = ?rma.rma_number,
            serial_id = ?rma.serial_id,
            "rma opened"
        );
        Ok(rma)
    }

    pub async fn update_rma(&self, id: &str, patch: &RmaPatch) -> Result<Rma, OpsError> {
        if let Some(reason) = patch.reason.as_deref() {
            require("reason", reason)?;
        }
        self.store.update::<Rma>(id, patch).await
    }

    pub async fn archive_rma(&self, id: &str, archived: bool) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Rma::TABLE, id, archived).await
    }
}
