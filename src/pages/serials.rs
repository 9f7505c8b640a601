use super::archive::{ArchiveOutcome, set_archived};
use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::Select;
use crate::error::OpsError;
use opsdesk_schema::{NewSerial, Record, Serial, SerialPatch};

impl Pages {
    pub async fn list_serials(&self, params: &ListParams) -> Result<Vec<Serial>, OpsError> {
        load(&self.store, params, "serial_number").await
    }

    pub async fn find_serial(&self, serial_number: &str) -> Result<Serial, OpsError> {
        self.store
            .list::<Serial>(
                Select::from(Serial::TABLE)
                    .eq("serial_number", serial_number.trim())
                    .limit(1),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OpsError::not_found(Serial::TABLE, serial_number))
    }

    /// Serial numbers are unique; a duplicate surfaces as a conflict.
    pub async fn register_serial(&self, new: &NewSerial) -> Result<Serial, OpsError> {
        require("serial_number", &new.serial_number)?;
        let new = NewSerial {
            serial_number: new.serial_number.trim().to_string(),
            ..new.clone()
        };
        self.store.insert::<Serial>(&new).await
    }

    pub async fn update_serial(&self, id: &str, patch: &SerialPatch) -> Result<Serial, OpsError> {
        self.store.update::<Serial>(id, patch).await
    }

    pub async fn archive_serial(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Serial::TABLE, id, archived).await
    }
}
