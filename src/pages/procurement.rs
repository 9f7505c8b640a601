use super::archive::{ArchiveOutcome, set_archived};
use super::view::{ListParams, load};
use super::{EmailRequest, Pages, require};
use crate::db::Row;
use crate::error::OpsError;
use crate::functions::SEND_PARTNER_EMAIL;
use opsdesk_schema::{NewPurchaseOrder, Partner, PurchaseOrder, PurchaseOrderPatch, Record};
use serde_json::{Value, json};
use tracing::info;

/// Purchase order states still waiting on the supplier.
pub const PENDING_PURCHASE_STATUSES: [&str; 2] = ["draft", "sent"];

const SENT: &str = "sent";

impl Pages {
    pub async fn list_purchase_orders(
        &self,
        params: &ListParams,
    ) -> Result<Vec<PurchaseOrder>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn create_purchase_order(
        &self,
        new: &NewPurchaseOrder,
    ) -> Result<PurchaseOrder, OpsError> {
        require("supplier_name", &new.supplier_name)?;
        if new.total_amount.is_some_and(|a| a < 0.0) {
            return Err(OpsError::validation("total_amount cannot be negative"));
        }
        if let Some(partner_id) = new.partner_id.as_deref() {
            self.store.get::<Partner>(partner_id).await?;
        }
        self.store.insert::<PurchaseOrder>(new).await
    }

    pub async fn update_purchase_order(
        &self,
        id: &str,
        patch: &PurchaseOrderPatch,
    ) -> Result<PurchaseOrder, OpsError> {
        if let Some(name) = patch.supplier_name.as_deref() {
            require("supplier_name", name)?;
        }
        self.store.update::<PurchaseOrder>(id, patch).await
    }

    pub async fn archive_purchase_order(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, PurchaseOrder::TABLE, id, archived).await
    }

    /// Email the purchase order to the supplier, then mark it sent.
    ///
    /// The status only changes once the email function succeeded.
    pub async fn send_purchase_order(
        &self,
        id: &str,
        email: &EmailRequest,
    ) -> Result<PurchaseOrder, OpsError> {
        email.validate()?;
        let po = self.store.get::<PurchaseOrder>(id).await?;
        let to = po
            .supplier_email
            .as_deref()
            .ok_or_else(|| OpsError::validation("purchase order has no supplier email"))?;

        self.invoke(
            SEND_PARTNER_EMAIL,
            json!({
                "to": to,
                "subject": email.subject,
                "message": email.message,
                "purchase_order_id": po.id,
                "po_number": po.po_number,
                "partner_id": po.partner_id,
            }),
        )
        .await?;

        let mut patch = Row::new();
        patch.insert("status".to_string(), Value::String(SENT.to_string()));
        let po = self.store.update_fields::<PurchaseOrder>(id, patch).await?;
        info!(po_id = %po.id, po_number = ?po.po_number, "purchase order sent");
        Ok(po)
    }
}
