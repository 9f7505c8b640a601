use super::archive::{ArchiveOutcome, set_archived};
use super::kanban::{Lane, WORK_ORDER_BOARD};
use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::{Select, from_row};
use crate::error::OpsError;
use opsdesk_schema::{
    NewServiceOrder, NewShippingOrder, NewWorkOrder, Order, Record, ServiceOrder,
    ServiceOrderPatch, ShippingOrder, ShippingOrderPatch, WorkOrder, WorkOrderPatch,
};

impl Pages {
    pub async fn list_work_orders(&self, params: &ListParams) -> Result<Vec<WorkOrder>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn work_order_board(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Lane<WorkOrder>>, OpsError> {
        let work_orders = self.list_work_orders(params).await?;
        Ok(WORK_ORDER_BOARD.group(work_orders, |wo| wo.status.as_str()))
    }

    /// Work orders are normally created with their order; this adds one by hand.
    pub async fn create_work_order(&self, new: &NewWorkOrder) -> Result<WorkOrder, OpsError> {
        require("order_id", &new.order_id)?;
        self.store.get::<Order>(&new.order_id).await?;
        self.store.insert::<WorkOrder>(new).await
    }

    pub async fn update_work_order(
        &self,
        id: &str,
        patch: &WorkOrderPatch,
    ) -> Result<WorkOrder, OpsError> {
        self.store.update::<WorkOrder>(id, patch).await
    }

    pub async fn move_work_order(&self, id: &str, dest: &str) -> Result<WorkOrder, OpsError> {
        let work_order = self.store.get::<WorkOrder>(id).await?;
        match WORK_ORDER_BOARD
            .move_card(&self.store, id, &work_order.status, dest)
            .await?
        {
            Some(row) => from_row(row),
            None => Ok(work_order),
        }
    }

    pub async fn archive_work_order(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, WorkOrder::TABLE, id, archived).await
    }

    pub async fn list_service_orders(
        &self,
        params: &ListParams,
    ) -> Result<Vec<ServiceOrder>, OpsError> {
        load(&self.store, params, "scheduled_date").await
    }

    pub async fn create_service_order(
        &self,
        new: &NewServiceOrder,
    ) -> Result<ServiceOrder, OpsError> {
        require("order_id", &new.order_id)?;
        require("service_type", &new.service_type)?;
        self.store.get::<Order>(&new.order_id).await?;
        self.store.insert::<ServiceOrder>(new).await
    }

    pub async fn update_service_order(
        &self,
        id: &str,
        patch: &ServiceOrderPatch,
    ) -> Result<ServiceOrder, OpsError> {
        self.store.update::<ServiceOrder>(id, patch).await
    }

    pub async fn archive_service_order(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, ServiceOrder::TABLE, id, archived).await
    }

    pub async fn list_shipping_orders(
        &self,
        params: &ListParams,
    ) -> Result<Vec<ShippingOrder>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn create_shipping_order(
        &self,
        new: &NewShippingOrder,
    ) -> Result<ShippingOrder, OpsError> {
        require("order_id", &new.order_id)?;
        if new.quantity.is_some_and(|q| q <= 0) {
            return Err(OpsError::validation("quantity must be positive"));
        }
        self.store.get::<Order>(&new.order_id).await?;
        self.store.insert::<ShippingOrder>(new).await
    }

    pub async fn update_shipping_order(
        &self,
        id: &str,
        patch: &ShippingOrderPatch,
    ) -> Result<ShippingOrder, OpsError> {
        self.store.update::<ShippingOrder>(id, patch).await
    }

    pub async fn archive_shipping_order(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, ShippingOrder::TABLE, id, archived).await
    }

    /// Work orders belonging to one order, oldest first.
    pub async fn work_orders_for_order(&self, order_id: &str) -> Result<Vec<WorkOrder>, OpsError> {
        self.store
            .list::<WorkOrder>(
                Select::from(WorkOrder::TABLE)
                    .eq("order_id", order_id)
                    .order_by("created_at", false),
            )
            .await
    }
}
