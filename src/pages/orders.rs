use super::archive::{ArchiveOutcome, set_archived};
use super::kanban::{Lane, ORDER_BOARD};
use super::status::normalize_order_status;
use super::view::{ListParams, load};
use super::{EmailRequest, Pages, new_id, require_some};
use crate::db::{Row, Select, Write, from_row, to_row};
use crate::error::OpsError;
use crate::functions::{GENERATE_ORDER_PDF, SEND_CUSTOMER_EMAIL, SEND_NOTIFICATION_EMAIL};
use opsdesk_schema::{
    Customer, Lead, NewOrder, Offer, Order, OrderPatch, OrderType, Record, ServiceOrder,
    ShippingOrder, WorkOrder,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

const INSTALLATION: &str = "installation";

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order: Option<WorkOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_order: Option<ServiceOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_order: Option<ShippingOrder>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub work_orders: Vec<WorkOrder>,
    pub service_orders: Vec<ServiceOrder>,
    pub shipping_orders: Vec<ShippingOrder>,
}

fn put(row: &mut Row, key: &str, value: impl Into<Value>) {
    row.insert(key.to_string(), value.into());
}

/// The order plus its dependent records as one write batch.
///
/// Ids are assigned here so each dependent can reference the order (and the
/// installation service order its work order) inside the same batch.
pub fn cascade_plan(new: &NewOrder) -> Result<Vec<Write>, OpsError> {
    let customer_id = require_some("customer_id", new.customer_id.as_deref())?;
    let order_type: OrderType = new
        .order_type
        .ok_or_else(|| OpsError::validation("order_type is required"))?;
    if new.quantity.is_some_and(|q| q <= 0) {
        return Err(OpsError::validation("quantity must be positive"));
    }

    let order_id = new_id();
    let mut order = to_row(new)?;
    order.remove("scheduled_date");
    order.remove("ship_to");
    put(&mut order, "id", order_id.as_str());
    put(&mut order, "customer_id", customer_id);
    put(&mut order, "order_type", order_type.as_str());

    let mut writes = vec![Write::insert(Order::TABLE, order)];

    let mut work_order_id = None;
    if order_type.needs_work_order() {
        let id = new_id();
        let mut row = Row::new();
        put(&mut row, "id", id.as_str());
        put(&mut row, "order_id", order_id.as_str());
        put(&mut row, "product", new.product.clone());
        put(&mut row, "quantity", new.quantity);
        writes.push(Write::insert(WorkOrder::TABLE, row));
        work_order_id = Some(id);
    }

    if order_type.needs_service_order() {
        let mut row = Row::new();
        put(&mut row, "id", new_id());
        put(&mut row, "order_id", order_id.as_str());
        put(&mut row, "work_order_id", work_order_id.clone());
        put(&mut row, "customer_id", customer_id);
        put(&mut row, "service_type", INSTALLATION);
        put(
            &mut row,
            "scheduled_date",
            new.scheduled_date.map(|d| d.format("%Y-%m-%d").to_string()),
        );
        writes.push(Write::insert(ServiceOrder::TABLE, row));
    }

    if order_type.needs_shipping_order() {
        let mut row = Row::new();
        put(&mut row, "id", new_id());
        put(&mut row, "order_id", order_id.as_str());
        put(&mut row, "customer_id", customer_id);
        put(&mut row, "ship_to", new.ship_to.clone());
        put(&mut row, "article", new.product.clone());
        put(&mut row, "quantity", new.quantity);
        writes.push(Write::insert(ShippingOrder::TABLE, row));
    }

    Ok(writes)
}

fn first<R: Record>(rows: Vec<Row>) -> Result<R, OpsError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| OpsError::validation(format!("insert into {} returned no row", R::TABLE)))?;
    from_row(row)
}

impl Pages {
    /// The status filter matches on the normalized status.
    pub async fn list_orders(&self, params: &ListParams) -> Result<Vec<Order>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn order_board(&self, params: &ListParams) -> Result<Vec<Lane<Order>>, OpsError> {
        let orders = self.list_orders(params).await?;
        Ok(ORDER_BOARD.group(orders, |o| normalize_order_status(&o.status)))
    }

    pub async fn order_detail(&self, id: &str) -> Result<OrderDetail, OpsError> {
        let order = self
            .store
            .find::<Order>(id, &["customer"])
            .await?
            .ok_or_else(|| OpsError::not_found(Order::TABLE, id))?;
        let by_order = |table: &str| {
            Select::from(table)
                .eq("order_id", id)
                .order_by("created_at", false)
        };
        Ok(OrderDetail {
            order,
            work_orders: self.store.list(by_order(WorkOrder::TABLE)).await?,
            service_orders: self.store.list(by_order(ServiceOrder::TABLE)).await?,
            shipping_orders: self.store.list(by_order(ShippingOrder::TABLE)).await?,
        })
    }

    /// Create an order and the dependents its type calls for, atomically.
    pub async fn create_order(&self, new: &NewOrder) -> Result<OrderCreated, OpsError> {
        let writes = cascade_plan(new)?;

        // References are checked up front so a bad id is reported before any write.
        if let Some(customer_id) = new.customer_id.as_deref() {
            self.store.get::<Customer>(customer_id).await?;
        }
        if let Some(lead_id) = new.lead_id.as_deref() {
            self.store.get::<Lead>(lead_id).await?;
        }
        if let Some(offer_id) = new.offer_id.as_deref() {
            self.store.get::<Offer>(offer_id).await?;
        }

        let tables: Vec<String> = writes.iter().map(|w| w.table().to_string()).collect();
        let mut results = self.store.batch(writes).await?.into_iter();

        let order: Order = first(results.next().unwrap_or_default())?;
        let mut created = OrderCreated {
            order,
            work_order: None,
            service_order: None,
            shipping_order: None,
        };
        for (table, rows) in tables.iter().skip(1).zip(results) {
            match table.as_str() {
                t if t == WorkOrder::TABLE => created.work_order = Some(first(rows)?),
                t if t == ServiceOrder::TABLE => created.service_order = Some(first(rows)?),
                t if t == ShippingOrder::TABLE => created.shipping_order = Some(first(rows)?),
                _ => {}
            }
        }

        info!(
            order_id = %created.order.id,
            order_number = ?created.order.order_number,
            order_type = created.order.order_type.as_str(),
            dependents = tables.len() - 1,
            "order created"
        );
        Ok(created)
    }

    pub async fn update_order(&self, id: &str, patch: &OrderPatch) -> Result<Order, OpsError> {
        if patch.quantity.is_some_and(|q| q <= 0) {
            return Err(OpsError::validation("quantity must be positive"));
        }
        self.store.update::<Order>(id, patch).await
    }

    /// Drag an order card; the current column is the normalized status.
    pub async fn move_order(&self, id: &str, dest: &str) -> Result<Order, OpsError> {
        let order = self.store.get::<Order>(id).await?;
        let current = normalize_order_status(&order.status);
        match ORDER_BOARD.move_card(&self.store, id, current, dest).await? {
            Some(row) => from_row(row),
            None => Ok(order),
        }
    }

    /// Archiving an order also archives its work, service and shipping orders.
    pub async fn archive_order(
        &self,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveOutcome, OpsError> {
        set_archived(&self.store, Order::TABLE, id, archived).await
    }

    /// Ask `generate-order-pdf` for the order document; returns its result.
    pub async fn generate_order_pdf(&self, id: &str) -> Result<Value, OpsError> {
        let order = self.store.get::<Order>(id).await?;
        self.invoke(
            GENERATE_ORDER_PDF,
            json!({ "order_id": order.id, "order_number": order.order_number }),
        )
        .await
    }

    /// Send the order confirmation to the customer's email address.
    pub async fn send_order_confirmation(&self, id: &str) -> Result<Value, OpsError> {
        let order = self
            .store
            .find::<Order>(id, &["customer"])
            .await?
            .ok_or_else(|| OpsError::not_found(Order::TABLE, id))?;
        let customer = order
            .customer
            .as_deref()
            .ok_or_else(|| OpsError::validation("order has no customer"))?;
        let to = customer
            .email
            .as_deref()
            .ok_or_else(|| OpsError::validation("customer has no email address"))?;
        let number = order.order_number.as_deref().unwrap_or(&order.id);

        self.invoke(
            SEND_CUSTOMER_EMAIL,
            json!({
                "to": to,
                "subject": format!("Order {number} confirmed"),
                "message": format!(
                    "Dear {}, your order {number} has been received.",
                    customer.contact_name.as_deref().unwrap_or(&customer.company_name)
                ),
                "order_id": order.id,
            }),
        )
        .await
    }

    /// Internal notification about an order through `send-notification-email`.
    pub async fn notify_order(&self, id: &str, email: &EmailRequest) -> Result<Value, OpsError> {
        email.validate()?;
        let order = self.store.get::<Order>(id).await?;
        self.invoke(
            SEND_NOTIFICATION_EMAIL,
            json!({
                "subject": email.subject,
                "message": email.message,
                "order_id": order.id,
                "order_number": order.order_number,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order(order_type: OrderType) -> NewOrder {
        NewOrder {
            customer_id: Some("c1".to_string()),
            order_type: Some(order_type),
            product: Some("Oven 120".to_string()),
            quantity: Some(2),
            ..NewOrder::default()
        }
    }

    fn tables(writes: &[Write]) -> Vec<&str> {
        writes.iter().map(Write::table).collect()
    }

    fn inserted(write: &Write) -> &Row {
        match write {
            Write::Insert { row, .. } => row,
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn dependents_follow_order_type() {
        let cases = [
            (OrderType::Production, vec!["orders", "work_orders"]),
            (
                OrderType::ProductionInstallation,
                vec!["orders", "work_orders", "service_orders"],
            ),
            (
                OrderType::ProductionShipping,
                vec!["orders", "work_orders", "shipping_orders"],
            ),
            (OrderType::Shipping, vec!["orders", "shipping_orders"]),
        ];
        for (order_type, expected) in cases {
            let writes = cascade_plan(&new_order(order_type)).unwrap();
            assert_eq!(tables(&writes), expected, "{order_type:?}");
        }
    }

    #[test]
    fn dependents_reference_the_order_and_installation_links_work_order() {
        let writes = cascade_plan(&new_order(OrderType::ProductionInstallation)).unwrap();
        let order_id = inserted(&writes[0])["id"].clone();
        let work_order = inserted(&writes[1]);
        let service = inserted(&writes[2]);

        assert_eq!(work_order["order_id"], order_id);
        assert_eq!(service["order_id"], order_id);
        assert_eq!(service["work_order_id"], work_order["id"]);
        assert_eq!(service["service_type"], json!("installation"));
        assert!(!inserted(&writes[0]).contains_key("scheduled_date"));
    }

    #[test]
    fn missing_customer_or_type_fails_before_any_write() {
        let mut new = new_order(OrderType::Production);
        new.customer_id = None;
        assert!(matches!(cascade_plan(&new), Err(OpsError::Validation(_))));

        let mut new = new_order(OrderType::Production);
        new.order_type = None;
        assert!(matches!(cascade_plan(&new), Err(OpsError::Validation(_))));
    }
}
