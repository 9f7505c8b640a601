use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::crm::Customer;
use crate::record::impl_record;

/// Kind of order; decides which dependent records are created with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Production work order only.
    Production,
    /// Production work order plus an installation service order.
    ProductionInstallation,
    /// Production work order plus a shipping order.
    ProductionShipping,
    /// Shipping order only (spare parts, stock goods).
    Shipping,
}

impl OrderType {
    pub const ALL: [OrderType; 4] = [
        OrderType::Production,
        OrderType::ProductionInstallation,
        OrderType::ProductionShipping,
        OrderType::Shipping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Production => "production",
            OrderType::ProductionInstallation => "production_installation",
            OrderType::ProductionShipping => "production_shipping",
            OrderType::Shipping => "shipping",
        }
    }

    pub fn needs_work_order(self) -> bool {
        !matches!(self, OrderType::Shipping)
    }

    pub fn needs_service_order(self) -> bool {
        matches!(self, OrderType::ProductionInstallation)
    }

    pub fn needs_shipping_order(self) -> bool {
        matches!(self, OrderType::ProductionShipping | OrderType::Shipping)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Assigned by the backend on insert (`ORD-00001`, ...).
    pub order_number: Option<String>,
    pub customer_id: String,
    pub lead_id: Option<String>,
    pub offer_id: Option<String>,
    pub order_type: OrderType,
    /// Raw status as stored; may hold legacy values.
    pub status: String,
    pub product: Option<String>,
    pub quantity: Option<i64>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Box<Customer>>,
}

impl_record!(Order, "orders");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    /// Required; checked before any write.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Required; checked before any write.
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Installation date for orders that spawn a service order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Production work order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkOrder {
    pub id: String,
    pub order_id: String,
    pub product: Option<String>,
    pub quantity: Option<i64>,
    pub status: String,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(WorkOrder, "work_orders");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Installation or maintenance job at the customer site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceOrder {
    pub id: String,
    pub order_id: String,
    pub work_order_id: Option<String>,
    pub customer_id: Option<String>,
    pub service_type: String,
    pub scheduled_date: Option<NaiveDate>,
    pub technician: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(ServiceOrder, "service_orders");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewServiceOrder {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingOrder {
    pub id: String,
    pub order_id: String,
    pub customer_id: Option<String>,
    pub ship_to: Option<String>,
    pub article: Option<String>,
    pub quantity: Option<i64>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub status: String,
    pub picked: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(ShippingOrder, "shipping_orders");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewShippingOrder {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingOrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
