use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::impl_record;

/// A produced unit tracked by serial number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Serial {
    pub id: String,
    pub serial_number: String,
    pub product: Option<String>,
    pub work_order_id: Option<String>,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    /// `in_stock`, `shipped`, `installed`, `returned`.
    pub status: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Serial, "serials");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSerial {
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Return merchandise authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rma {
    pub id: String,
    /// Assigned by the backend on insert (`RMA-00001`, ...).
    pub rma_number: Option<String>,
    pub serial_id: Option<String>,
    pub customer_id: Option<String>,
    pub reason: String,
    /// `open`, `received`, `repaired`, `closed`.
    pub status: String,
    pub resolution: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<Box<Serial>>,
}

impl_record!(Rma, "rmas");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRma {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RmaPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    Inbound,
    Outbound,
}

impl MovementDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementDirection::Inbound => "inbound",
            MovementDirection::Outbound => "outbound",
        }
    }
}

/// Stock movement in or out of the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub id: String,
    pub article: String,
    pub quantity: i64,
    pub direction: MovementDirection,
    pub shipping_order_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Movement, "movements");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    pub article: String,
    pub quantity: i64,
    pub direction: MovementDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
