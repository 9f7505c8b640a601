use super::Pages;
use crate::db::{Filter, Row, Select, Write, from_row, to_row};
use crate::error::OpsError;
use opsdesk_schema::{Movement, MovementDirection, NewMovement, Record, ShippingOrder};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Shipping order status once its goods are picked.
const READY: &str = "ready";

#[derive(Debug, Serialize)]
pub struct PickingCompleted {
    pub shipping_order: ShippingOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
}

impl Pages {
    /// Shipping orders still waiting to be picked, oldest first.
    pub async fn pending_picking(&self) -> Result<Vec<ShippingOrder>, OpsError> {
        self.store
            .list::<ShippingOrder>(
                Select::from(ShippingOrder::TABLE)
                    .eq("picked", false)
                    .eq("archived", false)
                    .order_by("created_at", false),
            )
            .await
    }

    /// Mark a shipping order picked and book the outbound movement, in one batch.
    ///
    /// The update only matches while `picked` is still false, so of two
    /// concurrent completions exactly one books the movement.
    pub async fn complete_picking(&self, id: &str) -> Result<PickingCompleted, OpsError> {
        let order = self.store.get::<ShippingOrder>(id).await?;
        if order.picked {
            return Err(OpsError::validation(format!(
                "shipping order {id} is already picked"
            )));
        }

        let mut patch = Row::new();
        patch.insert("picked".to_string(), Value::Bool(true));
        patch.insert("status".to_string(), Value::String(READY.to_string()));
        let claim = Write::update_where(
            ShippingOrder::TABLE,
            vec![Filter::eq("id", id), Filter::eq("picked", false)],
            patch,
        )
        .must_match();
        let mut writes = vec![claim];

        if let (Some(article), Some(quantity)) = (order.article.as_deref(), order.quantity)
            && quantity > 0
        {
            let movement = NewMovement {
                article: article.to_string(),
                quantity,
                direction: MovementDirection::Outbound,
                shipping_order_id: Some(order.id.clone()),
                note: Some("picking".to_string()),
            };
            writes.push(Write::insert(Movement::TABLE, to_row(&movement)?));
        }

        let mut results = self
            .store
            .batch(writes)
            .await
            .map_err(|e| match e {
                OpsError::Validation(_) => {
                    OpsError::validation(format!("shipping order {id} is already picked"))
                }
                other => other,
            })?
            .into_iter();
        let shipping_order = results
            .next()
            .and_then(|rows| rows.into_iter().next())
            .ok_or_else(|| OpsError::not_found(ShippingOrder::TABLE, id))
            .and_then(from_row::<ShippingOrder>)?;
        let movement = results
            .next()
            .and_then(|rows| rows.into_iter().next())
            .map(from_row::<Movement>)
            .transpose()?;

        info!(shipping_order_id = id, movement = movement.is_some(), "picking completed");
        Ok(PickingCompleted {
            shipping_order,
            movement,
        })
    }
}
