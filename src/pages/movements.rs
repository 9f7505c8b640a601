use super::view::{ListParams, load};
use super::{Pages, require};
use crate::db::Select;
use crate::error::OpsError;
use opsdesk_schema::{Movement, MovementDirection, NewMovement, Record};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub article: String,
    pub inbound: i64,
    pub outbound: i64,
    pub on_hand: i64,
}

/// Per-article stock: inbound minus outbound over all movements.
pub fn stock_levels(movements: &[Movement]) -> Vec<StockLevel> {
    let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for m in movements {
        let entry = totals.entry(m.article.as_str()).or_default();
        match m.direction {
            MovementDirection::Inbound => entry.0 += m.quantity,
            MovementDirection::Outbound => entry.1 += m.quantity,
        }
    }
    totals
        .into_iter()
        .map(|(article, (inbound, outbound))| StockLevel {
            article: article.to_string(),
            inbound,
            outbound,
            on_hand: inbound - outbound,
        })
        .collect()
}

impl Pages {
    pub async fn list_movements(&self, params: &ListParams) -> Result<Vec<Movement>, OpsError> {
        load(&self.store, params, "created_at").await
    }

    pub async fn record_movement(&self, new: &NewMovement) -> Result<Movement, OpsError> {
        require("article", &new.article)?;
        if new.quantity <= 0 {
            return Err(OpsError::validation("quantity must be positive"));
        }
        self.store.insert::<Movement>(new).await
    }

    pub async fn stock(&self) -> Result<Vec<StockLevel>, OpsError> {
        let movements = self
            .store
            .list::<Movement>(Select::from(Movement::TABLE))
            .await?;
        Ok(stock_levels(&movements))
    }
}
