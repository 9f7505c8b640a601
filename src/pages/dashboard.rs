use super::Pages;
use super::procurement::PENDING_PURCHASE_STATUSES;
use super::status::{CANONICAL, normalize_order_status};
use crate::db::{Row, Select};
use crate::error::OpsError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Card counts for the landing page. Archived rows are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub leads_by_status: BTreeMap<String, usize>,
    /// Keyed by canonical status; legacy values are normalized first.
    pub orders_by_status: BTreeMap<String, usize>,
    pub open_work_orders: usize,
    pub open_rmas: usize,
    pub pending_purchase_orders: usize,
    pub pending_picking: usize,
}

fn count_by_status<'a>(
    rows: &'a [Row],
    normalize: impl Fn(&'a str) -> &'a str,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let status = row.get("status").and_then(|v| v.as_str()).unwrap_or("");
        *counts.entry(normalize(status).to_string()).or_insert(0) += 1;
    }
    counts
}

impl Pages {
    async fn active(&self, select: Select) -> Result<Vec<Row>, OpsError> {
        self.store.select(select.eq("archived", false)).await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, OpsError> {
        let leads = self.active(Select::from("leads")).await?;
        let orders = self.active(Select::from("orders")).await?;
        let work_orders = self
            .active(Select::from("work_orders").neq("status", "done"))
            .await?;
        let rmas = self
            .active(Select::from("rmas").neq("status", "closed"))
            .await?;
        let purchase_orders = self
            .active(Select::from("purchase_orders").in_list("status", PENDING_PURCHASE_STATUSES))
            .await?;
        let picking = self
            .active(Select::from("shipping_orders").eq("picked", false))
            .await?;

        let mut orders_by_status = count_by_status(&orders, normalize_order_status);
        for status in CANONICAL {
            orders_by_status.entry(status.to_string()).or_insert(0);
        }

        Ok(DashboardSummary {
            leads_by_status: count_by_status(&leads, |s| s),
            orders_by_status,
            open_work_orders: work_orders.len(),
            open_rmas: rmas.len(),
            pending_purchase_orders: purchase_orders.len(),
            pending_picking: picking.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(status: &str) -> Row {
        match json!({ "status": status }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn order_counts_use_canonical_statuses() {
        let rows = vec![row("draft"), row("pending"), row("shipped"), row("on_hold")];
        let counts = count_by_status(&rows, normalize_order_status);
        assert_eq!(counts.get("pending"), Some(&2));
        assert_eq!(counts.get("completed"), Some(&1));
        assert_eq!(counts.get("on_hold"), Some(&1));
    }
}
