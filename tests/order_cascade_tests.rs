mod common;

use chrono::NaiveDate;
use common::{Harness, RecordingFunctions};
use opsdesk::db::{Row, Write};
use opsdesk::error::OpsError;
use opsdesk::functions::{GENERATE_ORDER_PDF, SEND_CUSTOMER_EMAIL};
use opsdesk::pages::ListParams;
use opsdesk_schema::{Customer, NewCustomer, NewOrder, OrderType};
use serde_json::{Value, json};

async fn customer(h: &Harness) -> Customer {
    h.pages
        .create_customer(&NewCustomer {
            company_name: "Trattoria Bella".to_string(),
            contact_name: Some("Giulia".to_string()),
            email: Some("giulia@bella.it".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
}

fn order(customer_id: &str, order_type: OrderType) -> NewOrder {
    NewOrder {
        customer_id: Some(customer_id.to_string()),
        order_type: Some(order_type),
        product: Some("Vesuviano 120".to_string()),
        quantity: Some(1),
        total_amount: Some(18_500.0),
        scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 3),
        ship_to: Some("Via Roma 1, Napoli".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn installation_order_creates_work_and_service_order() {
    let h = Harness::new("order-install", RecordingFunctions::new()).await;
    let c = customer(&h).await;

    let created = h
        .pages
        .create_order(&order(&c.id, OrderType::ProductionInstallation))
        .await
        .unwrap();

    assert_eq!(created.order.order_number.as_deref(), Some("ORD-00001"));
    assert_eq!(created.order.status, "pending");
    let wo = created.work_order.expect("work order");
    let so = created.service_order.expect("service order");
    assert!(created.shipping_order.is_none());

    assert_eq!(wo.order_id, created.order.id);
    assert_eq!(wo.status, "queued");
    assert_eq!(wo.product.as_deref(), Some("Vesuviano 120"));
    assert_eq!(so.order_id, created.order.id);
    assert_eq!(so.work_order_id.as_deref(), Some(wo.id.as_str()));
    assert_eq!(so.customer_id.as_deref(), Some(c.id.as_str()));
    assert_eq!(so.service_type, "installation");
    assert_eq!(so.scheduled_date, NaiveDate::from_ymd_opt(2026, 11, 3));

    // One batch, no single writes.
    assert_eq!(h.access.batches(), 1);

    let detail = h.pages.order_detail(&created.order.id).await.unwrap();
    assert_eq!(detail.work_orders.len(), 1);
    assert_eq!(detail.service_orders.len(), 1);
    assert!(detail.shipping_orders.is_empty());
    assert_eq!(detail.order.customer.as_ref().map(|c| c.id.as_str()), Some(c.id.as_str()));
}

#[tokio::test]
async fn shipping_order_types_create_shipping_orders() {
    let h = Harness::new("order-shipping", RecordingFunctions::new()).await;
    let c = customer(&h).await;

    let created = h
        .pages
        .create_order(&order(&c.id, OrderType::Shipping))
        .await
        .unwrap();
    assert!(created.work_order.is_none());
    assert!(created.service_order.is_none());
    let sho = created.shipping_order.expect("shipping order");
    assert_eq!(sho.article.as_deref(), Some("Vesuviano 120"));
    assert_eq!(sho.ship_to.as_deref(), Some("Via Roma 1, Napoli"));
    assert!(!sho.picked);

    let created = h
        .pages
        .create_order(&order(&c.id, OrderType::ProductionShipping))
        .await
        .unwrap();
    assert!(created.work_order.is_some());
    assert!(created.shipping_order.is_some());
    assert_eq!(created.order.order_number.as_deref(), Some("ORD-00002"));
}

#[tokio::test]
async fn invalid_orders_write_nothing() {
    let h = Harness::new("order-invalid", RecordingFunctions::new()).await;
    let c = customer(&h).await;
    let writes = h.access.writes();

    let mut missing_type = order(&c.id, OrderType::Production);
    missing_type.order_type = None;
    let err = h.pages.create_order(&missing_type).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let mut zero = order(&c.id, OrderType::Production);
    zero.quantity = Some(0);
    let err = h.pages.create_order(&zero).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = h
        .pages
        .create_order(&order("missing", OrderType::Production))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::NotFound { .. }));

    assert_eq!(h.access.writes(), writes);
    assert_eq!(h.access.batches(), 0);
    assert!(h.pages.list_orders(&ListParams::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn archiving_an_order_cascades_to_dependents() {
    let h = Harness::new("order-archive", RecordingFunctions::new()).await;
    let c = customer(&h).await;
    let created = h
        .pages
        .create_order(&order(&c.id, OrderType::ProductionInstallation))
        .await
        .unwrap();
    let other = h
        .pages
        .create_order(&order(&c.id, OrderType::Production))
        .await
        .unwrap();

    let outcome = h.pages.archive_order(&created.order.id, true).await.unwrap();
    let counts: Vec<(&str, usize)> = outcome.cascaded.iter().map(|c| (c.table, c.rows)).collect();
    assert_eq!(
        counts,
        vec![("work_orders", 1), ("service_orders", 1), ("shipping_orders", 0)]
    );

    let detail = h.pages.order_detail(&created.order.id).await.unwrap();
    assert!(detail.order.archived);
    assert!(detail.work_orders.iter().all(|w| w.archived));
    assert!(detail.service_orders.iter().all(|s| s.archived));

    // The other order's work order is untouched.
    let untouched = h.pages.work_orders_for_order(&other.order.id).await.unwrap();
    assert!(untouched.iter().all(|w| !w.archived));

    let active = h.pages.list_work_orders(&ListParams::default()).await.unwrap();
    assert_eq!(active.len(), 1);

    h.pages.archive_order(&created.order.id, false).await.unwrap();
    let active = h.pages.list_work_orders(&ListParams::default()).await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn order_board_uses_normalized_status() {
    let h = Harness::new("order-board", RecordingFunctions::new()).await;
    let c = customer(&h).await;

    let mut legacy = Row::new();
    legacy.insert("customer_id".to_string(), json!(c.id));
    legacy.insert("order_type".to_string(), json!("production"));
    legacy.insert("status".to_string(), json!("shipped"));
    let legacy = h.store().write(Write::insert("orders", legacy)).await.unwrap();
    let legacy_id = legacy[0]["id"].as_str().unwrap().to_string();

    let fresh = h
        .pages
        .create_order(&order(&c.id, OrderType::Production))
        .await
        .unwrap();

    let lanes = h.pages.order_board(&ListParams::default()).await.unwrap();
    let ids = |column: &str| -> Vec<String> {
        lanes
            .iter()
            .find(|l| l.column.id == column)
            .map(|l| l.cards.iter().map(|o| o.id.clone()).collect())
            .unwrap_or_default()
    };
    assert_eq!(ids("completed"), vec![legacy_id.clone()]);
    assert_eq!(ids("pending"), vec![fresh.order.id.clone()]);

    let completed = ListParams {
        status: Some("completed".to_string()),
        ..Default::default()
    };
    let listed = h.pages.list_orders(&completed).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "shipped");

    // "shipped" already sits in the completed column: no write.
    let writes = h.access.writes();
    let same = h.pages.move_order(&legacy_id, "completed").await.unwrap();
    assert_eq!(same.status, "shipped");
    assert_eq!(h.access.writes(), writes);

    let moved = h.pages.move_order(&fresh.order.id, "completed").await.unwrap();
    assert_eq!(moved.status, "completed");
    assert!(moved.completed_at.is_some());
    assert_eq!(h.access.writes(), writes + 1);

    let reopened = h.pages.move_order(&fresh.order.id, "in_progress").await.unwrap();
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn order_documents_go_through_remote_functions() {
    let h = Harness::new(
        "order-docs",
        RecordingFunctions::new().respond(
            GENERATE_ORDER_PDF,
            json!({ "url": "https://files.example.com/ORD-00001.pdf" }),
        ),
    )
    .await;
    let c = customer(&h).await;
    let created = h
        .pages
        .create_order(&order(&c.id, OrderType::Production))
        .await
        .unwrap();

    let pdf = h.pages.generate_order_pdf(&created.order.id).await.unwrap();
    assert_eq!(pdf["url"], json!("https://files.example.com/ORD-00001.pdf"));

    h.pages.send_order_confirmation(&created.order.id).await.unwrap();
    let calls = h.functions.calls();
    let (_, body) = calls
        .iter()
        .find(|(name, _)| name == SEND_CUSTOMER_EMAIL)
        .expect("confirmation sent");
    assert_eq!(body["to"], json!("giulia@bella.it"));
    assert_eq!(body["subject"], Value::String("Order ORD-00001 confirmed".to_string()));
}
