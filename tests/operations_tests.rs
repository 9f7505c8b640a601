mod common;

use common::{Harness, RecordingFunctions};
use opsdesk::error::OpsError;
use opsdesk::functions::SEND_PARTNER_EMAIL;
use opsdesk::pages::{EmailRequest, ListParams};
use opsdesk_schema::{
    MovementDirection, NewContentItem, NewCustomer, NewMovement, NewOrder, NewPartner,
    NewPurchaseOrder, NewRma, NewSerial, OrderType, PartnerKind,
};
use serde_json::json;

#[tokio::test]
async fn rma_marks_serial_returned_and_inherits_customer() {
    let h = Harness::new("ops-rma", RecordingFunctions::new()).await;
    let customer = h
        .pages
        .create_customer(&NewCustomer {
            company_name: "Pizzeria Sole".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let serial = h
        .pages
        .register_serial(&NewSerial {
            serial_number: "  VES-120-0007 ".to_string(),
            product: Some("Vesuviano 120".to_string()),
            customer_id: Some(customer.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(serial.serial_number, "VES-120-0007");
    assert_eq!(serial.status, "in_stock");

    let found = h.pages.find_serial("VES-120-0007").await.unwrap();
    assert_eq!(found.id, serial.id);
    let err = h.pages.find_serial("NOPE").await.unwrap_err();
    assert!(matches!(err, OpsError::NotFound { .. }));

    // Duplicate serial numbers are refused by the store.
    let err = h
        .pages
        .register_serial(&NewSerial {
            serial_number: "VES-120-0007".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::DatabaseError(_)));

    let rma = h
        .pages
        .open_rma(&NewRma {
            serial_id: Some(serial.id.clone()),
            customer_id: None,
            reason: "Door hinge cracked".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(rma.rma_number.as_deref(), Some("RMA-00001"));
    assert_eq!(rma.status, "open");
    assert_eq!(rma.customer_id.as_deref(), Some(customer.id.as_str()));

    let serial = h.pages.find_serial("VES-120-0007").await.unwrap();
    assert_eq!(serial.status, "returned");

    let detail = h.pages.rma_detail(&rma.id).await.unwrap();
    assert_eq!(detail.serial.map(|s| s.id), Some(serial.id.clone()));

    let err = h
        .pages
        .open_rma(&NewRma {
            serial_id: None,
            customer_id: None,
            reason: " ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
}

#[tokio::test]
async fn picking_books_outbound_movement_and_updates_stock() {
    let h = Harness::new("ops-picking", RecordingFunctions::new()).await;
    let customer = h
        .pages
        .create_customer(&NewCustomer {
            company_name: "Gelateria Blu".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    h.pages
        .record_movement(&NewMovement {
            article: "Refractory stone".to_string(),
            quantity: 10,
            direction: MovementDirection::Inbound,
            shipping_order_id: None,
            note: Some("delivery".to_string()),
        })
        .await
        .unwrap();

    let created = h
        .pages
        .create_order(&NewOrder {
            customer_id: Some(customer.id.clone()),
            order_type: Some(OrderType::Shipping),
            product: Some("Refractory stone".to_string()),
            quantity: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    let shipping = created.shipping_order.expect("shipping order");

    let pending = h.pages.pending_picking().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, shipping.id);

    let done = h.pages.complete_picking(&shipping.id).await.unwrap();
    assert!(done.shipping_order.picked);
    assert_eq!(done.shipping_order.status, "ready");
    let movement = done.movement.expect("outbound movement");
    assert_eq!(movement.direction, MovementDirection::Outbound);
    assert_eq!(movement.quantity, 3);
    assert_eq!(movement.shipping_order_id.as_deref(), Some(shipping.id.as_str()));

    assert!(h.pages.pending_picking().await.unwrap().is_empty());
    let err = h.pages.complete_picking(&shipping.id).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let stock = h.pages.stock().await.unwrap();
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].article, "Refractory stone");
    assert_eq!((stock[0].inbound, stock[0].outbound, stock[0].on_hand), (10, 3, 7));

    let err = h
        .pages
        .record_movement(&NewMovement {
            article: "Refractory stone".to_string(),
            quantity: 0,
            direction: MovementDirection::Outbound,
            shipping_order_id: None,
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
}

#[tokio::test]
async fn concurrent_picking_books_one_movement() {
    let h = Harness::new("ops-picking-race", RecordingFunctions::new()).await;
    let customer = h
        .pages
        .create_customer(&NewCustomer {
            company_name: "Trattoria Verde".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let created = h
        .pages
        .create_order(&NewOrder {
            customer_id: Some(customer.id.clone()),
            order_type: Some(OrderType::Shipping),
            product: Some("Oven door".to_string()),
            quantity: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    let shipping = created.shipping_order.expect("shipping order");

    let (a, b) = tokio::join!(
        h.pages.complete_picking(&shipping.id),
        h.pages.complete_picking(&shipping.id)
    );
    assert_eq!(
        u8::from(a.is_ok()) + u8::from(b.is_ok()),
        1,
        "exactly one completion wins: {a:?} / {b:?}"
    );
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(OpsError::Validation(_))));

    let movements = h.pages.list_movements(&ListParams::default()).await.unwrap();
    assert_eq!(movements.len(), 1);
    let stock = h.pages.stock().await.unwrap();
    assert_eq!(stock[0].outbound, 3);
}

#[tokio::test]
async fn purchase_order_is_sent_only_after_email_succeeds() {
    let h = Harness::new("ops-po", RecordingFunctions::new()).await;
    let partner = h
        .pages
        .create_partner(&NewPartner {
            kind: PartnerKind::Importer,
            company_name: "Stone Supply GmbH".to_string(),
            contact_name: None,
            email: Some("sales@stone.de".to_string()),
            phone: None,
            country: Some("DE".to_string()),
        })
        .await
        .unwrap();

    let po = h
        .pages
        .create_purchase_order(&NewPurchaseOrder {
            partner_id: Some(partner.id.clone()),
            supplier_name: partner.company_name.clone(),
            supplier_email: partner.email.clone(),
            total_amount: Some(1_200.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(po.po_number.as_deref(), Some("PO-00001"));
    assert_eq!(po.status, "draft");

    let email = EmailRequest {
        subject: "PO-00001".to_string(),
        message: "Please confirm delivery date.".to_string(),
    };
    let sent = h.pages.send_purchase_order(&po.id, &email).await.unwrap();
    assert_eq!(sent.status, "sent");
    let calls = h.functions.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, SEND_PARTNER_EMAIL);
    assert_eq!(calls[0].1["to"], json!("sales@stone.de"));

    let err = h
        .pages
        .create_purchase_order(&NewPurchaseOrder {
            partner_id: Some("missing".to_string()),
            supplier_name: "Ghost".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::NotFound { .. }));

    let importers = h
        .pages
        .list_partners(Some(PartnerKind::Importer), &ListParams::default())
        .await
        .unwrap();
    assert_eq!(importers.len(), 1);
    let resellers = h
        .pages
        .list_partners(Some(PartnerKind::Reseller), &ListParams::default())
        .await
        .unwrap();
    assert!(resellers.is_empty());
}

#[tokio::test]
async fn failed_email_leaves_purchase_order_in_draft() {
    let h = Harness::new(
        "ops-po-fail",
        RecordingFunctions::new().fail(SEND_PARTNER_EMAIL),
    )
    .await;
    let po = h
        .pages
        .create_purchase_order(&NewPurchaseOrder {
            supplier_name: "Flour Mill".to_string(),
            supplier_email: Some("orders@mill.it".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let email = EmailRequest {
        subject: "Order".to_string(),
        message: "Ten sacks".to_string(),
    };
    let err = h.pages.send_purchase_order(&po.id, &email).await.unwrap_err();
    assert!(matches!(err, OpsError::Function { .. }));

    let pos = h
        .pages
        .list_purchase_orders(&ListParams::default())
        .await
        .unwrap();
    assert_eq!(pos[0].status, "draft");
}

#[tokio::test]
async fn content_board_and_dashboard_counts() {
    let h = Harness::new("ops-content", RecordingFunctions::new()).await;

    let item = h
        .pages
        .create_content(&NewContentItem {
            title: "Autumn newsletter".to_string(),
            channel: Some("newsletter".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(item.status, "idea");
    assert!(!item.published);

    let published = h.pages.move_content(&item.id, "published").await.unwrap();
    assert!(published.published);
    assert!(published.published_at.is_some());

    let lanes = h.pages.content_board(&ListParams::default()).await.unwrap();
    let column = lanes.iter().find(|l| l.column.id == "published").unwrap();
    assert_eq!(column.cards.len(), 1);

    let customer = h
        .pages
        .create_customer(&NewCustomer {
            company_name: "Osteria".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    h.pages
        .create_order(&NewOrder {
            customer_id: Some(customer.id.clone()),
            order_type: Some(OrderType::ProductionShipping),
            product: Some("Vesuviano 100".to_string()),
            quantity: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();

    let summary = h.pages.dashboard().await.unwrap();
    assert_eq!(summary.orders_by_status.get("pending"), Some(&1));
    assert_eq!(summary.orders_by_status.get("in_progress"), Some(&0));
    assert_eq!(summary.orders_by_status.get("completed"), Some(&0));
    assert_eq!(summary.open_work_orders, 1);
    assert_eq!(summary.pending_picking, 1);
    assert_eq!(summary.open_rmas, 0);
    assert_eq!(summary.pending_purchase_orders, 0);
    assert!(summary.leads_by_status.is_empty());
}
