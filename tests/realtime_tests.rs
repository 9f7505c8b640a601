mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{Harness, RecordingFunctions};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use opsdesk::db::{Row, Write};
use opsdesk::pages::{ListParams, ListView, NewLeadWithCustomer};
use opsdesk::realtime::{ChangeEvent, ChangeKind};
use opsdesk_schema::{
    Customer, CustomerPatch, Lead, LeadPatch, NewCustomer, NewLead, NewPartner, Order,
    PartnerKind,
};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt;

fn new_customer(name: &str) -> NewCustomer {
    NewCustomer {
        company_name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn subscription_receives_only_while_started() {
    let h = Harness::new("rt-subscription", RecordingFunctions::new()).await;
    let mut sub = h.feed.subscribe("customers", 16);
    assert!(!sub.is_running());

    // Not started: nothing is queued.
    h.pages.create_customer(&new_customer("Before")).await.unwrap();
    assert!(sub.try_recv().is_none());

    sub.start();
    sub.start();
    assert!(sub.is_running());

    // Events for other tables are filtered out.
    h.pages
        .create_partner(&NewPartner {
            kind: PartnerKind::Reseller,
            company_name: "Reseller Srl".to_string(),
            contact_name: None,
            email: None,
            phone: None,
            country: None,
        })
        .await
        .unwrap();
    let created = h.pages.create_customer(&new_customer("During")).await.unwrap();

    let event = timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("event in time")
        .expect("subscription open");
    assert_eq!(event.table, "customers");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.row_id(), Some(created.id.as_str()));

    h.pages
        .update_customer(
            &created.id,
            &CustomerPatch {
                city: Some("Salerno".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let event = timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("event in time")
        .expect("subscription open");
    assert_eq!(event.kind, ChangeKind::Update);
    assert_eq!(event.row["city"], "Salerno");

    sub.stop();
    assert!(!sub.is_running());
    h.pages.create_customer(&new_customer("After")).await.unwrap();
    assert!(sub.recv().await.is_none());
    assert_eq!(sub.lagged(), 0);
}

#[tokio::test]
async fn list_view_merges_optimistic_insert_and_push_once() {
    let h = Harness::new("rt-listview", RecordingFunctions::new()).await;
    h.pages.create_customer(&new_customer("Existing")).await.unwrap();

    let mut view: ListView<Customer> = ListView::new(ListParams::default());
    view.reload(h.store(), "created_at").await.unwrap();
    assert_eq!(view.len(), 1);

    let mut events = h.feed.receiver();
    let created = h.pages.create_customer(&new_customer("Fresh")).await.unwrap();

    // Local insert first, then the pushed event for the same row.
    view.upsert(created.clone());
    let event: ChangeEvent = events.recv().await.unwrap();
    assert!(view.apply(&event).unwrap());
    assert_eq!(view.len(), 2);
    assert_eq!(view.get(&created.id), Some(&created));

    // Archiving pushes an update that no longer matches the active filter.
    h.pages.archive_customer(&created.id, true).await.unwrap();
    let event = events.recv().await.unwrap();
    assert!(view.apply(&event).unwrap());
    assert_eq!(view.len(), 1);
    assert!(view.get(&created.id).is_none());

    // Search stays local.
    let mut search = ListView::<Customer>::new(ListParams {
        search: Some("exist".to_string()),
        ..Default::default()
    });
    search.reload(h.store(), "created_at").await.unwrap();
    assert_eq!(search.visible().len(), 1);
}

#[tokio::test]
async fn list_view_searches_embedded_customer_like_the_list_page() {
    let h = Harness::new("rt-listview-embed", RecordingFunctions::new()).await;
    let created = h
        .pages
        .create_lead(NewLeadWithCustomer {
            customer: Some(new_customer("Forno Rossi")),
            lead: NewLead {
                title: "Oven 100".to_string(),
                ..Default::default()
            },
        })
        .await
        .unwrap();

    let params = ListParams {
        search: Some("forno".to_string()),
        ..Default::default()
    };
    assert_eq!(h.pages.list_leads(&params).await.unwrap().len(), 1);

    let mut view = ListView::<Lead>::new(params);
    view.reload(h.store(), "created_at").await.unwrap();
    assert_eq!(view.visible().len(), 1);

    // The pushed update carries no embed; the known customer is kept.
    let mut events = h.feed.receiver();
    h.pages
        .update_lead(
            &created.lead.id,
            &LeadPatch {
                notes: Some("called back".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let event = events.recv().await.unwrap();
    assert!(view.apply(&event).unwrap());
    let visible = view.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].notes.as_deref(), Some("called back"));
    assert_eq!(
        visible[0].customer.as_ref().map(|c| c.company_name.as_str()),
        Some("Forno Rossi")
    );
}

#[tokio::test]
async fn order_list_view_filters_on_normalized_status() {
    let h = Harness::new("rt-listview-orders", RecordingFunctions::new()).await;
    let customer = h.pages.create_customer(&new_customer("Caffe Nero")).await.unwrap();

    let params = ListParams {
        status: Some("in_progress".to_string()),
        ..Default::default()
    };
    let mut view = ListView::<Order>::new(params.clone());
    view.reload(h.store(), "created_at").await.unwrap();
    assert!(view.is_empty());

    let mut events = h.feed.receiver();
    let mut legacy = Row::new();
    legacy.insert("customer_id".to_string(), json!(customer.id));
    legacy.insert("order_type".to_string(), json!("production"));
    legacy.insert("status".to_string(), json!("processing"));
    h.store().write(Write::insert("orders", legacy)).await.unwrap();

    let event = events.recv().await.unwrap();
    assert!(view.apply(&event).unwrap());
    assert_eq!(view.len(), 1);
    assert_eq!(h.pages.list_orders(&params).await.unwrap().len(), 1);

    let mut reloaded = ListView::<Order>::new(params);
    reloaded.reload(h.store(), "created_at").await.unwrap();
    assert_eq!(reloaded.len(), 1);
}

#[tokio::test]
async fn realtime_route_streams_change_events() {
    let h = Harness::new("rt-sse", RecordingFunctions::new()).await;
    let app = h.app();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/realtime/invoices")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/realtime/customers")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let created = h.pages.create_customer(&new_customer("Streamed")).await.unwrap();

    let mut stream = Box::pin(resp.into_body().into_data_stream().eventsource());
    let event = timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("event in time")
        .expect("stream open")
        .expect("valid event");
    assert_eq!(event.event, "insert");
    let change: ChangeEvent = serde_json::from_str(&event.data).unwrap();
    assert_eq!(change.table, "customers");
    assert_eq!(change.row_id(), Some(created.id.as_str()));
}
