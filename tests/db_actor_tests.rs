mod common;

use common::temp_database_url;
use opsdesk::db::{DataAccess, Filter, Row, Select, Write};
use opsdesk::error::OpsError;
use opsdesk::realtime::{ChangeFeed, ChangeKind};
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn test_db_actor_insert_select_and_codes() {
    let feed = ChangeFeed::new(64);
    let db = opsdesk::db::spawn(&temp_database_url("db-baseline"), feed.clone())
        .await
        .unwrap();
    let mut events = feed.receiver();

    // 1. Fresh DB has no customers.
    let customers = db.select(Select::from("customers")).await.unwrap();
    assert!(customers.is_empty(), "Expected no customers initially");

    // 2. Inserts fill id, timestamps and the customer code sequence.
    let first = db
        .write(Write::insert(
            "customers",
            row(json!({ "company_name": "Pizzeria Napoli", "email": "info@napoli.it" })),
        ))
        .await
        .unwrap();
    let first = first.first().unwrap();
    assert_eq!(first["customer_code"], json!("CUS-00001"));
    assert_eq!(first["archived"], json!(false));
    assert!(first["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(first["created_at"].is_string());

    let second = db
        .write(Write::insert(
            "customers",
            row(json!({ "company_name": "Forno Roma" })),
        ))
        .await
        .unwrap();
    assert_eq!(second[0]["customer_code"], json!("CUS-00002"));

    // 3. One insert event per row, published after the write.
    let event = events.try_recv().unwrap();
    assert_eq!(event.table, "customers");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.row["company_name"], json!("Pizzeria Napoli"));
    assert!(events.try_recv().is_ok());

    // 4. Filters and ordering.
    let rows = db
        .select(
            Select::from("customers")
                .like("company_name", "%Roma%")
                .order_by("company_name", false),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["company_name"], json!("Forno Roma"));

    // 5. Shallow embed across the customer foreign key.
    let customer_id = first["id"].as_str().unwrap().to_string();
    db.write(Write::insert(
        "leads",
        row(json!({ "title": "Oven for Napoli", "customer_id": customer_id })),
    ))
    .await
    .unwrap();
    db.write(Write::insert("leads", row(json!({ "title": "Walk-in" }))))
        .await
        .unwrap();

    let leads = db
        .select(
            Select::from("leads")
                .embed("customer")
                .order_by("title", false),
        )
        .await
        .unwrap();
    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0]["status"], json!("new"));
    assert_eq!(leads[0]["customer"]["company_name"], json!("Pizzeria Napoli"));
    assert_eq!(leads[1]["customer"], Value::Null);

    // 6. Unknown relation, table and column are rejected.
    let err = db
        .select(Select::from("leads").embed("owner"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::UnknownRelation { .. }));
    let err = db.select(Select::from("invoices")).await.unwrap_err();
    assert!(matches!(err, OpsError::UnknownTable(_)));
    let err = db
        .select(Select::from("leads").eq("colour", "red"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::UnknownColumn { .. }));

    db.stop();
}

#[tokio::test]
async fn test_db_actor_upsert_returns_existing_row() {
    let feed = ChangeFeed::new(64);
    let db = opsdesk::db::spawn(&temp_database_url("db-upsert"), feed.clone())
        .await
        .unwrap();

    let created = db
        .write(Write::upsert(
            "customers",
            row(json!({ "company_name": "Pizzeria Napoli", "email": "info@napoli.it" })),
            &["email"],
        ))
        .await
        .unwrap();

    let mut events = feed.receiver();
    let again = db
        .write(Write::upsert(
            "customers",
            row(json!({ "company_name": "Different Name", "email": "info@napoli.it" })),
            &["email"],
        ))
        .await
        .unwrap();

    assert_eq!(again.len(), 1);
    assert_eq!(again[0]["id"], created[0]["id"]);
    assert_eq!(again[0]["company_name"], json!("Pizzeria Napoli"));
    assert!(events.try_recv().is_err(), "No event expected for a matched upsert");

    // Non-unique conflict targets are refused.
    let err = db
        .write(Write::upsert(
            "customers",
            row(json!({ "company_name": "X", "city": "Napoli" })),
            &["city"],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    db.stop();
}

#[tokio::test]
async fn test_db_actor_update_and_delete_guards() {
    let feed = ChangeFeed::new(64);
    let db = opsdesk::db::spawn(&temp_database_url("db-guards"), feed)
        .await
        .unwrap();

    let created = db
        .write(Write::insert(
            "partners",
            row(json!({ "kind": "importer", "company_name": "Alpen AG" })),
        ))
        .await
        .unwrap();
    let id = created[0]["id"].as_str().unwrap().to_string();

    // Patch without filters is refused.
    let err = db
        .write(Write::update_where("partners", vec![], row(json!({ "country": "AT" }))))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    // Immutable columns are refused.
    let err = db
        .write(Write::update_by_id("partners", &id, row(json!({ "id": "other" }))))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    // Patch touches updated_at only.
    let patched = db
        .write(Write::update_by_id("partners", &id, row(json!({ "country": "AT" }))))
        .await
        .unwrap();
    assert_eq!(patched[0]["country"], json!("AT"));
    assert_eq!(patched[0]["created_at"], created[0]["created_at"]);

    // Unknown id matches nothing.
    let none = db
        .write(Write::update_by_id("partners", "missing", row(json!({ "country": "DE" }))))
        .await
        .unwrap();
    assert!(none.is_empty());

    let deleted = db.write(Write::delete_by_id("partners", &id)).await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert!(db.select(Select::from("partners")).await.unwrap().is_empty());

    db.stop();
}

#[tokio::test]
async fn test_db_actor_batch_is_all_or_nothing() {
    let feed = ChangeFeed::new(64);
    let db = opsdesk::db::spawn(&temp_database_url("db-batch"), feed.clone())
        .await
        .unwrap();
    let mut events = feed.receiver();

    // Second insert violates the unique email, so the first must not persist.
    let err = DataAccess::batch(
        &db,
        vec![
            Write::insert(
                "customers",
                row(json!({ "company_name": "First", "email": "dup@example.com" })),
            ),
            Write::insert(
                "customers",
                row(json!({ "company_name": "Second", "email": "dup@example.com" })),
            ),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OpsError::DatabaseError(_)));
    assert!(db.select(Select::from("customers")).await.unwrap().is_empty());
    assert!(events.try_recv().is_err(), "Rolled back batch must not publish");

    // A good batch commits every write and publishes afterwards.
    let results = DataAccess::batch(
        &db,
        vec![
            Write::insert("customers", row(json!({ "company_name": "First" }))),
            Write::insert("customers", row(json!({ "company_name": "Second" }))),
        ],
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1][0]["customer_code"], json!("CUS-00002"));
    assert_eq!(db.select(Select::from("customers")).await.unwrap().len(), 2);
    assert_eq!(events.try_recv().unwrap().row["company_name"], json!("First"));
    assert_eq!(events.try_recv().unwrap().row["company_name"], json!("Second"));

    db.stop();
}

#[tokio::test]
async fn test_db_actor_guarded_update_rolls_back_batch() {
    let feed = ChangeFeed::new(64);
    let db = opsdesk::db::spawn(&temp_database_url("db-guard"), feed.clone())
        .await
        .unwrap();

    let created = db
        .write(Write::insert(
            "content_items",
            row(json!({ "title": "Spring menu", "published": true })),
        ))
        .await
        .unwrap();
    let id = created[0]["id"].as_str().unwrap().to_string();
    let mut events = feed.receiver();

    // The guard no longer holds, so the insert queued behind it must not land.
    let guarded = Write::update_where(
        "content_items",
        vec![Filter::eq("id", id.as_str()), Filter::eq("published", false)],
        row(json!({ "status": "review" })),
    )
    .must_match();
    let err = DataAccess::batch(
        &db,
        vec![
            guarded,
            Write::insert("content_items", row(json!({ "title": "Follow-up" }))),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
    assert_eq!(db.select(Select::from("content_items")).await.unwrap().len(), 1);
    assert!(events.try_recv().is_err());

    // Without the guard the same miss is just an empty result.
    let unguarded = Write::update_where(
        "content_items",
        vec![Filter::eq("id", id.as_str()), Filter::eq("published", false)],
        row(json!({ "status": "review" })),
    );
    assert!(db.write(unguarded).await.unwrap().is_empty());

    db.stop();
}
