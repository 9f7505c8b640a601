use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use opsdesk::config::FunctionsConfig;
use opsdesk::error::OpsError;
use opsdesk::functions::{HttpFunctions, RemoteFunctions};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

async fn function_handler(
    State(seen): State<Seen>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((name.clone(), auth, body));
    match name.as_str() {
        "generate-offer-code" => (StatusCode::OK, json!({ "code": "OFF-7" }).to_string()),
        "send-customer-email" => (StatusCode::OK, String::new()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(2048)),
    }
}

async fn spawn_functions_server() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/functions/v1/{name}", post(function_handler))
        .with_state(seen.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/functions/v1"), seen)
}

#[tokio::test]
async fn http_functions_post_json_with_bearer_key() {
    let (base, seen) = spawn_functions_server().await;
    let functions = HttpFunctions::new(&FunctionsConfig {
        base_url: base.parse().unwrap(),
        api_key: Some("service-key".to_string()),
        ..FunctionsConfig::default()
    })
    .unwrap();

    let result = functions
        .invoke("generate-offer-code", json!({ "lead_id": "l1" }))
        .await
        .unwrap();
    assert_eq!(result, json!({ "code": "OFF-7" }));

    // Empty success body decodes as null.
    let result = functions
        .invoke("send-customer-email", json!({ "to": "a@b.it" }))
        .await
        .unwrap();
    assert_eq!(result, Value::Null);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "generate-offer-code");
    assert_eq!(seen[0].1.as_deref(), Some("Bearer service-key"));
    assert_eq!(seen[0].2, json!({ "lead_id": "l1" }));
}

#[tokio::test]
async fn http_functions_surface_failures_without_retry() {
    let (base, seen) = spawn_functions_server().await;
    let functions = HttpFunctions::new(&FunctionsConfig {
        base_url: base.parse().unwrap(),
        ..FunctionsConfig::default()
    })
    .unwrap();

    let err = functions
        .invoke("generate-order-pdf", json!({ "order_id": "o1" }))
        .await
        .unwrap_err();
    match err {
        OpsError::Function {
            name,
            status,
            message,
        } => {
            assert_eq!(name, "generate-order-pdf");
            assert_eq!(status, Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert_eq!(message.len(), 512);
        }
        other => panic!("expected a function error, got {other:?}"),
    }
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(seen.lock().unwrap()[0].1.is_none());

    let err = functions.invoke("../admin", json!({})).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
}
