use super::created;
use crate::error::OpsError;
use crate::pages::{ArchiveOutcome, EmailRequest, ListParams};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opsdesk_schema::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderPatch};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route("/api/purchase-orders/{id}", patch(update_purchase_order))
        .route("/api/purchase-orders/{id}/archive", post(archive_purchase_order))
        .route("/api/purchase-orders/{id}/restore", post(restore_purchase_order))
        .route("/api/purchase-orders/{id}/send", post(send_purchase_order))
}

async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PurchaseOrder>>, OpsError> {
    Ok(Json(state.pages.list_purchase_orders(&params).await?))
}

async fn create_purchase_order(
    State(state): State<AppState>,
    Json(new): Json<NewPurchaseOrder>,
) -> Result<(StatusCode, Json<PurchaseOrder>), OpsError> {
    Ok(created(state.pages.create_purchase_order(&new).await?))
}

async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PurchaseOrderPatch>,
) -> Result<Json<PurchaseOrder>, OpsError> {
    Ok(Json(state.pages.update_purchase_order(&id, &patch).await?))
}

async fn archive_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_purchase_order(&id, true).await?))
}

async fn restore_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_purchase_order(&id, false).await?))
}

/// POST /api/purchase-orders/{id}/send
///
/// Emails the supplier and marks the order `sent` once the email went out.
async fn send_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(email): Json<EmailRequest>,
) -> Result<Json<PurchaseOrder>, OpsError> {
    Ok(Json(state.pages.send_purchase_order(&id, &email).await?))
}
