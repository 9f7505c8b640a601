use super::{MoveCard, created};
use crate::error::OpsError;
use crate::pages::kanban::Lane;
use crate::pages::{ArchiveOutcome, EmailRequest, ListParams, OrderCreated, OrderDetail};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opsdesk_schema::{
    NewOrder, NewServiceOrder, NewShippingOrder, NewWorkOrder, Order, OrderPatch, ServiceOrder,
    ServiceOrderPatch, ShippingOrder, ShippingOrderPatch, WorkOrder, WorkOrderPatch,
};
use serde_json::Value;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/board", get(order_board))
        .route("/api/orders/{id}", get(order_detail).patch(update_order))
        .route("/api/orders/{id}/move", post(move_order))
        .route("/api/orders/{id}/archive", post(archive_order))
        .route("/api/orders/{id}/restore", post(restore_order))
        .route("/api/orders/{id}/pdf", post(generate_order_pdf))
        .route("/api/orders/{id}/confirmation", post(send_order_confirmation))
        .route("/api/orders/{id}/notify", post(notify_order))
        .route(
            "/api/work-orders",
            get(list_work_orders).post(create_work_order),
        )
        .route("/api/work-orders/board", get(work_order_board))
        .route("/api/work-orders/{id}", patch(update_work_order))
        .route("/api/work-orders/{id}/move", post(move_work_order))
        .route("/api/work-orders/{id}/archive", post(archive_work_order))
        .route("/api/work-orders/{id}/restore", post(restore_work_order))
        .route(
            "/api/service-orders",
            get(list_service_orders).post(create_service_order),
        )
        .route("/api/service-orders/{id}", patch(update_service_order))
        .route("/api/service-orders/{id}/archive", post(archive_service_order))
        .route("/api/service-orders/{id}/restore", post(restore_service_order))
        .route(
            "/api/shipping-orders",
            get(list_shipping_orders).post(create_shipping_order),
        )
        .route("/api/shipping-orders/{id}", patch(update_shipping_order))
        .route("/api/shipping-orders/{id}/archive", post(archive_shipping_order))
        .route("/api/shipping-orders/{id}/restore", post(restore_shipping_order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, OpsError> {
    Ok(Json(state.pages.list_orders(&params).await?))
}

async fn order_board(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lane<Order>>>, OpsError> {
    Ok(Json(state.pages.order_board(&params).await?))
}

/// POST /api/orders
///
/// Creates the order and its dependents in one batch; nothing persists on error.
async fn create_order(
    State(state): State<AppState>,
    Json(new): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderCreated>), OpsError> {
    Ok(created(state.pages.create_order(&new).await?))
}

async fn order_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>, OpsError> {
    Ok(Json(state.pages.order_detail(&id).await?))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<Order>, OpsError> {
    Ok(Json(state.pages.update_order(&id, &patch).await?))
}

async fn move_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveCard>,
) -> Result<Json<Order>, OpsError> {
    Ok(Json(state.pages.move_order(&id, &body.to).await?))
}

async fn archive_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_order(&id, true).await?))
}

async fn restore_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_order(&id, false).await?))
}

async fn generate_order_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, OpsError> {
    Ok(Json(state.pages.generate_order_pdf(&id).await?))
}

async fn send_order_confirmation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, OpsError> {
    Ok(Json(state.pages.send_order_confirmation(&id).await?))
}

async fn notify_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(email): Json<EmailRequest>,
) -> Result<Json<Value>, OpsError> {
    Ok(Json(state.pages.notify_order(&id, &email).await?))
}

async fn list_work_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<WorkOrder>>, OpsError> {
    Ok(Json(state.pages.list_work_orders(&params).await?))
}

async fn work_order_board(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lane<WorkOrder>>>, OpsError> {
    Ok(Json(state.pages.work_order_board(&params).await?))
}

async fn create_work_order(
    State(state): State<AppState>,
    Json(new): Json<NewWorkOrder>,
) -> Result<(StatusCode, Json<WorkOrder>), OpsError> {
    Ok(created(state.pages.create_work_order(&new).await?))
}

async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<WorkOrderPatch>,
) -> Result<Json<WorkOrder>, OpsError> {
    Ok(Json(state.pages.update_work_order(&id, &patch).await?))
}

async fn move_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveCard>,
) -> Result<Json<WorkOrder>, OpsError> {
    Ok(Json(state.pages.move_work_order(&id, &body.to).await?))
}

async fn archive_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_work_order(&id, true).await?))
}

async fn restore_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_work_order(&id, false).await?))
}

async fn list_service_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ServiceOrder>>, OpsError> {
    Ok(Json(state.pages.list_service_orders(&params).await?))
}

async fn create_service_order(
    State(state): State<AppState>,
    Json(new): Json<NewServiceOrder>,
) -> Result<(StatusCode, Json<ServiceOrder>), OpsError> {
    Ok(created(state.pages.create_service_order(&new).await?))
}

async fn update_service_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ServiceOrderPatch>,
) -> Result<Json<ServiceOrder>, OpsError> {
    Ok(Json(state.pages.update_service_order(&id, &patch).await?))
}

async fn archive_service_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_service_order(&id, true).await?))
}

async fn restore_service_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_service_order(&id, false).await?))
}

async fn list_shipping_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ShippingOrder>>, OpsError> {
    Ok(Json(state.pages.list_shipping_orders(&params).await?))
}

async fn create_shipping_order(
    State(state): State<AppState>,
    Json(new): Json<NewShippingOrder>,
) -> Result<(StatusCode, Json<ShippingOrder>), OpsError> {
    Ok(created(state.pages.create_shipping_order(&new).await?))
}

async fn update_shipping_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ShippingOrderPatch>,
) -> Result<Json<ShippingOrder>, OpsError> {
    Ok(Json(state.pages.update_shipping_order(&id, &patch).await?))
}

async fn archive_shipping_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_shipping_order(&id, true).await?))
}

async fn restore_shipping_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_shipping_order(&id, false).await?))
}
