use super::created;
use crate::error::OpsError;
use crate::pages::{ArchiveOutcome, ListParams, PickingCompleted, StockLevel};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opsdesk_schema::{
    Movement, NewMovement, NewRma, NewSerial, Rma, RmaPatch, Serial, SerialPatch, ShippingOrder,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/serials", get(list_serials).post(register_serial))
        .route("/api/serials/lookup/{serial_number}", get(find_serial))
        .route("/api/serials/{id}", patch(update_serial))
        .route("/api/serials/{id}/archive", post(archive_serial))
        .route("/api/serials/{id}/restore", post(restore_serial))
        .route("/api/rmas", get(list_rmas).post(open_rma))
        .route("/api/rmas/{id}", get(rma_detail).patch(update_rma))
        .route("/api/rmas/{id}/archive", post(archive_rma))
        .route("/api/rmas/{id}/restore", post(restore_rma))
        .route("/api/movements", get(list_movements).post(record_movement))
        .route("/api/stock", get(stock))
        .route("/api/picking", get(pending_picking))
        .route("/api/picking/{id}/complete", post(complete_picking))
}

async fn list_serials(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Serial>>, OpsError> {
    Ok(Json(state.pages.list_serials(&params).await?))
}

async fn register_serial(
    State(state): State<AppState>,
    Json(new): Json<NewSerial>,
) -> Result<(StatusCode, Json<Serial>), OpsError> {
    Ok(created(state.pages.register_serial(&new).await?))
}

async fn find_serial(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
) -> Result<Json<Serial>, OpsError> {
    Ok(Json(state.pages.find_serial(&serial_number).await?))
}

async fn update_serial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<SerialPatch>,
) -> Result<Json<Serial>, OpsError> {
    Ok(Json(state.pages.update_serial(&id, &patch).await?))
}

async fn archive_serial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_serial(&id, true).await?))
}

async fn restore_serial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_serial(&id, false).await?))
}

async fn list_rmas(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Rma>>, OpsError> {
    Ok(Json(state.pages.list_rmas(&params).await?))
}

async fn open_rma(
    State(state): State<AppState>,
    Json(new): Json<NewRma>,
) -> Result<(StatusCode, Json<Rma>), OpsError> {
    Ok(created(state.pages.open_rma(&new).await?))
}

async fn rma_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Rma>, OpsError> {
    Ok(Json(state.pages.rma_detail(&id).await?))
}

async fn update_rma(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<RmaPatch>,
) -> Result<Json<Rma>, OpsError> {
    Ok(Json(state.pages.update_rma(&id, &patch).await?))
}

async fn archive_rma(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_rma(&id, true).await?))
}

async fn restore_rma(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_rma(&id, false).await?))
}

async fn list_movements(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Movement>>, OpsError> {
    Ok(Json(state.pages.list_movements(&params).await?))
}

async fn record_movement(
    State(state): State<AppState>,
    Json(new): Json<NewMovement>,
) -> Result<(StatusCode, Json<Movement>), OpsError> {
    Ok(created(state.pages.record_movement(&new).await?))
}

async fn stock(State(state): State<AppState>) -> Result<Json<Vec<StockLevel>>, OpsError> {
    Ok(Json(state.pages.stock().await?))
}

async fn pending_picking(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShippingOrder>>, OpsError> {
    Ok(Json(state.pages.pending_picking().await?))
}

async fn complete_picking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PickingCompleted>, OpsError> {
    Ok(Json(state.pages.complete_picking(&id).await?))
}
