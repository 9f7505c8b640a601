use super::{MoveCard, created};
use crate::error::OpsError;
use crate::pages::kanban::Lane;
use crate::pages::{ArchiveOutcome, ListParams};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opsdesk_schema::{ContentItem, ContentItemPatch, NewContentItem};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/content", get(list_content).post(create_content))
        .route("/api/content/board", get(content_board))
        .route("/api/content/{id}", patch(update_content))
        .route("/api/content/{id}/move", post(move_content))
        .route("/api/content/{id}/archive", post(archive_content))
        .route("/api/content/{id}/restore", post(restore_content))
}

async fn list_content(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ContentItem>>, OpsError> {
    Ok(Json(state.pages.list_content(&params).await?))
}

async fn content_board(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lane<ContentItem>>>, OpsError> {
    Ok(Json(state.pages.content_board(&params).await?))
}

async fn create_content(
    State(state): State<AppState>,
    Json(new): Json<NewContentItem>,
) -> Result<(StatusCode, Json<ContentItem>), OpsError> {
    Ok(created(state.pages.create_content(&new).await?))
}

async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ContentItemPatch>,
) -> Result<Json<ContentItem>, OpsError> {
    Ok(Json(state.pages.update_content(&id, &patch).await?))
}

async fn move_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveCard>,
) -> Result<Json<ContentItem>, OpsError> {
    Ok(Json(state.pages.move_content(&id, &body.to).await?))
}

async fn archive_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_content(&id, true).await?))
}

async fn restore_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_content(&id, false).await?))
}
