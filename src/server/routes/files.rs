use crate::error::OpsError;
use crate::server::router::AppState;
use crate::storage::StoredObject;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, put},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/storage/{owner_id}", get(list_objects))
        .route(
            "/api/storage/{owner_id}/{name}",
            put(upload_object).delete(delete_object),
        )
        .route("/storage/{*path}", get(serve_object))
}

async fn list_objects(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<StoredObject>>, OpsError> {
    Ok(Json(state.pages.storage().list(&owner_id).await?))
}

/// PUT /api/storage/{owner_id}/{name}
///
/// Raw request body is stored as-is; an existing object is replaced.
async fn upload_object(
    State(state): State<AppState>,
    Path((owner_id, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredObject>), OpsError> {
    let stored = state.pages.storage().upload(&owner_id, &name, &body).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn delete_object(
    State(state): State<AppState>,
    Path((owner_id, name)): Path<(String, String)>,
) -> Result<StatusCode, OpsError> {
    state
        .pages
        .storage()
        .delete(&format!("{owner_id}/{name}"))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

async fn serve_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, OpsError> {
    let bytes = state.pages.storage().read(&path).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes))
}
