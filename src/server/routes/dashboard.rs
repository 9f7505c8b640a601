use crate::error::OpsError;
use crate::pages::DashboardSummary;
use crate::server::router::AppState;
use axum::{Json, Router, extract::State, routing::get};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardSummary>, OpsError> {
    Ok(Json(state.pages.dashboard().await?))
}
