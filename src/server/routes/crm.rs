use super::{MoveCard, created};
use crate::error::OpsError;
use crate::pages::kanban::Lane;
use crate::pages::{
    ArchiveOutcome, CustomerDetail, EmailRequest, LeadCreated, LeadDetail, ListParams,
    NewLeadWithCustomer,
};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opsdesk_schema::{
    Customer, CustomerPatch, Lead, LeadPatch, NewCustomer, NewOffer, NewPartner, Offer, Partner,
    PartnerKind, PartnerPatch,
};
use serde::Deserialize;
use serde_json::Value;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(customer_detail).patch(update_customer),
        )
        .route("/api/customers/{id}/archive", post(archive_customer))
        .route("/api/customers/{id}/restore", post(restore_customer))
        .route("/api/leads", get(list_leads).post(create_lead))
        .route("/api/leads/board", get(lead_board))
        .route("/api/leads/{id}", get(lead_detail).patch(update_lead))
        .route("/api/leads/{id}/move", post(move_lead))
        .route("/api/leads/{id}/archive", post(archive_lead))
        .route("/api/leads/{id}/restore", post(restore_lead))
        .route(
            "/api/leads/{id}/offers",
            get(list_offers).post(create_offer),
        )
        .route("/api/leads/{id}/sync-configurator", post(sync_configurator))
        .route("/api/leads/{id}/email", post(email_lead_customer))
        .route("/api/partners", get(list_partners).post(create_partner))
        .route("/api/partners/{id}", patch(update_partner))
        .route("/api/partners/{id}/archive", post(archive_partner))
        .route("/api/partners/{id}/restore", post(restore_partner))
        .route("/api/partners/{id}/email", post(email_partner))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, OpsError> {
    Ok(Json(state.pages.list_customers(&params).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), OpsError> {
    Ok(created(state.pages.create_customer(&new).await?))
}

async fn customer_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, OpsError> {
    Ok(Json(state.pages.customer_detail(&id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>, OpsError> {
    Ok(Json(state.pages.update_customer(&id, &patch).await?))
}

async fn archive_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_customer(&id, true).await?))
}

async fn restore_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_customer(&id, false).await?))
}

async fn list_leads(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lead>>, OpsError> {
    Ok(Json(state.pages.list_leads(&params).await?))
}

async fn lead_board(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lane<Lead>>>, OpsError> {
    Ok(Json(state.pages.lead_board(&params).await?))
}

/// POST /api/leads
///
/// Creates (or reuses by email) the customer and the lead. A failed
/// configurator sync is reported in `sync_error`; the response is still 201.
async fn create_lead(
    State(state): State<AppState>,
    Json(form): Json<NewLeadWithCustomer>,
) -> Result<(StatusCode, Json<LeadCreated>), OpsError> {
    Ok(created(state.pages.create_lead(form).await?))
}

async fn lead_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeadDetail>, OpsError> {
    Ok(Json(state.pages.lead_detail(&id).await?))
}

async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<LeadPatch>,
) -> Result<Json<Lead>, OpsError> {
    Ok(Json(state.pages.update_lead(&id, &patch).await?))
}

async fn move_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveCard>,
) -> Result<Json<Lead>, OpsError> {
    Ok(Json(state.pages.move_lead(&id, &body.to).await?))
}

async fn archive_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_lead(&id, true).await?))
}

async fn restore_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_lead(&id, false).await?))
}

async fn list_offers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Offer>>, OpsError> {
    Ok(Json(state.pages.offers_for_lead(&id).await?))
}

async fn create_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewOffer>,
) -> Result<(StatusCode, Json<Offer>), OpsError> {
    Ok(created(state.pages.create_offer(&id, &new).await?))
}

async fn sync_configurator(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, OpsError> {
    Ok(Json(state.pages.sync_configurator(&id).await?))
}

async fn email_lead_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(email): Json<EmailRequest>,
) -> Result<Json<Value>, OpsError> {
    Ok(Json(state.pages.email_lead_customer(&id, &email).await?))
}

#[derive(Debug, Default, Deserialize)]
struct PartnerQuery {
    #[serde(default)]
    kind: Option<PartnerKind>,
}

async fn list_partners(
    State(state): State<AppState>,
    Query(filter): Query<PartnerQuery>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Partner>>, OpsError> {
    Ok(Json(state.pages.list_partners(filter.kind, &params).await?))
}

async fn create_partner(
    State(state): State<AppState>,
    Json(new): Json<NewPartner>,
) -> Result<(StatusCode, Json<Partner>), OpsError> {
    Ok(created(state.pages.create_partner(&new).await?))
}

async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PartnerPatch>,
) -> Result<Json<Partner>, OpsError> {
    Ok(Json(state.pages.update_partner(&id, &patch).await?))
}

async fn archive_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_partner(&id, true).await?))
}

async fn restore_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveOutcome>, OpsError> {
    Ok(Json(state.pages.archive_partner(&id, false).await?))
}

async fn email_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(email): Json<EmailRequest>,
) -> Result<Json<Value>, OpsError> {
    Ok(Json(state.pages.email_partner(&id, &email).await?))
}
