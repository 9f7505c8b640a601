//! JSON routes, one module per area of the back office.
//!
//! Handlers stay thin: extract, call the page controller, serialize. Errors
//! render through `OpsError`'s `IntoResponse`.

pub mod content;
pub mod crm;
pub mod dashboard;
pub mod files;
pub mod procurement;
pub mod realtime;
pub mod sales;
pub mod warehouse;

use axum::{Json, http::StatusCode};
use serde::Deserialize;

/// Body of `POST .../{id}/move`.
#[derive(Debug, Deserialize)]
pub struct MoveCard {
    pub to: String,
}

pub(crate) fn created<T>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}
