use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum OpsError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{table} record not found: {id}")]
    NotFound { table: String, id: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column {column} on {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Unknown relation {relation} on {table}")]
    UnknownRelation { table: String, relation: String },

    #[error("Invalid value for {table}.{column}: {reason}")]
    InvalidValue {
        table: String,
        column: String,
        reason: String,
    },

    #[error("Remote function {name} failed: {message}")]
    Function {
        name: String,
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl OpsError {
    pub fn validation(message: impl Into<String>) -> Self {
        OpsError::Validation(message.into())
    }

    pub fn not_found(table: &str, id: &str) -> Self {
        OpsError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }

    fn is_unique_violation(&self) -> bool {
        match self {
            OpsError::DatabaseError(e) => e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation()),
            _ => false,
        }
    }
}

impl IntoResponse for OpsError {
    fn into_response(self) -> axum::response::Response {
        let raw = self.to_string();
        let conflict = self.is_unique_violation();
        let (status, error_body) = match self {
            OpsError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                    details: None,
                },
            ),

            OpsError::NotFound { table, id } => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: format!("No {table} record with id {id}."),
                    details: None,
                },
            ),

            OpsError::UnknownTable(_)
            | OpsError::UnknownColumn { .. }
            | OpsError::UnknownRelation { .. }
            | OpsError::InvalidValue { .. }
            | OpsError::InvalidPath(_) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "BAD_REQUEST".to_string(),
                    message: raw,
                    details: None,
                },
            ),

            OpsError::Function {
                name,
                status,
                message,
            } => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "FUNCTION_ERROR".to_string(),
                    message: format!("Remote function {name} failed."),
                    details: Some(json!({
                        "function": name,
                        "status": status.map(|s| s.as_u16()),
                        "message": message,
                    })),
                },
            ),

            OpsError::ReqwestError(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: "Remote service error.".to_string(),
                    details: Some(Value::String(raw)),
                },
            ),

            OpsError::DatabaseError(_) if conflict => (
                StatusCode::CONFLICT,
                ApiErrorObject {
                    code: "CONFLICT".to_string(),
                    message: "Record conflicts with an existing one.".to_string(),
                    details: Some(Value::String(raw)),
                },
            ),

            OpsError::DatabaseError(_) | OpsError::RactorError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "DATA_ACCESS_ERROR".to_string(),
                    message: "Data access failed.".to_string(),
                    details: Some(Value::String(raw)),
                },
            ),

            OpsError::JsonError(_) | OpsError::IoError(_) | OpsError::UrlError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
