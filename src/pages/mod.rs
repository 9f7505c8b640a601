//! Page controllers: one module per back-office page.
//!
//! Every page works the same way: read rows through the [`Store`], reshape
//! them (search, sort, group into a board) and write changes back. Side
//! effects outside the store go through [`RemoteFunctions`].

pub mod archive;
pub mod kanban;
pub mod status;
pub mod view;

mod content;
mod customers;
mod dashboard;
mod leads;
mod movements;
mod orders;
mod partners;
mod picking;
mod procurement;
mod production;
mod rma;
mod serials;

pub use archive::ArchiveOutcome;
pub use customers::CustomerDetail;
pub use dashboard::DashboardSummary;
pub use leads::{LeadCreated, LeadDetail, NewLeadWithCustomer};
pub use movements::StockLevel;
pub use orders::{OrderCreated, OrderDetail, cascade_plan};
pub use picking::PickingCompleted;
pub use view::{ListParams, ListView, Listed, Searchable};

use crate::config::FunctionsConfig;
use crate::db::Store;
use crate::error::OpsError;
use crate::functions::{Functions, RemoteFunctions};
use crate::storage::ObjectStore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Free-text message sent through one of the email functions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailRequest {
    pub subject: String,
    pub message: String,
}

impl EmailRequest {
    fn validate(&self) -> Result<(), OpsError> {
        require("subject", &self.subject)?;
        require("message", &self.message)
    }
}

/// Shared handles for all page controllers.
#[derive(Clone)]
pub struct Pages {
    store: Store,
    functions: Functions,
    storage: Arc<dyn ObjectStore>,
    functions_cfg: Arc<FunctionsConfig>,
}

impl Pages {
    pub fn new(
        store: Store,
        functions: Functions,
        storage: Arc<dyn ObjectStore>,
        functions_cfg: Arc<FunctionsConfig>,
    ) -> Self {
        info!(
            functions_base_url = %functions_cfg.base_url,
            configurator_pipelines = ?functions_cfg.configurator_pipelines,
            "Pages initialized"
        );
        Self {
            store,
            functions,
            storage,
            functions_cfg,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStore> {
        &self.storage
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    async fn invoke(&self, name: &str, body: Value) -> Result<Value, OpsError> {
        let result = self.functions.invoke(name, body).await?;
        info!(function = name, "remote function completed");
        Ok(result)
    }
}

/// Record id assigned before a batch, so later writes can reference it.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reject missing or blank required text before any write.
pub(crate) fn require(field: &str, value: &str) -> Result<(), OpsError> {
    if value.trim().is_empty() {
        return Err(OpsError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_some<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, OpsError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OpsError::validation(format!("{field} is required"))),
    }
}
