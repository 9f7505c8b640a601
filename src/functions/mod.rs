//! Named remote (server-side) functions invoked with a JSON body.
//!
//! Invocations are fire-once: failures are surfaced to the caller, never
//! retried.

mod http;

pub use http::HttpFunctions;

use crate::error::OpsError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SEND_PARTNER_EMAIL: &str = "send-partner-email";
pub const SEND_CUSTOMER_EMAIL: &str = "send-customer-email";
pub const SYNC_LEAD_CONFIGURATOR: &str = "sync-lead-configurator";
pub const GENERATE_OFFER_CODE: &str = "generate-offer-code";
pub const SEND_NOTIFICATION_EMAIL: &str = "send-notification-email";
pub const GENERATE_ORDER_PDF: &str = "generate-order-pdf";

/// Characters of a failing response body kept in the error message.
pub(crate) const BODY_PREVIEW_CHARS: usize = 512;

#[async_trait]
pub trait RemoteFunctions: Send + Sync {
    /// Invoke `name` with `body`; resolves to the function's JSON result.
    async fn invoke(&self, name: &str, body: Value) -> Result<Value, OpsError>;
}

pub type Functions = Arc<dyn RemoteFunctions>;
