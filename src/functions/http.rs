use super::{BODY_PREVIEW_CHARS, RemoteFunctions};
use crate::config::FunctionsConfig;
use crate::error::OpsError;
use crate::utils::logging::{body_preview, debug_json};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Invokes functions as `POST {base_url}{name}` with a JSON body.
#[derive(Clone)]
pub struct HttpFunctions {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpFunctions {
    pub fn new(cfg: &FunctionsConfig) -> Result<Self, OpsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("opsdesk/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;

        // `Url::join` drops the last segment unless the base ends with '/'.
        let mut base_url = cfg.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn endpoint(&self, name: &str) -> Result<Url, OpsError> {
        if name.is_empty() || name.contains(['/', '?', '#']) {
            return Err(OpsError::validation(format!("invalid function name: {name:?}")));
        }
        Ok(self.base_url.join(name)?)
    }
}

#[async_trait]
impl RemoteFunctions for HttpFunctions {
    async fn invoke(&self, name: &str, body: Value) -> Result<Value, OpsError> {
        let url = self.endpoint(name)?;
        debug_json(&body, |pretty| {
            debug!(function = name, body = %pretty, "invoking remote function");
        });

        let mut req = self.client.post(url).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            req = req.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(|e| OpsError::Function {
            name: name.to_string(),
            status: None,
            message: e.to_string(),
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let preview = body_preview(&bytes, BODY_PREVIEW_CHARS);
            warn!(function = name, %status, body = %preview, "remote function failed");
            return Err(OpsError::Function {
                name: name.to_string(),
                status: Some(status),
                message: preview,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_slice(&bytes)?;
        debug!(function = name, %status, "remote function succeeded");
        Ok(value)
    }
}
