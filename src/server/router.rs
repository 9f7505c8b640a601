use crate::config::RealtimeConfig;
use crate::pages::Pages;
use crate::realtime::ChangeFeed;
use crate::server::routes::{
    content, crm, dashboard, files, procurement, realtime, sales, warehouse,
};

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
};
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    // For the realtime SSE stream this is time-to-first-byte only.
    let line = format!(
        "| {:>3} | {request_id} | {:^7} | {:<8} | {} | {latency_ms}ms | {user_agent}",
        status.as_u16(),
        method.as_str(),
        format_http_version(version),
        uri.path(),
    );
    match status {
        s if s.is_server_error() => error!("{line}"),
        s if s.is_client_error() => warn!("{line}"),
        _ => info!("{line}"),
    }

    resp
}

#[derive(Clone)]
pub struct AppState {
    pub pages: Pages,
    pub feed: ChangeFeed,
    pub realtime: Arc<RealtimeConfig>,
}

impl AppState {
    pub fn new(pages: Pages, feed: ChangeFeed, realtime: RealtimeConfig) -> Self {
        Self {
            pages,
            feed,
            realtime: Arc::new(realtime),
        }
    }
}

pub fn opsdesk_router(state: AppState) -> Router {
    Router::new()
        .merge(crm::router())
        .merge(sales::router())
        .merge(procurement::router())
        .merge(warehouse::router())
        .merge(content::router())
        .merge(dashboard::router())
        .merge(realtime::router())
        .merge(files::router())
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}
