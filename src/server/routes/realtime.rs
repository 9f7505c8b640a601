use crate::db::schema;
use crate::error::OpsError;
use crate::realtime::ChangeKind;
use crate::server::router::AppState;
use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, warn};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/realtime/{table}", get(realtime_stream))
}

fn event_name(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Insert => "insert",
        ChangeKind::Update => "update",
        ChangeKind::Delete => "delete",
    }
}

/// GET /api/realtime/{table}
///
/// Streams one SSE event per committed row change on `table`. The event name
/// is the change kind; the data is the JSON change event.
async fn realtime_stream(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, OpsError> {
    if schema::table(&table).is_none() {
        return Err(OpsError::UnknownTable(table));
    }
    debug!(table = %table, listeners = state.feed.listener_count(), "realtime stream opened");

    let stream = BroadcastStream::new(state.feed.receiver()).filter_map(move |item| match item {
        Ok(event) if event.table == table => {
            match Event::default()
                .event(event_name(event.kind))
                .json_data(&event)
            {
                Ok(ev) => Some(Ok(ev)),
                Err(e) => {
                    warn!("Failed to serialize change event: {}", e);
                    None
                }
            }
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(table = %table, skipped, "realtime stream lagged behind feed");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
