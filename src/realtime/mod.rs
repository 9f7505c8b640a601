//! Change feed: committed writes relayed to interested listeners.
//!
//! The data-access actor publishes one [`ChangeEvent`] per affected row after
//! a write (or a whole batch) commits. Listeners either hold a
//! [`Subscription`] with an explicit `start()`/`stop()` lifecycle, or stream
//! the feed over SSE.

mod subscription;

pub use subscription::Subscription;

use crate::db::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// Row after the change; for deletes, the row as it was.
    pub row: Row,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: &str, kind: ChangeKind, row: Row) -> Self {
        Self {
            table: table.to_string(),
            kind,
            row,
            at: Utc::now(),
        }
    }

    pub fn row_id(&self) -> Option<&str> {
        self.row.get("id").and_then(|v| v.as_str())
    }
}

/// Fan-out point for change events. Cheap to clone.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Never blocks; events are dropped when nobody listens.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn subscribe(&self, table: &str, queue_capacity: usize) -> Subscription {
        Subscription::new(self.clone(), table, queue_capacity)
    }
}
