use super::{ChangeEvent, ChangeFeed};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Listener for insert/update/delete events on one table.
///
/// Events are forwarded from the shared feed into a bounded queue owned by
/// the subscription. A stopped subscription receives nothing; events
/// published while stopped are not replayed on restart.
pub struct Subscription {
    feed: ChangeFeed,
    table: String,
    capacity: usize,
    lagged: Arc<AtomicU64>,
    running: Option<Running>,
}

struct Running {
    rx: mpsc::Receiver<ChangeEvent>,
    forwarder: JoinHandle<()>,
}

impl Subscription {
    pub(super) fn new(feed: ChangeFeed, table: &str, capacity: usize) -> Self {
        Self {
            feed,
            table: table.to_string(),
            capacity: capacity.max(1),
            lagged: Arc::new(AtomicU64::new(0)),
            running: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Events the forwarder missed because the shared feed overran it.
    pub fn lagged(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }

    /// Begin receiving. Idempotent while running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let mut source = self.feed.receiver();
        let table = self.table.clone();
        let lagged = self.lagged.clone();

        let forwarder = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) if event.table == table => {
                        // Bounded: a full queue back-pressures this forwarder,
                        // never the publisher.
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        lagged.fetch_add(skipped, Ordering::Relaxed);
                        warn!(table = %table, skipped, "change subscription lagged behind feed");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(table = %table, "change subscription forwarder exited");
        });

        debug!(table = %self.table, capacity = self.capacity, "change subscription started");
        self.running = Some(Running { rx, forwarder });
    }

    /// Stop receiving and drop anything still queued.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.forwarder.abort();
            debug!(table = %self.table, "change subscription stopped");
        }
    }

    /// Next queued event. Returns `None` when stopped or the feed is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        match self.running.as_mut() {
            Some(running) => running.rx.recv().await,
            None => None,
        }
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.running
            .as_mut()
            .and_then(|running| running.rx.try_recv().ok())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
