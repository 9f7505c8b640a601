#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use opsdesk::config::{FunctionsConfig, RealtimeConfig, StorageConfig};
use opsdesk::db::{DataAccess, DbActorHandle, Row, Select, Store, Write};
use opsdesk::error::OpsError;
use opsdesk::functions::RemoteFunctions;
use opsdesk::pages::Pages;
use opsdesk::realtime::ChangeFeed;
use opsdesk::server::{AppState, opsdesk_router};
use opsdesk::storage::LocalObjectStore;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique path under the system temp dir, e.g. `opsdesk-leads-1234-99887766`.
pub fn temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    std::env::temp_dir().join(format!("opsdesk-{label}-{}-{nanos}", std::process::id()))
}

pub fn temp_database_url(label: &str) -> String {
    format!("sqlite:{}.sqlite", temp_path(label).display())
}

/// Remote functions stand-in: records every call, answers from a table.
#[derive(Default)]
pub struct RecordingFunctions {
    calls: Mutex<Vec<(String, Value)>>,
    responses: HashMap<String, Value>,
    failing: Vec<String>,
}

impl RecordingFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, name: &str, value: Value) -> Self {
        self.responses.insert(name.to_string(), value);
        self
    }

    pub fn fail(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls().iter().filter(|(n, _)| n == name).count()
    }
}

#[async_trait]
impl RemoteFunctions for RecordingFunctions {
    async fn invoke(&self, name: &str, body: Value) -> Result<Value, OpsError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((name.to_string(), body));
        if self.failing.iter().any(|n| n == name) {
            return Err(OpsError::Function {
                name: name.to_string(),
                status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                message: "function crashed".to_string(),
            });
        }
        Ok(self
            .responses
            .get(name)
            .cloned()
            .unwrap_or_else(|| json!({ "ok": true })))
    }
}

/// Pass-through backend that counts the writes reaching it.
pub struct CountingAccess {
    inner: Arc<dyn DataAccess>,
    writes: AtomicUsize,
    batches: AtomicUsize,
    rejected_table: Mutex<Option<String>>,
}

impl CountingAccess {
    pub fn new(inner: Arc<dyn DataAccess>) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
            rejected_table: Mutex::new(None),
        }
    }

    /// Corrupt every insert into `table` so the backend rejects it.
    pub fn reject_inserts_into(&self, table: &str) {
        *self.rejected_table.lock().unwrap() = Some(table.to_string());
    }

    fn vet(&self, write: Write) -> Write {
        let rejected = self.rejected_table.lock().unwrap().clone();
        match write {
            Write::Insert { table, mut row } if rejected.as_deref() == Some(table.as_str()) => {
                row.insert("id".to_string(), json!(["not", "an", "id"]));
                Write::Insert { table, row }
            }
            other => other,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataAccess for CountingAccess {
    async fn select(&self, select: Select) -> Result<Vec<Row>, OpsError> {
        self.inner.select(select).await
    }

    async fn write(&self, write: Write) -> Result<Vec<Row>, OpsError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(self.vet(write)).await
    }

    async fn batch(&self, writes: Vec<Write>) -> Result<Vec<Vec<Row>>, OpsError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let writes = writes.into_iter().map(|w| self.vet(w)).collect();
        self.inner.batch(writes).await
    }
}

pub struct Harness {
    pub db: DbActorHandle,
    pub feed: ChangeFeed,
    pub access: Arc<CountingAccess>,
    pub functions: Arc<RecordingFunctions>,
    pub pages: Pages,
    pub storage_root: PathBuf,
}

impl Harness {
    pub async fn new(label: &str, functions: RecordingFunctions) -> Self {
        let feed = ChangeFeed::new(256);
        let db = opsdesk::db::spawn(&temp_database_url(label), feed.clone())
            .await
            .expect("failed to spawn db actor");
        let access = Arc::new(CountingAccess::new(Arc::new(db.clone())));
        let functions = Arc::new(functions);

        let storage_root = temp_path(&format!("{label}-storage"));
        let storage_cfg = StorageConfig {
            root: storage_root.clone(),
            ..StorageConfig::default()
        };

        let pages = Pages::new(
            Store::new(access.clone()),
            functions.clone(),
            Arc::new(LocalObjectStore::new(&storage_cfg)),
            Arc::new(FunctionsConfig::default()),
        );

        Self {
            db,
            feed,
            access,
            functions,
            pages,
            storage_root,
        }
    }

    pub fn store(&self) -> &Store {
        self.pages.store()
    }

    pub fn app(&self) -> Router {
        let state = AppState::new(
            self.pages.clone(),
            self.feed.clone(),
            RealtimeConfig::default(),
        );
        opsdesk_router(state)
    }
}
