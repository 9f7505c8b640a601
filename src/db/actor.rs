use super::exec::{self, Outcome};
use super::query::{Row, Select, Write};
use super::schema::init_statements;
use crate::error::OpsError;
use crate::realtime::{ChangeEvent, ChangeFeed};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Run a filtered/ordered read, with optional embeds.
    Select(Select, RpcReplyPort<Result<Vec<Row>, OpsError>>),

    /// Apply one write and return the affected rows.
    Write(Write, RpcReplyPort<Result<Vec<Row>, OpsError>>),

    /// Apply all writes in one transaction; either every write lands or none.
    Batch(Vec<Write>, RpcReplyPort<Result<Vec<Vec<Row>>, OpsError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
    feed: ChangeFeed,
}

impl DbActorHandle {
    pub async fn select(&self, select: Select) -> Result<Vec<Row>, OpsError> {
        ractor::call!(self.actor, DbActorMessage::Select, select)
            .map_err(|e| OpsError::RactorError(format!("DbActor Select RPC failed: {e}")))?
    }

    pub async fn write(&self, write: Write) -> Result<Vec<Row>, OpsError> {
        ractor::call!(self.actor, DbActorMessage::Write, write)
            .map_err(|e| OpsError::RactorError(format!("DbActor Write RPC failed: {e}")))?
    }

    pub async fn batch(&self, writes: Vec<Write>) -> Result<Vec<Vec<Row>>, OpsError> {
        ractor::call!(self.actor, DbActorMessage::Batch, writes)
            .map_err(|e| OpsError::RactorError(format!("DbActor Batch RPC failed: {e}")))?
    }

    /// Feed that receives an event for every committed row change.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct DbActorState {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl DbActorState {
    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.feed.publish(event);
        }
    }
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = (String, ChangeFeed);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        (database_url, feed): Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool, feed })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Select(select, reply) => {
                let res = self.select(&state.pool, &select).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Write(write, reply) => {
                let res = match self.write(&state.pool, write).await {
                    Ok(outcome) => {
                        state.publish(outcome.events);
                        Ok(outcome.rows)
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::Batch(writes, reply) => {
                let res = match self.batch(&state.pool, writes).await {
                    Ok((rows, events)) => {
                        state.publish(events);
                        Ok(rows)
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn select(&self, pool: &SqlitePool, select: &Select) -> Result<Vec<Row>, OpsError> {
        let mut conn = pool.acquire().await?;
        exec::select(&mut *conn, select).await
    }

    async fn write(&self, pool: &SqlitePool, write: Write) -> Result<Outcome, OpsError> {
        let mut conn = pool.acquire().await?;
        exec::write(&mut *conn, write).await
    }

    async fn batch(
        &self,
        pool: &SqlitePool,
        writes: Vec<Write>,
    ) -> Result<(Vec<Vec<Row>>, Vec<ChangeEvent>), OpsError> {
        let count = writes.len();
        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(count);
        let mut events = Vec::new();

        for (idx, write) in writes.into_iter().enumerate() {
            let table = write.table().to_string();
            match exec::write(&mut *tx, write).await {
                Ok(outcome) => {
                    rows.push(outcome.rows);
                    events.extend(outcome.events);
                }
                Err(e) => {
                    warn!(step = idx, table = %table, error = %e, "db batch rolled back");
                    // Dropping the transaction rolls it back.
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        debug!(writes = count, events = events.len(), "db batch committed");
        Ok((rows, events))
    }
}

/// Spawn the database actor and return a cloneable handle.
///
/// The actor is unnamed so several stores can coexist in one process.
pub async fn spawn(database_url: &str, feed: ChangeFeed) -> Result<DbActorHandle, OpsError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, (database_url.to_string(), feed.clone()))
        .await
        .map_err(|e| OpsError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor, feed })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), OpsError> {
    for stmt in init_statements() {
        sqlx::query(&stmt).execute(pool).await?;
    }
    Ok(())
}
