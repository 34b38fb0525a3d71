use super::placeholder::to_positional;
use super::types::record_from_row;
use crate::error::{SqlError, SqlResult};
use crate::executor::{Executor, TxHandle, UnitOfWork};
use crate::record::Record;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_postgres::Client;
use tokio_postgres::types::ToSql;

/// Global counter for savepoint naming.
static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_savepoint_name() -> String {
    let n = SAVEPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("dynsql_sp_{n}")
}

/// Anything that can lend out a `tokio_postgres::Client`.
pub trait PgClientHandle: Send + Sync + 'static {
    fn client(&self) -> &Client;

    /// Called instead of a plain drop when the session is released while a
    /// transaction it started was never committed or rolled back.
    fn abandon(self)
    where
        Self: Sized,
    {
        // Dropping a client closes its connection, which ends the transaction server side.
        drop(self);
    }
}

impl PgClientHandle for Client {
    fn client(&self) -> &Client {
        self
    }
}

#[cfg(feature = "pool")]
impl PgClientHandle for deadpool_postgres::Object {
    fn client(&self) -> &Client {
        self
    }

    /// Detach the connection from the pool so it is closed instead of recycled.
    fn abandon(self) {
        drop(deadpool_postgres::Object::take(self));
    }
}

/// Rollback statement owed to the session by a transaction that was dropped
/// before it finished.
#[derive(Debug, Default)]
pub(crate) struct PendingReset {
    statement: Mutex<Option<String>>,
}

impl PendingReset {
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.statement.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `rollback`; an outermost `ROLLBACK` supersedes any savepoint rollback.
    pub(crate) fn schedule(&self, rollback: &str, outermost: bool) {
        let mut pending = self.lock();
        if outermost || pending.is_none() {
            *pending = Some(rollback.to_string());
        }
    }

    pub(crate) fn take(&self) -> Option<String> {
        self.lock().take()
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.lock().is_some()
    }
}

/// Armed between `BEGIN`/`SAVEPOINT` and a successful `COMMIT`/`ROLLBACK`.
///
/// Dropped while armed (a panicking unit of work, a cancelled future, a
/// failed commit) it leaves the rollback for the session to run.
pub(crate) struct TxGuard<'s> {
    pending: &'s PendingReset,
    rollback: &'s str,
    outermost: bool,
    armed: bool,
}

impl<'s> TxGuard<'s> {
    pub(crate) fn arm(pending: &'s PendingReset, rollback: &'s str, outermost: bool) -> Self {
        Self {
            pending,
            rollback,
            outermost,
            armed: true,
        }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TxGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                target: "dynsql.sql",
                rollback = self.rollback,
                "transaction abandoned before commit or rollback"
            );
            self.pending.schedule(self.rollback, self.outermost);
        }
    }
}

/// One PostgreSQL session shared by a connection and its transaction handles.
struct Session<C: PgClientHandle> {
    handle: Option<C>,
    pending: PendingReset,
}

impl<C: PgClientHandle> Session<C> {
    /// The client, after paying off any rollback left by an abandoned transaction.
    async fn ready(&self) -> SqlResult<&Client> {
        let client = self
            .handle
            .as_ref()
            .map(PgClientHandle::client)
            .ok_or_else(|| SqlError::Connection("session already released".to_string()))?;
        if let Some(rollback) = self.pending.take() {
            client
                .batch_execute(&rollback)
                .await
                .map_err(SqlError::from_db_error)?;
        }
        Ok(client)
    }
}

impl<C: PgClientHandle> Drop for Session<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if self.pending.is_pending() {
                handle.abandon();
            }
        }
    }
}

fn bind_params(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

pub(crate) async fn query_records(
    client: &Client,
    query: &str,
    values: &[Value],
) -> SqlResult<Vec<Record>> {
    let sql = to_positional(query);
    let params = bind_params(values);
    let rows = client
        .query(sql.as_str(), &params)
        .await
        .map_err(SqlError::from_db_error)?;
    rows.iter().map(record_from_row).collect()
}

pub(crate) async fn execute_statement(
    client: &Client,
    query: &str,
    values: &[Value],
) -> SqlResult<u64> {
    let sql = to_positional(query);
    let params = bind_params(values);
    client
        .execute(sql.as_str(), &params)
        .await
        .map_err(SqlError::from_db_error)
}

/// An [`Executor`] over a single PostgreSQL session.
///
/// `execute_transaction` issues `BEGIN`/`COMMIT`/`ROLLBACK` on the session;
/// a transaction started from inside a unit of work becomes a savepoint.
/// Statements issued through the same connection from elsewhere while a
/// transaction is open run inside that transaction.
///
/// A transaction dropped before it finishes is rolled back before the next
/// statement on the session. A session released in that state is closed
/// rather than reused (a pooled connection is detached from its pool).
pub struct PgConnection<C: PgClientHandle> {
    session: Arc<Session<C>>,
    depth: usize,
}

impl<C: PgClientHandle> PgConnection<C> {
    pub fn new(client: C) -> Self {
        Self {
            session: Arc::new(Session {
                handle: Some(client),
                pending: PendingReset::default(),
            }),
            depth: 0,
        }
    }

    /// Whether this handle belongs to an open transaction.
    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    fn nested(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            depth: self.depth + 1,
        }
    }
}

#[async_trait]
impl<C: PgClientHandle> Executor for PgConnection<C> {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        query_records(self.session.ready().await?, query, values).await
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        execute_statement(self.session.ready().await?, query, values).await
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        let outermost = self.depth == 0;
        let (begin, commit, rollback) = if outermost {
            (
                "BEGIN".to_string(),
                "COMMIT".to_string(),
                "ROLLBACK".to_string(),
            )
        } else {
            let name = next_savepoint_name();
            (
                format!("SAVEPOINT {name}"),
                format!("RELEASE SAVEPOINT {name}"),
                format!("ROLLBACK TO SAVEPOINT {name}"),
            )
        };

        let client = self.session.ready().await?;
        let guard = TxGuard::arm(&self.session.pending, &rollback, outermost);
        if let Err(e) = client.batch_execute(&begin).await {
            guard.disarm();
            return Err(SqlError::from_db_error(e));
        }

        let handle: TxHandle = Arc::new(self.nested());
        for op in operations {
            if let Err(error) = op(Arc::clone(&handle)).await {
                tracing::warn!(
                    target: "dynsql.sql",
                    depth = self.depth,
                    error = %error,
                    "rolling back transaction"
                );
                let client = self.session.ready().await?;
                return match client.batch_execute(&rollback).await {
                    Ok(()) => {
                        guard.disarm();
                        Err(error)
                    }
                    Err(rollback_err) => Err(SqlError::Other(format!(
                        "{error} (rollback failed: {rollback_err})"
                    ))),
                };
            }
        }

        let client = self.session.ready().await?;
        client
            .batch_execute(&commit)
            .await
            .map_err(SqlError::from_db_error)?;
        guard.disarm();
        Ok(())
    }
}
