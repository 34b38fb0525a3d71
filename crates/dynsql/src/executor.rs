//! The statement executor boundary.
//!
//! The core never talks to a database directly. It hands SQL text with `?`
//! placeholders and ordered [`Value`]s to an [`Executor`], which owns
//! placeholder dialect, connections and transactions.

use crate::builder::BuiltQuery;
use crate::error::SqlResult;
use crate::record::Record;
use crate::value::Value;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Executor handle scoped to a running transaction.
pub type TxHandle = Arc<dyn Executor>;

/// One operation of a transaction, run against the transaction-scoped handle.
pub type UnitOfWork<'a> = Box<dyn FnOnce(TxHandle) -> BoxFuture<'a, SqlResult<()>> + Send + 'a>;

/// Box an async closure as a [`UnitOfWork`].
///
/// ```ignore
/// let op = unit_of_work(move |tx| async move {
///     tx.execute_raw("DELETE FROM sessions WHERE user_id = ?", &[1.into()]).await?;
///     Ok(())
/// });
/// ```
pub fn unit_of_work<'a, F, Fut>(f: F) -> UnitOfWork<'a>
where
    F: FnOnce(TxHandle) -> Fut + Send + 'a,
    Fut: Future<Output = SqlResult<()>> + Send + 'a,
{
    Box::new(move |tx| Box::pin(f(tx)))
}

/// Runs built statements.
///
/// `query` and `values` are positionally aligned: the n-th `?` in `query`
/// binds `values[n]`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement that returns rows.
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>>;

    /// Run a statement and return the number of affected rows.
    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64>;

    /// Run `operations` in order inside one transaction.
    ///
    /// Implementations commit when every operation succeeds, and roll back
    /// and return the first error unchanged otherwise.
    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()>;

    async fn query(&self, built: &BuiltQuery) -> SqlResult<Vec<Record>> {
        self.query_raw(&built.query, &built.values).await
    }

    async fn execute(&self, built: &BuiltQuery) -> SqlResult<u64> {
        self.execute_raw(&built.query, &built.values).await
    }
}

#[async_trait]
impl<'r, T: Executor + ?Sized> Executor for &'r T {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        (**self).query_raw(query, values).await
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        (**self).execute_raw(query, values).await
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        (**self).execute_transaction(operations).await
    }
}

#[async_trait]
impl<T: Executor + ?Sized> Executor for Arc<T> {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        (**self).query_raw(query, values).await
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        (**self).execute_raw(query, values).await
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        (**self).execute_transaction(operations).await
    }
}

#[async_trait]
impl<T: Executor + ?Sized> Executor for Box<T> {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        (**self).query_raw(query, values).await
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        (**self).execute_raw(query, values).await
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        (**self).execute_transaction(operations).await
    }
}
