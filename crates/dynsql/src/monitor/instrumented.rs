use super::config::MonitorConfig;
use super::stats::{QueryStats, StatsCollector};
use super::truncate_sql_bytes;
use super::types::{QueryResult, QueryType};
use crate::error::SqlResult;
use crate::executor::{Executor, TxHandle, UnitOfWork};
use crate::record::Record;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// An [`Executor`] wrapper that times and logs every statement.
///
/// Transactions run through it hand each unit of work an instrumented
/// handle, so statements inside a transaction are logged and counted too.
///
/// ```ignore
/// let executor = InstrumentedExecutor::new(PgPool::new(pool))
///     .with_config(MonitorConfig::new().with_slow_query_threshold(Duration::from_millis(250)));
/// let manager = SqlManager::new(executor);
/// ```
pub struct InstrumentedExecutor<E> {
    inner: E,
    config: MonitorConfig,
    stats: Arc<StatsCollector>,
}

impl<E: Executor> InstrumentedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            config: MonitorConfig::default(),
            stats: Arc::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Counters accumulated so far, including statements run inside transactions.
    pub fn stats(&self) -> QueryStats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn report(&self, sql: &str, param_count: usize, duration: Duration, result: &QueryResult) {
        let query_type = QueryType::from_sql(sql);
        self.stats.record(query_type, sql, duration, result);

        let shown = self.truncate_sql(sql);
        let elapsed_ms = duration.as_secs_f64() * 1000.0;

        if let QueryResult::Error(error) = result {
            tracing::error!(
                target: "dynsql.sql",
                query_type = ?query_type,
                param_count,
                elapsed_ms,
                sql = %shown,
                error = %error,
                "statement failed"
            );
            return;
        }

        emit_at_level!(
            self.config.level,
            target: "dynsql.sql",
            query_type = ?query_type,
            param_count,
            elapsed_ms,
            result = %result,
            sql = %shown,
            "statement"
        );

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration >= threshold {
                tracing::warn!(
                    target: "dynsql.sql",
                    query_type = ?query_type,
                    elapsed_ms,
                    threshold_ms = threshold.as_millis() as u64,
                    sql = %shown,
                    "slow query"
                );
            }
        }
    }
}

#[async_trait]
impl<E: Executor> Executor for InstrumentedExecutor<E> {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        let start = Instant::now();
        let result = self.inner.query_raw(query, values).await;
        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report(query, values.len(), start.elapsed(), &outcome);
        result
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        let start = Instant::now();
        let result = self.inner.execute_raw(query, values).await;
        let outcome = match &result {
            Ok(n) => QueryResult::Affected(*n),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report(query, values.len(), start.elapsed(), &outcome);
        result
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        let wrapped: Vec<UnitOfWork<'a>> = operations
            .into_iter()
            .map(|op| {
                let scoped = handle_factory(self.config.clone(), Arc::clone(&self.stats));
                Box::new(move |tx: TxHandle| op(scoped(tx))) as UnitOfWork<'a>
            })
            .collect();

        let start = Instant::now();
        let result = self.inner.execute_transaction(wrapped).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => emit_at_level!(
                self.config.level,
                target: "dynsql.sql",
                elapsed_ms,
                "transaction committed"
            ),
            Err(e) => tracing::error!(
                target: "dynsql.sql",
                elapsed_ms,
                error = %e,
                "transaction rolled back"
            ),
        }
        result
    }
}

/// Builds instrumented transaction handles sharing one config and counter set.
fn handle_factory(
    config: MonitorConfig,
    stats: Arc<StatsCollector>,
) -> impl Fn(TxHandle) -> TxHandle + Send {
    move |tx: TxHandle| -> TxHandle {
        Arc::new(InstrumentedExecutor {
            inner: tx,
            config: config.clone(),
            stats: Arc::clone(&stats),
        })
    }
}
