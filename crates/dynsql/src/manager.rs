//! Validate → build → execute orchestration.
//!
//! [`SqlManager`] is the only component that performs I/O, and only through
//! its [`Executor`]. Every public operation checks the table name and the
//! description before anything is built, so a rejected description never
//! reaches the database.
//!
//! ```ignore
//! use dynsql::{Condition, QueryParams, SqlManager};
//!
//! let manager = SqlManager::new(executor);
//! let rows = manager
//!     .select("users", &QueryParams::new().filter(Condition::eq(UserField::Id, 1)))
//!     .await?;
//! ```

use crate::builder::{BuildDefaults, BuiltQuery, SqlBuilder, StatementBuilder};
use crate::error::{SqlError, SqlResult};
use crate::executor::{Executor, TxHandle, UnitOfWork, unit_of_work};
use crate::field::{FieldMap, FieldSet};
use crate::params::{
    BatchError, BatchExecutionErrorResult, BatchInsertParams, CountParams, DeleteParams,
    ExecutionResult, InsertParams, QueryParams, ReplaceParams, UpdateParams, UpsertParams,
};
use crate::record::Record;
use crate::validate::{SqlValidator, StatementValidator, ValidatorConfig};
use serde::Deserialize;

/// Manager configuration.
///
/// Every field has a default, so partial TOML/JSON sections deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Rows per INSERT when a batch does not set its own size.
    pub default_batch_size: usize,
    pub defaults: BuildDefaults,
    pub validator: ValidatorConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 1000,
            defaults: BuildDefaults::default(),
            validator: ValidatorConfig::default(),
        }
    }
}

fn log_statement(op: &'static str, table: &str, built: &BuiltQuery) {
    tracing::debug!(
        target: "dynsql.sql",
        op,
        table,
        param_count = built.values.len(),
        sql = %built.query,
        "built statement"
    );
}

/// Statement manager over an injected executor, builder and validator.
#[derive(Debug, Clone)]
pub struct SqlManager<E, B = SqlBuilder, V = SqlValidator> {
    executor: E,
    builder: B,
    validator: V,
    config: ManagerConfig,
}

impl<E: Executor> SqlManager<E> {
    /// Manager with the default builder and validator.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, ManagerConfig::default())
    }

    pub fn with_config(executor: E, config: ManagerConfig) -> Self {
        Self {
            executor,
            builder: SqlBuilder::with_defaults(config.defaults),
            validator: SqlValidator::with_config(config.validator),
            config,
        }
    }
}

impl<E, B, V> SqlManager<E, B, V>
where
    E: Executor,
    B: StatementBuilder + Clone,
    V: StatementValidator + Clone,
{
    /// Manager with a custom builder and validator.
    ///
    /// `config.defaults` and `config.validator` only configure the built-in
    /// parts; here they are ignored in favour of `builder` and `validator`.
    pub fn with_parts(executor: E, builder: B, validator: V, config: ManagerConfig) -> Self {
        Self {
            executor,
            builder,
            validator,
            config,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The same builder and validator over a transaction handle.
    pub fn scoped(&self, tx: TxHandle) -> SqlManager<TxHandle, B, V> {
        SqlManager {
            executor: tx,
            builder: self.builder.clone(),
            validator: self.validator.clone(),
            config: self.config,
        }
    }

    pub async fn select<F: FieldSet>(
        &self,
        table: &str,
        params: &QueryParams<F>,
    ) -> SqlResult<Vec<Record>> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_select(params)?;
        self.run_select(table, params).await
    }

    /// Number of matching rows, read from the `count` column.
    pub async fn count<F: FieldSet>(&self, table: &str, params: &CountParams<F>) -> SqlResult<i64> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_count(params)?;

        let built = self.builder.build_count_query(table, params);
        log_statement("count", table, &built);
        let rows = self.executor.query(&built).await?;
        match rows.first() {
            Some(row) => row.try_get::<i64>("count"),
            None => Err(SqlError::not_found(format!("COUNT on {table} returned no rows"))),
        }
    }

    pub async fn insert<F: FieldSet>(
        &self,
        table: &str,
        params: &InsertParams<F>,
    ) -> SqlResult<ExecutionResult> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_insert(params)?;
        self.run_insert(table, params).await
    }

    pub async fn update<F: FieldSet>(
        &self,
        table: &str,
        params: &UpdateParams<F>,
    ) -> SqlResult<ExecutionResult> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_update(params)?;
        self.run_update(table, params).await
    }

    pub async fn delete<F: FieldSet>(
        &self,
        table: &str,
        params: &DeleteParams<F>,
    ) -> SqlResult<ExecutionResult> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_delete(params)?;
        self.run_delete(table, params).await
    }

    /// Insert `params.data` in chunks, one INSERT per chunk.
    ///
    /// Chunk failures do not stop the loop; each one is returned as a
    /// [`BatchError`] carrying that chunk's rows, in chunk order. Only
    /// validation failures are returned as `Err`.
    pub async fn batch_insert<F: FieldSet>(
        &self,
        table: &str,
        params: &BatchInsertParams<F>,
    ) -> SqlResult<BatchExecutionErrorResult<F>> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_batch_insert(params)?;
        let size = self.batch_size(params)?;

        let mut errors = Vec::new();
        for (index, chunk) in params.data.chunks(size).enumerate() {
            if let Err(error) = self.run_insert_rows(table, chunk).await {
                tracing::warn!(
                    target: "dynsql.sql",
                    table,
                    chunk = index,
                    rows = chunk.len(),
                    error = %error,
                    "batch insert chunk failed"
                );
                errors.push(BatchError {
                    data: chunk.to_vec(),
                    error,
                });
            }
        }
        Ok(errors)
    }

    /// Insert `params.data` in chunks inside one transaction.
    ///
    /// The first failing chunk rolls the whole batch back and its error is
    /// returned.
    pub async fn batch_insert_with_transaction<F: FieldSet>(
        &self,
        table: &str,
        params: &BatchInsertParams<F>,
    ) -> SqlResult<()> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_batch_insert(params)?;
        let size = self.batch_size(params)?;

        let op = unit_of_work(move |tx| async move {
            let scoped = self.scoped(tx);
            for chunk in params.data.chunks(size) {
                scoped.run_insert_rows(table, chunk).await?;
            }
            Ok(())
        });
        self.transaction("batch_insert", table, vec![op]).await
    }

    /// Update the rows matched by `find`, or insert `create` when none match.
    ///
    /// The read and the write share one transaction; exactly one of the two
    /// writes runs. Concurrent upserts are only as isolated as the executor's
    /// transaction isolation level.
    pub async fn upsert<F: FieldSet>(&self, table: &str, params: &UpsertParams<F>) -> SqlResult<()> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_select(&params.find)?;
        self.validator.validate_insert(&params.create)?;
        self.validator.validate_update(&params.update)?;

        let op = unit_of_work(move |tx| async move {
            let scoped = self.scoped(tx);
            let existing = scoped.run_select(table, &params.find).await?;
            if existing.is_empty() {
                scoped.run_insert(table, &params.create).await?;
            } else {
                scoped.run_update(table, &params.update).await?;
            }
            Ok(())
        });
        self.transaction("upsert", table, vec![op]).await
    }

    /// Delete then insert, in one transaction.
    pub async fn replace<F: FieldSet>(
        &self,
        table: &str,
        params: &ReplaceParams<F>,
    ) -> SqlResult<()> {
        self.validator.validate_table_name(table)?;
        self.validator.validate_delete(&params.delete)?;
        self.validator.validate_insert(&params.create)?;

        let op = unit_of_work(move |tx| async move {
            let scoped = self.scoped(tx);
            scoped.run_delete(table, &params.delete).await?;
            scoped.run_insert(table, &params.create).await?;
            Ok(())
        });
        self.transaction("replace", table, vec![op]).await
    }

    /// Run caller-supplied units of work in one transaction.
    pub async fn execute_transaction(&self, operations: Vec<UnitOfWork<'_>>) -> SqlResult<()> {
        tracing::debug!(
            target: "dynsql.sql",
            operations = operations.len(),
            "transaction start"
        );
        self.executor.execute_transaction(operations).await
    }

    async fn transaction(
        &self,
        op: &'static str,
        table: &str,
        operations: Vec<UnitOfWork<'_>>,
    ) -> SqlResult<()> {
        tracing::debug!(target: "dynsql.sql", op, table, "transaction start");
        self.executor.execute_transaction(operations).await
    }

    fn batch_size<F: FieldSet>(&self, params: &BatchInsertParams<F>) -> SqlResult<usize> {
        match params.batch_size.unwrap_or(self.config.default_batch_size) {
            0 => Err(SqlError::malformed("Invalid batch size: 0")),
            size => Ok(size),
        }
    }

    async fn run_select<F: FieldSet>(
        &self,
        table: &str,
        params: &QueryParams<F>,
    ) -> SqlResult<Vec<Record>> {
        let built = self.builder.build_select_query(table, params);
        log_statement("select", table, &built);
        self.executor.query(&built).await
    }

    async fn run_insert<F: FieldSet>(
        &self,
        table: &str,
        params: &InsertParams<F>,
    ) -> SqlResult<ExecutionResult> {
        let built = self.builder.build_insert_query(table, params);
        log_statement("insert", table, &built);
        let affected_rows = self.executor.execute(&built).await?;
        Ok(ExecutionResult { affected_rows })
    }

    async fn run_insert_rows<F: FieldSet>(
        &self,
        table: &str,
        rows: &[FieldMap<F>],
    ) -> SqlResult<ExecutionResult> {
        self.run_insert(table, &InsertParams::new(rows.to_vec()))
            .await
    }

    async fn run_update<F: FieldSet>(
        &self,
        table: &str,
        params: &UpdateParams<F>,
    ) -> SqlResult<ExecutionResult> {
        let built = self.builder.build_update_query(table, params);
        log_statement("update", table, &built);
        let affected_rows = self.executor.execute(&built).await?;
        Ok(ExecutionResult { affected_rows })
    }

    async fn run_delete<F: FieldSet>(
        &self,
        table: &str,
        params: &DeleteParams<F>,
    ) -> SqlResult<ExecutionResult> {
        let built = self.builder.build_delete_query(table, params);
        log_statement("delete", table, &built);
        let affected_rows = self.executor.execute(&built).await?;
        Ok(ExecutionResult { affected_rows })
    }
}
