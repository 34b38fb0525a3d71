//! Table-bound, entity-typed façade over [`SqlManager`].

use crate::builder::{SqlBuilder, StatementBuilder};
use crate::error::{SqlError, SqlResult};
use crate::executor::Executor;
use crate::field::FieldSet;
use crate::manager::SqlManager;
use crate::params::{
    BatchExecutionErrorResult, BatchInsertParams, Condition, CountParams, DeleteParams,
    ExecutionResult, FindAllParams, InsertParams, Pagination, QueryParams, ReplaceParams,
    UpdateParams, UpsertParams,
};
use crate::record::Record;
use crate::validate::{SqlValidator, StatementValidator};
use crate::value::Value;
use std::marker::PhantomData;

/// Converts a raw row into a domain entity.
pub trait Mapper<T>: Send + Sync {
    fn to_domain_entity(&self, record: &Record) -> SqlResult<T>;
}

impl<T, Func> Mapper<T> for Func
where
    Func: Fn(&Record) -> SqlResult<T> + Send + Sync,
{
    fn to_domain_entity(&self, record: &Record) -> SqlResult<T> {
        self(record)
    }
}

/// A [`SqlManager`] bound to one table and one entity type.
///
/// ```ignore
/// let users = Repository::new(manager, "users", |r: &Record| {
///     Ok(User { id: r.try_get("id")?, name: r.try_get("name")? })
/// })?;
/// let alice: Option<User> = users.find_by_id(1).await?;
/// ```
pub struct Repository<F, T, E, M, B = SqlBuilder, V = SqlValidator> {
    manager: SqlManager<E, B, V>,
    table: String,
    mapper: M,
    _marker: PhantomData<fn() -> (F, T)>,
}

impl<F, T, E, M, B, V> Repository<F, T, E, M, B, V>
where
    F: FieldSet,
    E: Executor,
    M: Mapper<T>,
    B: StatementBuilder + Clone,
    V: StatementValidator + Clone,
{
    /// Bind `table`, rejecting it up front if it is not a valid table name.
    pub fn new(manager: SqlManager<E, B, V>, table: impl Into<String>, mapper: M) -> SqlResult<Self> {
        let table = table.into();
        manager.validator().validate_table_name(&table)?;
        Ok(Self {
            manager,
            table,
            mapper,
            _marker: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn manager(&self) -> &SqlManager<E, B, V> {
        &self.manager
    }

    fn map_rows(&self, rows: &[Record]) -> SqlResult<Vec<T>> {
        rows.iter()
            .map(|row| self.mapper.to_domain_entity(row))
            .collect()
    }

    /// Look up one entity by its primary key column.
    pub async fn find_by_id(&self, id: impl Into<Value>) -> SqlResult<Option<T>> {
        let Some(pk) = F::primary_key() else {
            return Err(SqlError::invalid_identifier(format!(
                "{} has no primary key field",
                std::any::type_name::<F>()
            )));
        };
        self.find_one(QueryParams::new().filter(Condition::eq(pk, id)))
            .await
    }

    /// First matching entity, if any.
    ///
    /// Without explicit pagination the query is limited to one row.
    pub async fn find_one(&self, mut params: QueryParams<F>) -> SqlResult<Option<T>> {
        if params.pagination.is_none() {
            params.pagination = Some(Pagination::new(1, 0));
        }
        let rows = self.manager.select(&self.table, &params).await?;
        rows.first()
            .map(|row| self.mapper.to_domain_entity(row))
            .transpose()
    }

    pub async fn find_many(&self, params: &QueryParams<F>) -> SqlResult<Vec<T>> {
        let rows = self.manager.select(&self.table, params).await?;
        self.map_rows(&rows)
    }

    /// Every matching entity, without LIMIT/OFFSET.
    pub async fn find_all(&self, params: FindAllParams<F>) -> SqlResult<Vec<T>> {
        let params = QueryParams::from(params);
        let rows = self.manager.select(&self.table, &params).await?;
        self.map_rows(&rows)
    }

    pub async fn count(&self, params: &CountParams<F>) -> SqlResult<i64> {
        self.manager.count(&self.table, params).await
    }

    pub async fn create_many(&self, params: &InsertParams<F>) -> SqlResult<ExecutionResult> {
        self.manager.insert(&self.table, params).await
    }

    pub async fn update_many(&self, params: &UpdateParams<F>) -> SqlResult<ExecutionResult> {
        self.manager.update(&self.table, params).await
    }

    pub async fn delete_many(&self, params: &DeleteParams<F>) -> SqlResult<ExecutionResult> {
        self.manager.delete(&self.table, params).await
    }

    pub async fn batch_create(
        &self,
        params: &BatchInsertParams<F>,
    ) -> SqlResult<BatchExecutionErrorResult<F>> {
        self.manager.batch_insert(&self.table, params).await
    }

    pub async fn upsert(&self, params: &UpsertParams<F>) -> SqlResult<()> {
        self.manager.upsert(&self.table, params).await
    }

    pub async fn replace(&self, params: &ReplaceParams<F>) -> SqlResult<()> {
        self.manager.replace(&self.table, params).await
    }
}
