//! Convenient imports for typical `dynsql` usage.
//!
//! ```ignore
//! use dynsql::prelude::*;
//! ```

pub use crate::{
    BatchInsertParams, Condition, CountParams, DeleteParams, Direction, Executor, FieldMap,
    FieldSet, FindAllParams, InsertParams, JoinKind, JoinSpec, Mapper, Operator, OrderSpec,
    Pagination, QueryParams, Record, ReplaceParams, Repository, SqlError, SqlManager, SqlResult,
    UpdateParams, UpsertParams, Value, unit_of_work,
};

pub use crate::pg::PgConnection;

#[cfg(feature = "pool")]
pub use crate::pg::{PgPool, PoolConfig, create_pool};
