//! # dynsql
//!
//! Dynamic, validated SQL statements from structured descriptions.
//!
//! ## Features
//!
//! - **Closed column sets**: columns are enum members ([`FieldSet`]), not strings
//! - **Validated before built**: identifiers, operators, literals and payload shapes
//!   are checked before any SQL text exists
//! - **Parameterized only**: every literal becomes a `?` placeholder with an ordered bind list
//! - **Pluggable execution**: the core talks to an [`Executor`]; a PostgreSQL one ships in [`pg`]
//! - **Atomic compositions**: chunked batch inserts, upsert and replace run as transactions
//! - **Query monitoring**: timing, logging and counters via [`monitor::InstrumentedExecutor`]
//!
//! ## Example
//!
//! ```ignore
//! use dynsql::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, FieldSet)]
//! enum UserField {
//!     Id,
//!     Name,
//!     Age,
//! }
//!
//! let manager = SqlManager::new(PgPool::new(create_pool(&database_url)?));
//!
//! // SELECT id, name FROM users WHERE age > ? ORDER BY name ASC LIMIT 10 OFFSET 0
//! let rows = manager
//!     .select(
//!         "users",
//!         &QueryParams::new()
//!             .select([UserField::Id, UserField::Name])
//!             .filter(Condition::gt(UserField::Age, 18))
//!             .order_by(OrderSpec::asc(UserField::Name))
//!             .paginate(Pagination::default()),
//!     )
//!     .await?;
//!
//! // UPDATE users SET name = ? WHERE id = ?
//! manager
//!     .update(
//!         "users",
//!         &UpdateParams::new(
//!             FieldMap::new().set(UserField::Name, "Alice"),
//!             vec![Condition::eq(UserField::Id, 1)],
//!         ),
//!     )
//!     .await?;
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod field;
pub mod manager;
pub mod monitor;
pub mod params;
pub mod pg;
pub mod prelude;
pub mod record;
pub mod repository;
pub mod validate;
pub mod value;

pub use builder::{BuildDefaults, BuiltQuery, SqlBuilder, StatementBuilder};
pub use error::{SqlError, SqlResult};
pub use executor::{Executor, TxHandle, UnitOfWork, unit_of_work};
pub use field::{FieldMap, FieldSet};
pub use manager::{ManagerConfig, SqlManager};
pub use params::{
    BatchError, BatchExecutionErrorResult, BatchInsertParams, Condition, CountParams,
    DeleteParams, Direction, ExecutionResult, FindAllParams, InsertParams, JoinKind, JoinSpec,
    Operator, OrderSpec, Pagination, QueryParams, ReplaceParams, UpdateParams, UpsertParams,
};
pub use record::Record;
pub use repository::{Mapper, Repository};
pub use validate::{SqlValidator, StatementValidator, ValidatorConfig};
pub use value::{FromValue, Value};

#[cfg(feature = "derive")]
pub use dynsql_derive::FieldSet;
