//! PostgreSQL executor built on `tokio-postgres`.
//!
//! Statements arrive with `?` placeholders and are rewritten to `$n` before
//! they are sent; [`Value`](crate::Value) implements `ToSql` and result rows
//! are decoded into [`Record`](crate::Record)s.
//!
//! - [`PgConnection`] runs on one session (a `tokio_postgres::Client` or a
//!   pooled `deadpool_postgres::Object`).
//! - [`PgPool`] (feature `pool`) checks a connection out per statement.

mod connection;
mod placeholder;
mod types;

#[cfg(feature = "pool")]
mod pool;

pub use connection::{PgClientHandle, PgConnection};
pub use placeholder::to_positional;

#[cfg(feature = "pool")]
pub use pool::{
    PgPool, PoolConfig, create_pool, create_pool_with_config, create_pool_with_manager_config,
};
