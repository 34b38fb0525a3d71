//! Statement timing, logging and counters.
//!
//! Wrap any [`Executor`](crate::Executor) in an [`InstrumentedExecutor`] to get
//! one `tracing` event per statement (target `dynsql.sql`), a WARN event for
//! slow statements, and aggregated [`QueryStats`].
//!
//! ```rust,ignore
//! use dynsql::monitor::{InstrumentedExecutor, MonitorConfig};
//! use std::time::Duration;
//!
//! let executor = InstrumentedExecutor::new(executor).with_config(
//!     MonitorConfig::new()
//!         .with_slow_query_threshold(Duration::from_millis(250))
//!         .with_max_sql_length(120),
//! );
//! // ...
//! println!("{:?}", executor.stats());
//! ```

mod config;
mod instrumented;
mod stats;
mod types;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedExecutor;
pub use stats::QueryStats;
pub use types::{QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
