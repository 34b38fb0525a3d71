use super::*;
use crate::error::{SqlError, SqlResult};
use crate::executor::{Executor, UnitOfWork, unit_of_work};
use crate::record::Record;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Returns one row per query, `values.len()` affected rows per execute, and
/// fails any statement mentioning `broken`.
struct StubExecutor;

#[async_trait]
impl Executor for StubExecutor {
    async fn query_raw(&self, query: &str, _values: &[Value]) -> SqlResult<Vec<Record>> {
        if query.contains("broken") {
            return Err(SqlError::Other("relation \"broken\" does not exist".into()));
        }
        Ok(vec![Record::new().with("id", 1)])
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        if query.contains("broken") {
            return Err(SqlError::Other("relation \"broken\" does not exist".into()));
        }
        Ok(values.len() as u64)
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        let handle: Arc<dyn Executor> = Arc::new(StubExecutor);
        for op in operations {
            op(Arc::clone(&handle)).await?;
        }
        Ok(())
    }
}

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select 1"), QueryType::Select);
    assert_eq!(QueryType::from_sql("(SELECT 1)"), QueryType::Select);
    assert_eq!(
        QueryType::from_sql("INSERT INTO users (id) VALUES (?)"),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("UPDATE users SET name = ? WHERE id = ?"),
        QueryType::Update
    );
    assert_eq!(
        QueryType::from_sql("DELETE FROM users WHERE id = ?"),
        QueryType::Delete
    );
    assert_eq!(QueryType::from_sql("BEGIN"), QueryType::Other);
    assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
    assert_eq!(QueryType::from_sql(""), QueryType::Other);
}

#[test]
fn test_truncate_sql_bytes_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
    assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
    // 'é' is two bytes; cutting inside it backs off to the boundary.
    assert_eq!(truncate_sql_bytes("é", 1), "");
}

#[test]
fn test_query_result_error_is_truncated() {
    let long = "x".repeat(600);
    match QueryResult::error(long) {
        QueryResult::Error(msg) => {
            assert_eq!(msg.len(), 512 + 3);
            assert!(msg.ends_with("..."));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(QueryResult::Affected(3).to_string(), "3 affected");
}

#[tokio::test]
async fn test_stats_count_by_type_and_failure() {
    let executor = InstrumentedExecutor::new(StubExecutor);

    executor.query_raw("SELECT * FROM users", &[]).await.unwrap();
    executor
        .execute_raw("INSERT INTO users (id) VALUES (?)", &[Value::Int(1)])
        .await
        .unwrap();
    executor
        .execute_raw("UPDATE users SET name = ? WHERE id = ?", &[])
        .await
        .unwrap();
    let err = executor.query_raw("SELECT * FROM broken", &[]).await;
    assert!(err.is_err());

    let stats = executor.stats();
    assert_eq!(stats.total_queries, 4);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.insert_count, 1);
    assert_eq!(stats.update_count, 1);
    assert_eq!(stats.delete_count, 0);

    executor.reset_stats();
    assert_eq!(executor.stats(), QueryStats::default());
}

#[tokio::test]
async fn test_results_pass_through_unchanged() {
    let executor = InstrumentedExecutor::new(StubExecutor);
    let rows = executor.query_raw("SELECT id FROM users", &[]).await.unwrap();
    assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));

    let affected = executor
        .execute_raw("DELETE FROM users WHERE id = ?", &[Value::Int(7)])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let err = executor
        .execute_raw("DELETE FROM broken", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::Other(msg) if msg.contains("broken")));
}

#[tokio::test]
async fn test_transaction_statements_are_counted() {
    let executor = InstrumentedExecutor::new(StubExecutor);
    let ops = vec![
        unit_of_work(|tx| async move {
            tx.query_raw("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
                .await?;
            Ok(())
        }),
        unit_of_work(|tx| async move {
            tx.execute_raw("DELETE FROM users WHERE id = ?", &[Value::Int(1)])
                .await?;
            Ok(())
        }),
    ];
    executor.execute_transaction(ops).await.unwrap();

    let stats = executor.stats();
    assert_eq!(stats.total_queries, 2);
    assert_eq!(stats.select_count, 1);
    assert_eq!(stats.delete_count, 1);
}

#[test]
fn test_config_builders_and_defaults() {
    let config = MonitorConfig::default();
    assert_eq!(config.max_sql_length, Some(200));
    assert_eq!(config.slow_query_threshold, None);
    assert_eq!(config.level, tracing::Level::DEBUG);

    let config = MonitorConfig::new()
        .with_slow_query_threshold(Duration::from_millis(50))
        .no_truncate()
        .with_level(tracing::Level::INFO);
    assert_eq!(config.slow_query_threshold, Some(Duration::from_millis(50)));
    assert_eq!(config.max_sql_length, None);
}

#[test]
fn test_config_from_toml() {
    let config: MonitorConfig = toml::from_str(
        r#"
        slow_query_threshold_ms = 250
        level = "info"
        "#,
    )
    .unwrap();
    assert_eq!(config.slow_query_threshold, Some(Duration::from_millis(250)));
    assert_eq!(config.level, tracing::Level::INFO);
    assert_eq!(config.max_sql_length, Some(200));

    assert!(toml::from_str::<MonitorConfig>(r#"level = "loud""#).is_err());
}
