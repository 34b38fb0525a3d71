mod common;

use common::{Kind, RecordingExecutor, UserField, user_row};
use dynsql::{
    BatchInsertParams, Condition, CountParams, DeleteParams, Executor, FieldMap, InsertParams,
    JoinSpec, ManagerConfig, Pagination, QueryParams, Record, ReplaceParams, SqlError,
    SqlManager, UpdateParams, UpsertParams, Value, unit_of_work,
};

fn row(name: &str, age: i64) -> FieldMap<UserField> {
    FieldMap::new()
        .set(UserField::Name, name)
        .set(UserField::Age, age)
}

fn rows(n: usize) -> Vec<FieldMap<UserField>> {
    (0..n).map(|i| row(&format!("user{i}"), i as i64)).collect()
}

#[tokio::test]
async fn test_select_runs_built_statement() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![user_row(1, "alice", 30)]);
    let manager = SqlManager::new(exec.clone());

    let result = manager
        .select(
            "users",
            &QueryParams::new()
                .select([UserField::Id, UserField::Name])
                .filter(Condition::gt(UserField::Age, 18))
                .paginate(Pagination::default()),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].try_get::<String>("name").unwrap(), "alice");

    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, Kind::Query);
    assert_eq!(
        calls[0].sql,
        "SELECT id, name FROM users WHERE age > ? LIMIT 10 OFFSET 0"
    );
    assert_eq!(calls[0].values, vec![Value::Int(18)]);
    assert!(!calls[0].in_tx);
}

#[tokio::test]
async fn test_validation_failures_never_reach_executor() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    let err = manager
        .select::<UserField>("delete", &QueryParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::ReservedOrInvalidTable(_)));

    let err = manager
        .select(
            "users",
            &QueryParams::new().filter(Condition::eq(UserField::Name, "x'; --")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::UnsafeLiteral(_)));

    let err = manager
        .select(
            "users",
            &QueryParams::<UserField>::new().join(JoinSpec::inner("orders", "1 = 1; DROP")),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = manager
        .delete::<UserField>("users", &DeleteParams::new(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));

    let err = manager
        .update(
            "users",
            &UpdateParams::new(FieldMap::new(), vec![Condition::eq(UserField::Id, 1)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));

    let err = manager
        .insert::<UserField>("users", &InsertParams::new(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));

    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_count_reads_count_column() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![Record::new().with("count", 42)]);
    let manager = SqlManager::new(exec.clone());

    let n = manager
        .count(
            "users",
            &CountParams::new().filter(Condition::gte(UserField::Age, 21)),
        )
        .await
        .unwrap();

    assert_eq!(n, 42);
    assert_eq!(
        exec.statements(),
        vec!["SELECT COUNT(*) FROM users WHERE age >= ?"]
    );
}

#[tokio::test]
async fn test_count_without_rows_is_not_found() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec);

    let err = manager
        .count::<UserField>("users", &CountParams::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_insert_update_delete_report_affected_rows() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    let inserted = manager
        .insert("users", &InsertParams::row(row("bob", 40)))
        .await
        .unwrap();
    let updated = manager
        .update(
            "users",
            &UpdateParams::new(
                FieldMap::new().set(UserField::Age, 41),
                vec![Condition::eq(UserField::Name, "bob")],
            ),
        )
        .await
        .unwrap();
    let deleted = manager
        .delete(
            "users",
            &DeleteParams::new(vec![Condition::eq(UserField::Id, 7)]),
        )
        .await
        .unwrap();

    assert_eq!(inserted.affected_rows, 1);
    assert_eq!(updated.affected_rows, 1);
    assert_eq!(deleted.affected_rows, 1);
    assert_eq!(
        exec.statements(),
        vec![
            "INSERT INTO users (name, age) VALUES (?, ?)",
            "UPDATE users SET age = ? WHERE name = ?",
            "DELETE FROM users WHERE id = ?",
        ]
    );
    let calls = exec.calls();
    assert_eq!(calls[1].values, vec![Value::Int(41), Value::Text("bob".into())]);
}

#[tokio::test]
async fn test_batch_insert_chunks_rows() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    let errors = manager
        .batch_insert("users", &BatchInsertParams::new(rows(5)).batch_size(2))
        .await
        .unwrap();

    assert!(errors.is_empty());
    let statements = exec.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(
        statements[0],
        "INSERT INTO users (name, age) VALUES (?, ?), (?, ?)"
    );
    assert_eq!(statements[2], "INSERT INTO users (name, age) VALUES (?, ?)");
    assert!(exec.calls().iter().all(|c| !c.in_tx));
}

#[tokio::test]
async fn test_batch_insert_uses_default_batch_size() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    manager
        .batch_insert("users", &BatchInsertParams::new(rows(1001)))
        .await
        .unwrap();

    let calls = exec.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].values.len(), 2000);
    assert_eq!(calls[1].values.len(), 2);
}

#[tokio::test]
async fn test_batch_insert_collects_failed_chunks() {
    let exec = RecordingExecutor::new();
    exec.fail_execute_at(2);
    let manager = SqlManager::new(exec.clone());

    let data = rows(5);
    let errors = manager
        .batch_insert("users", &BatchInsertParams::new(data.clone()).batch_size(2))
        .await
        .unwrap();

    // The loop keeps going after the failing chunk.
    assert_eq!(exec.statements().len(), 3);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].data, data[2..4].to_vec());
    assert!(matches!(errors[0].error, SqlError::Other(_)));
}

#[tokio::test]
async fn test_batch_insert_rejects_zero_batch_size() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::with_config(
        exec.clone(),
        ManagerConfig {
            default_batch_size: 0,
            ..ManagerConfig::default()
        },
    );

    let err = manager
        .batch_insert("users", &BatchInsertParams::new(rows(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));

    let err = manager
        .batch_insert("users", &BatchInsertParams::new(rows(2)).batch_size(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_batch_insert_with_transaction_commits() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    manager
        .batch_insert_with_transaction("users", &BatchInsertParams::new(rows(3)).batch_size(2))
        .await
        .unwrap();

    assert_eq!(
        exec.kinds(),
        vec![Kind::Begin, Kind::Execute, Kind::Execute, Kind::Commit]
    );
    assert!(
        exec.calls()
            .iter()
            .filter(|c| c.kind == Kind::Execute)
            .all(|c| c.in_tx)
    );
}

#[tokio::test]
async fn test_batch_insert_with_transaction_rolls_back_on_failure() {
    let exec = RecordingExecutor::new();
    exec.fail_execute_at(1);
    let manager = SqlManager::new(exec.clone());

    let err = manager
        .batch_insert_with_transaction("users", &BatchInsertParams::new(rows(4)).batch_size(2))
        .await
        .unwrap_err();

    assert!(matches!(err, SqlError::Other(_)));
    assert_eq!(exec.kinds(), vec![Kind::Begin, Kind::Execute, Kind::Rollback]);
}

fn upsert_params() -> UpsertParams<UserField> {
    UpsertParams {
        find: QueryParams::new().filter(Condition::eq(UserField::Email, "a@example.com")),
        create: InsertParams::row(
            FieldMap::new()
                .set(UserField::Email, "a@example.com")
                .set(UserField::Name, "alice"),
        ),
        update: UpdateParams::new(
            FieldMap::new().set(UserField::Name, "alice"),
            vec![Condition::eq(UserField::Email, "a@example.com")],
        ),
    }
}

#[tokio::test]
async fn test_upsert_inserts_when_nothing_matches() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    manager.upsert("users", &upsert_params()).await.unwrap();

    assert_eq!(
        exec.kinds(),
        vec![Kind::Begin, Kind::Query, Kind::Execute, Kind::Commit]
    );
    assert_eq!(
        exec.statements(),
        vec![
            "SELECT * FROM users WHERE email = ?",
            "INSERT INTO users (email, name) VALUES (?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_upsert_updates_when_a_row_matches() {
    let exec = RecordingExecutor::new();
    exec.push_rows(vec![user_row(1, "old", 20)]);
    let manager = SqlManager::new(exec.clone());

    manager.upsert("users", &upsert_params()).await.unwrap();

    assert_eq!(
        exec.statements(),
        vec![
            "SELECT * FROM users WHERE email = ?",
            "UPDATE users SET name = ? WHERE email = ?",
        ]
    );
    assert!(
        exec.calls()
            .iter()
            .filter(|c| matches!(c.kind, Kind::Query | Kind::Execute))
            .all(|c| c.in_tx)
    );
}

#[tokio::test]
async fn test_upsert_validates_every_part_first() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    let mut params = upsert_params();
    params.update.r#where.clear();

    let err = manager.upsert("users", &params).await.unwrap_err();
    assert!(matches!(err, SqlError::MalformedPayload(_)));
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_replace_deletes_then_inserts() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());

    manager
        .replace(
            "users",
            &ReplaceParams {
                delete: DeleteParams::new(vec![Condition::eq(UserField::Id, 3)]),
                create: InsertParams::row(
                    FieldMap::new()
                        .set(UserField::Id, 3)
                        .set(UserField::Name, "carol"),
                ),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        exec.kinds(),
        vec![Kind::Begin, Kind::Execute, Kind::Execute, Kind::Commit]
    );
    assert_eq!(
        exec.statements(),
        vec![
            "DELETE FROM users WHERE id = ?",
            "INSERT INTO users (id, name) VALUES (?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_replace_rolls_back_when_insert_fails() {
    let exec = RecordingExecutor::new();
    exec.fail_execute_at(2);
    let manager = SqlManager::new(exec.clone());

    let err = manager
        .replace(
            "users",
            &ReplaceParams {
                delete: DeleteParams::new(vec![Condition::eq(UserField::Id, 3)]),
                create: InsertParams::row(FieldMap::new().set(UserField::Id, 3)),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SqlError::Other(_)));
    assert_eq!(
        exec.kinds(),
        vec![Kind::Begin, Kind::Execute, Kind::Execute, Kind::Rollback]
    );
}

#[tokio::test]
async fn test_execute_transaction_runs_units_in_order() {
    let exec = RecordingExecutor::new();
    let manager = SqlManager::new(exec.clone());
    let scoped = &manager;

    let ops = vec![
        unit_of_work(move |tx| async move {
            scoped
                .scoped(tx)
                .delete(
                    "sessions",
                    &DeleteParams::new(vec![Condition::eq(UserField::Id, 1)]),
                )
                .await?;
            Ok(())
        }),
        unit_of_work(|tx| async move {
            tx.execute_raw("UPDATE users SET age = age + 1", &[]).await?;
            Ok(())
        }),
    ];
    manager.execute_transaction(ops).await.unwrap();

    assert_eq!(
        exec.statements(),
        vec![
            "DELETE FROM sessions WHERE id = ?",
            "UPDATE users SET age = age + 1",
        ]
    );
    assert_eq!(exec.kinds().last(), Some(&Kind::Commit));
}

#[test]
fn test_manager_config_from_toml() {
    let config: ManagerConfig = toml::from_str(
        r#"
        default_batch_size = 250

        [defaults]
        limit = 25

        [validator]
        strict_lists = true
        "#,
    )
    .unwrap();

    assert_eq!(config.default_batch_size, 250);
    assert_eq!(config.defaults.limit, 25);
    assert_eq!(config.defaults.offset, 0);
    assert!(config.validator.strict_lists);

    let empty: ManagerConfig = toml::from_str("").unwrap();
    assert_eq!(empty, ManagerConfig::default());
}

#[tokio::test]
async fn test_configured_defaults_apply_to_built_statements() {
    let exec = RecordingExecutor::new();
    let config: ManagerConfig = toml::from_str("[defaults]\nlimit = 3\n").unwrap();
    let manager = SqlManager::with_config(exec.clone(), config);

    manager
        .select(
            "users",
            &QueryParams::<UserField>::new().paginate(Pagination::default()),
        )
        .await
        .unwrap();

    assert_eq!(exec.statements(), vec!["SELECT * FROM users LIMIT 3 OFFSET 0"]);
}
