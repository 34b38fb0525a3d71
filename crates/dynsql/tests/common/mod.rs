#![allow(dead_code)]

use async_trait::async_trait;
use dynsql::{Executor, FieldSet, Record, SqlError, SqlResult, TxHandle, UnitOfWork, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FieldSet)]
pub enum UserField {
    Id,
    Name,
    Age,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Query,
    Execute,
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: Kind,
    pub sql: String,
    pub values: Vec<Value>,
    pub in_tx: bool,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    rows: VecDeque<Vec<Record>>,
    fail_execute_at: Option<usize>,
    executes: usize,
}

/// Records every call; queries answer from a script, executes report one affected row.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<State>>,
    in_tx: bool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<Record>) {
        self.state.lock().unwrap().rows.push_back(rows);
    }

    /// Make the `n`-th execute call (1-based) fail.
    pub fn fail_execute_at(&self, n: usize) {
        self.state.lock().unwrap().fail_execute_at = Some(n);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn kinds(&self) -> Vec<Kind> {
        self.calls().into_iter().map(|c| c.kind).collect()
    }

    /// SQL text of every query/execute call, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.kind, Kind::Query | Kind::Execute))
            .map(|c| c.sql)
            .collect()
    }

    fn record(&self, kind: Kind, sql: &str, values: &[Value]) {
        self.state.lock().unwrap().calls.push(Call {
            kind,
            sql: sql.to_string(),
            values: values.to_vec(),
            in_tx: self.in_tx,
        });
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn query_raw(&self, query: &str, values: &[Value]) -> SqlResult<Vec<Record>> {
        self.record(Kind::Query, query, values);
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute_raw(&self, query: &str, values: &[Value]) -> SqlResult<u64> {
        self.record(Kind::Execute, query, values);
        let mut state = self.state.lock().unwrap();
        state.executes += 1;
        if state.fail_execute_at == Some(state.executes) {
            return Err(SqlError::Other(format!(
                "scripted failure on execute #{}",
                state.executes
            )));
        }
        Ok(1)
    }

    async fn execute_transaction<'a>(&self, operations: Vec<UnitOfWork<'a>>) -> SqlResult<()> {
        self.record(Kind::Begin, "", &[]);
        let handle: TxHandle = Arc::new(RecordingExecutor {
            state: Arc::clone(&self.state),
            in_tx: true,
        });
        for op in operations {
            if let Err(e) = op(Arc::clone(&handle)).await {
                self.record(Kind::Rollback, "", &[]);
                return Err(e);
            }
        }
        self.record(Kind::Commit, "", &[]);
        Ok(())
    }
}

pub fn user_row(id: i64, name: &str, age: i64) -> Record {
    Record::new()
        .with("id", id)
        .with("name", name)
        .with("age", age)
}
