//! Structured query and mutation descriptions.
//!
//! These are plain values: the validator checks them, the builder turns them
//! into SQL, and nothing holds on to them after a call returns.

use crate::error::{SqlError, SqlResult};
use crate::field::{FieldMap, FieldSet};
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Comparison operator for a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "BINARY")]
    Binary,
}

impl Operator {
    /// Every supported operator.
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Binary,
    ];

    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Binary => "BINARY",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_sql() == s)
            .ok_or_else(|| SqlError::InvalidOperator(s.to_string()))
    }
}

/// JOIN type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `field operator ?` conjunct of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition<F> {
    pub field: F,
    /// `None` builds as `=`.
    pub operator: Option<Operator>,
    pub value: Value,
}

impl<F: FieldSet> Condition<F> {
    pub fn new(field: F, operator: Option<Operator>, value: impl Into<Value>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    /// Build a condition from an operator string, rejecting unsupported operators.
    pub fn parse(field: F, operator: &str, value: impl Into<Value>) -> SqlResult<Self> {
        let operator = crate::validate::validate_operator(operator)?;
        Ok(Self::new(field, Some(operator), value))
    }

    /// Condition with the operator left to the build-time default.
    pub fn field(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, None, value)
    }

    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Eq), value)
    }

    pub fn ne(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Ne), value)
    }

    pub fn gt(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Gt), value)
    }

    pub fn lt(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Lt), value)
    }

    pub fn gte(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Gte), value)
    }

    pub fn lte(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Lte), value)
    }

    pub fn like(field: F, pattern: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Like), pattern)
    }

    pub fn not_like(field: F, pattern: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::NotLike), pattern)
    }

    pub fn in_list<T: Into<Value>>(field: F, values: Vec<T>) -> Self {
        Self::new(field, Some(Operator::In), values)
    }

    pub fn not_in<T: Into<Value>>(field: F, values: Vec<T>) -> Self {
        Self::new(field, Some(Operator::NotIn), values)
    }

    pub fn binary(field: F, value: impl Into<Value>) -> Self {
        Self::new(field, Some(Operator::Binary), value)
    }
}

/// A JOIN clause: `TYPE JOIN table ON on`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub table: String,
    pub on: String,
    /// `None` builds as `INNER`.
    pub kind: Option<JoinKind>,
}

impl JoinSpec {
    pub fn new(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: on.into(),
            kind: None,
        }
    }

    pub fn inner(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self::new(table, on).kind(JoinKind::Inner)
    }

    pub fn left(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self::new(table, on).kind(JoinKind::Left)
    }

    pub fn right(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self::new(table, on).kind(JoinKind::Right)
    }

    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec<F> {
    pub field: F,
    /// `None` builds as `ASC`.
    pub direction: Option<Direction>,
}

impl<F: FieldSet> OrderSpec<F> {
    pub fn new(field: F) -> Self {
        Self {
            field,
            direction: None,
        }
    }

    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: Some(Direction::Asc),
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: Some(Direction::Desc),
        }
    }
}

/// LIMIT / OFFSET.
///
/// `limit: None` builds as the default limit (10); `Some(-1)` drops the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Sentinel limit meaning "no LIMIT/OFFSET clause".
    pub const UNLIMITED: i64 = -1;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn limit(limit: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    pub fn unlimited() -> Self {
        Self::limit(Self::UNLIMITED)
    }
}

/// A SELECT description.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams<F> {
    pub select: Option<Vec<F>>,
    pub r#where: Option<Vec<Condition<F>>>,
    pub join: Option<Vec<JoinSpec>>,
    pub group_by: Option<Vec<F>>,
    pub order_by: Option<Vec<OrderSpec<F>>>,
    pub pagination: Option<Pagination>,
}

impl<F> Default for QueryParams<F> {
    fn default() -> Self {
        Self {
            select: None,
            r#where: None,
            join: None,
            group_by: None,
            order_by: None,
            pagination: None,
        }
    }
}

impl<F: FieldSet> QueryParams<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.select = Some(fields.into_iter().collect());
        self
    }

    /// Append a WHERE condition.
    pub fn filter(mut self, condition: Condition<F>) -> Self {
        self.r#where.get_or_insert_with(Vec::new).push(condition);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.join.get_or_insert_with(Vec::new).push(join);
        self
    }

    pub fn group_by(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.group_by = Some(fields.into_iter().collect());
        self
    }

    pub fn order_by(mut self, order: OrderSpec<F>) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(order);
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// A COUNT description.
#[derive(Debug, Clone, PartialEq)]
pub struct CountParams<F> {
    /// Counted column; `None` counts `*`.
    pub select: Option<F>,
    pub r#where: Option<Vec<Condition<F>>>,
    pub join: Option<Vec<JoinSpec>>,
}

impl<F> Default for CountParams<F> {
    fn default() -> Self {
        Self {
            select: None,
            r#where: None,
            join: None,
        }
    }
}

impl<F: FieldSet> CountParams<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, field: F) -> Self {
        self.select = Some(field);
        self
    }

    pub fn filter(mut self, condition: Condition<F>) -> Self {
        self.r#where.get_or_insert_with(Vec::new).push(condition);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.join.get_or_insert_with(Vec::new).push(join);
        self
    }
}

/// A SELECT without pagination, used by `find_all`.
#[derive(Debug, Clone, PartialEq)]
pub struct FindAllParams<F> {
    pub select: Option<Vec<F>>,
    pub r#where: Option<Vec<Condition<F>>>,
    pub join: Option<Vec<JoinSpec>>,
    pub group_by: Option<Vec<F>>,
    pub order_by: Option<Vec<OrderSpec<F>>>,
}

impl<F> Default for FindAllParams<F> {
    fn default() -> Self {
        Self {
            select: None,
            r#where: None,
            join: None,
            group_by: None,
            order_by: None,
        }
    }
}

impl<F> From<FindAllParams<F>> for QueryParams<F> {
    fn from(p: FindAllParams<F>) -> Self {
        Self {
            select: p.select,
            r#where: p.r#where,
            join: p.join,
            group_by: p.group_by,
            order_by: p.order_by,
            pagination: None,
        }
    }
}

/// INSERT payload: one or more rows sharing the first row's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertParams<F> {
    pub data: Vec<FieldMap<F>>,
}

impl<F: FieldSet> InsertParams<F> {
    pub fn new(data: Vec<FieldMap<F>>) -> Self {
        Self { data }
    }

    pub fn row(row: FieldMap<F>) -> Self {
        Self { data: vec![row] }
    }
}

/// UPDATE payload: SET data plus a mandatory WHERE.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParams<F> {
    pub data: FieldMap<F>,
    pub r#where: Vec<Condition<F>>,
}

impl<F: FieldSet> UpdateParams<F> {
    pub fn new(data: FieldMap<F>, r#where: Vec<Condition<F>>) -> Self {
        Self { data, r#where }
    }
}

/// DELETE payload: a mandatory WHERE.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteParams<F> {
    pub r#where: Vec<Condition<F>>,
}

impl<F: FieldSet> DeleteParams<F> {
    pub fn new(r#where: Vec<Condition<F>>) -> Self {
        Self { r#where }
    }
}

/// Chunked INSERT payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInsertParams<F> {
    pub data: Vec<FieldMap<F>>,
    /// Rows per INSERT statement; `None` uses the manager's default (1000).
    pub batch_size: Option<usize>,
}

impl<F: FieldSet> BatchInsertParams<F> {
    pub fn new(data: Vec<FieldMap<F>>) -> Self {
        Self {
            data,
            batch_size: None,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }
}

/// Read-then-write in one transaction: update when `find` matches, insert otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertParams<F> {
    pub find: QueryParams<F>,
    pub create: InsertParams<F>,
    pub update: UpdateParams<F>,
}

/// Delete-then-insert in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceParams<F> {
    pub delete: DeleteParams<F>,
    pub create: InsertParams<F>,
}

/// Outcome of a single write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub affected_rows: u64,
}

/// A chunk of a `batch_insert` that failed, with the rows it carried.
#[derive(Debug)]
pub struct BatchError<F> {
    pub data: Vec<FieldMap<F>>,
    pub error: SqlError,
}

/// One entry per failed chunk, in chunk order. Empty when every chunk succeeded.
pub type BatchExecutionErrorResult<F> = Vec<BatchError<F>>;
