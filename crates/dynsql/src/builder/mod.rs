//! SQL text generation from validated descriptions.
//!
//! Builders never re-validate; pass descriptions through a
//! [`StatementValidator`](crate::validate::StatementValidator) first.
//! Literal values are never interpolated: each appears as a `?` placeholder
//! and is returned in [`BuiltQuery::values`] in placeholder order.
//!
//! Clauses are emitted in a fixed order and joined with single spaces:
//!
//! ```text
//! SELECT <fields|*> FROM <table> [JOIN...] [WHERE...] [GROUP BY...] [ORDER BY...] [LIMIT n OFFSET m]
//! ```

mod clause;
mod defaults;


pub use defaults::BuildDefaults;

use crate::field::FieldSet;
use crate::params::{CountParams, DeleteParams, InsertParams, QueryParams, UpdateParams};
use crate::value::Value;
use std::fmt;

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub query: String,
    pub values: Vec<Value>,
}

impl BuiltQuery {
    pub fn new(query: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            values,
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.query.matches('?').count()
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

/// Turns statement descriptions into SQL text plus ordered bind values.
pub trait StatementBuilder: Send + Sync {
    fn build_select_query<F: FieldSet>(&self, table: &str, params: &QueryParams<F>) -> BuiltQuery;

    fn build_count_query<F: FieldSet>(&self, table: &str, params: &CountParams<F>) -> BuiltQuery;

    fn build_insert_query<F: FieldSet>(&self, table: &str, params: &InsertParams<F>)
    -> BuiltQuery;

    fn build_update_query<F: FieldSet>(&self, table: &str, params: &UpdateParams<F>)
    -> BuiltQuery;

    fn build_delete_query<F: FieldSet>(&self, table: &str, params: &DeleteParams<F>)
    -> BuiltQuery;
}

/// The default [`StatementBuilder`].
///
/// Output depends only on the inputs and the configured [`BuildDefaults`], so
/// building the same description twice yields identical results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlBuilder {
    defaults: BuildDefaults,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: BuildDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &BuildDefaults {
        &self.defaults
    }
}

impl StatementBuilder for SqlBuilder {
    fn build_select_query<F: FieldSet>(&self, table: &str, params: &QueryParams<F>) -> BuiltQuery {
        let mut values = Vec::new();
        let query = clause::assemble([
            format!(
                "SELECT {} FROM {table}",
                clause::select_list(params.select.as_deref())
            ),
            clause::joins(params.join.as_deref(), &self.defaults),
            clause::where_clause(params.r#where.as_deref(), &self.defaults, &mut values),
            clause::group_by(params.group_by.as_deref()),
            clause::order_by(params.order_by.as_deref(), &self.defaults),
            clause::pagination(params.pagination.as_ref(), &self.defaults),
        ]);
        BuiltQuery::new(query, values)
    }

    fn build_count_query<F: FieldSet>(&self, table: &str, params: &CountParams<F>) -> BuiltQuery {
        let mut values = Vec::new();
        let counted = params.select.as_ref().map_or("*", FieldSet::name);
        let query = clause::assemble([
            format!("SELECT COUNT({counted}) FROM {table}"),
            clause::joins(params.join.as_deref(), &self.defaults),
            clause::where_clause(params.r#where.as_deref(), &self.defaults, &mut values),
        ]);
        BuiltQuery::new(query, values)
    }

    fn build_insert_query<F: FieldSet>(
        &self,
        table: &str,
        params: &InsertParams<F>,
    ) -> BuiltQuery {
        let columns: Vec<F> = params
            .data
            .first()
            .map(|row| row.keys().collect())
            .unwrap_or_default();

        let mut values = Vec::with_capacity(columns.len() * params.data.len());
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
        let mut tuples = Vec::with_capacity(params.data.len());
        for row in &params.data {
            // Column order follows the first row; later rows are read by field.
            for column in &columns {
                values.push(row.get(column).cloned().unwrap_or(Value::Null));
            }
            tuples.push(tuple.as_str());
        }

        let column_list = columns
            .iter()
            .map(FieldSet::name)
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "INSERT INTO {table} ({column_list}) VALUES {}",
            tuples.join(", ")
        );
        BuiltQuery::new(query, values)
    }

    fn build_update_query<F: FieldSet>(
        &self,
        table: &str,
        params: &UpdateParams<F>,
    ) -> BuiltQuery {
        let mut values = Vec::with_capacity(params.data.len() + params.r#where.len());
        let assignments: Vec<String> = params
            .data
            .iter()
            .map(|(field, value)| {
                values.push(value.clone());
                format!("{} = ?", field.name())
            })
            .collect();
        let query = clause::assemble([
            format!("UPDATE {table} SET {}", assignments.join(", ")),
            clause::where_clause(Some(params.r#where.as_slice()), &self.defaults, &mut values),
        ]);
        BuiltQuery::new(query, values)
    }

    fn build_delete_query<F: FieldSet>(
        &self,
        table: &str,
        params: &DeleteParams<F>,
    ) -> BuiltQuery {
        let mut values = Vec::with_capacity(params.r#where.len());
        let query = clause::assemble([
            format!("DELETE FROM {table}"),
            clause::where_clause(Some(params.r#where.as_slice()), &self.defaults, &mut values),
        ]);
        BuiltQuery::new(query, values)
    }
}
