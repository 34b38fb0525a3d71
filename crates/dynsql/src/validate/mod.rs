//! Identifier, operator and literal safety checks.
//!
//! Table and column names are written straight into SQL text, so they must
//! match `[A-Za-z_][A-Za-z0-9_]*`. Literals are always bound, but text values
//! carrying quote or statement-separator characters are still rejected.
//!
//! Every check fails fast: the first violation is returned and nothing after
//! it is inspected.

mod leaf;


pub use leaf::{
    validate_field, validate_fields, validate_join_on, validate_operator, validate_table_name,
    validate_value, validate_values,
};

use crate::error::{SqlError, SqlResult};
use crate::field::{FieldMap, FieldSet};
use crate::params::{
    BatchInsertParams, Condition, CountParams, DeleteParams, InsertParams, JoinSpec, OrderSpec,
    Pagination, QueryParams, UpdateParams,
};
use crate::value::Value;
use serde::Deserialize;

/// Validator configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Also check each element of list literals (`IN` / `NOT IN` operands).
    ///
    /// Off by default: list literals pass unchecked.
    pub strict_lists: bool,
}

/// Approves or rejects a statement description before it is built.
pub trait StatementValidator: Send + Sync {
    fn validate_table_name(&self, table: &str) -> SqlResult<()>;

    fn validate_select<F: FieldSet>(&self, params: &QueryParams<F>) -> SqlResult<()>;

    fn validate_count<F: FieldSet>(&self, params: &CountParams<F>) -> SqlResult<()>;

    fn validate_insert<F: FieldSet>(&self, params: &InsertParams<F>) -> SqlResult<()>;

    fn validate_update<F: FieldSet>(&self, params: &UpdateParams<F>) -> SqlResult<()>;

    fn validate_delete<F: FieldSet>(&self, params: &DeleteParams<F>) -> SqlResult<()>;

    fn validate_batch_insert<F: FieldSet>(&self, params: &BatchInsertParams<F>) -> SqlResult<()>;
}

/// The default [`StatementValidator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlValidator {
    config: ValidatorConfig,
}

impl SqlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Recursively check list literal elements.
    pub fn strict_lists(mut self) -> Self {
        self.config.strict_lists = true;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    fn check_value(&self, value: &Value) -> SqlResult<()> {
        match value {
            Value::List(items) if self.config.strict_lists => {
                items.iter().try_for_each(|item| self.check_value(item))
            }
            other => validate_value(other),
        }
    }

    fn check_field<F: FieldSet>(&self, field: &F) -> SqlResult<()> {
        validate_field(field.name())
    }

    fn check_fields<F: FieldSet>(&self, fields: &[F]) -> SqlResult<()> {
        fields.iter().try_for_each(|f| self.check_field(f))
    }

    fn check_conditions<F: FieldSet>(&self, conditions: &[Condition<F>]) -> SqlResult<()> {
        for condition in conditions {
            self.check_field(&condition.field)?;
            if let Some(op) = condition.operator {
                validate_operator(op.as_sql())?;
            }
            self.check_value(&condition.value)?;
        }
        Ok(())
    }

    fn check_joins(&self, joins: &[JoinSpec]) -> SqlResult<()> {
        for join in joins {
            validate_table_name(&join.table)?;
            validate_join_on(&join.on)?;
        }
        Ok(())
    }

    fn check_order_by<F: FieldSet>(&self, order_by: &[OrderSpec<F>]) -> SqlResult<()> {
        order_by.iter().try_for_each(|o| self.check_field(&o.field))
    }

    fn check_pagination(&self, pagination: &Pagination) -> SqlResult<()> {
        if let Some(limit) = pagination.limit {
            if limit != Pagination::UNLIMITED && limit <= 0 {
                return Err(SqlError::malformed(format!(
                    "Invalid pagination limit: {limit}"
                )));
            }
        }
        if let Some(offset) = pagination.offset {
            if offset < 0 {
                return Err(SqlError::malformed(format!(
                    "Invalid pagination offset: {offset}"
                )));
            }
        }
        Ok(())
    }

    fn check_row<F: FieldSet>(&self, row: &FieldMap<F>) -> SqlResult<()> {
        for (field, value) in row.iter() {
            self.check_field(&field)?;
            self.check_value(value)?;
        }
        Ok(())
    }

    fn check_rows<F: FieldSet>(&self, rows: &[FieldMap<F>], what: &str) -> SqlResult<()> {
        let Some(first) = rows.first() else {
            return Err(SqlError::malformed(format!("Invalid data for {what}: no rows")));
        };
        if first.is_empty() {
            return Err(SqlError::malformed(format!(
                "Invalid data for {what}: row 0 has no fields"
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if !row.same_fields(first) {
                return Err(SqlError::malformed(format!(
                    "Invalid data for {what}: row {i} does not have the same fields as row 0"
                )));
            }
            self.check_row(row)?;
        }
        Ok(())
    }
}

impl StatementValidator for SqlValidator {
    fn validate_table_name(&self, table: &str) -> SqlResult<()> {
        validate_table_name(table)
    }

    fn validate_select<F: FieldSet>(&self, params: &QueryParams<F>) -> SqlResult<()> {
        if let Some(select) = &params.select {
            self.check_fields(select)?;
        }
        if let Some(conditions) = &params.r#where {
            self.check_conditions(conditions)?;
        }
        if let Some(pagination) = &params.pagination {
            self.check_pagination(pagination)?;
        }
        if let Some(joins) = &params.join {
            self.check_joins(joins)?;
        }
        if let Some(order_by) = &params.order_by {
            self.check_order_by(order_by)?;
        }
        if let Some(group_by) = &params.group_by {
            self.check_fields(group_by)?;
        }
        Ok(())
    }

    fn validate_count<F: FieldSet>(&self, params: &CountParams<F>) -> SqlResult<()> {
        if let Some(field) = &params.select {
            self.check_field(field)?;
        }
        if let Some(conditions) = &params.r#where {
            self.check_conditions(conditions)?;
        }
        if let Some(joins) = &params.join {
            self.check_joins(joins)?;
        }
        Ok(())
    }

    fn validate_insert<F: FieldSet>(&self, params: &InsertParams<F>) -> SqlResult<()> {
        self.check_rows(&params.data, "InsertParams")
    }

    fn validate_update<F: FieldSet>(&self, params: &UpdateParams<F>) -> SqlResult<()> {
        if params.data.is_empty() {
            return Err(SqlError::malformed("Invalid data for UpdateParams: no fields"));
        }
        self.check_row(&params.data)?;
        if params.r#where.is_empty() {
            return Err(SqlError::malformed("Invalid where for UpdateParams"));
        }
        self.check_conditions(&params.r#where)
    }

    fn validate_delete<F: FieldSet>(&self, params: &DeleteParams<F>) -> SqlResult<()> {
        if params.r#where.is_empty() {
            return Err(SqlError::malformed("Invalid where for DeleteParams"));
        }
        self.check_conditions(&params.r#where)
    }

    fn validate_batch_insert<F: FieldSet>(&self, params: &BatchInsertParams<F>) -> SqlResult<()> {
        if params.batch_size == Some(0) {
            return Err(SqlError::malformed("Invalid batch size: 0"));
        }
        self.check_rows(&params.data, "BatchInsertParams")
    }
}
