//! Clause fragments shared by SELECT, COUNT, UPDATE and DELETE.
//!
//! Each function returns the complete fragment including its keyword, or an
//! empty string when the clause is absent. Literal values are pushed onto
//! `values` in the order their `?` placeholders appear.

use super::defaults::BuildDefaults;
use crate::field::FieldSet;
use crate::params::{Condition, JoinSpec, OrderSpec, Pagination};
use crate::value::Value;

fn field_list<F: FieldSet>(fields: &[F]) -> String {
    fields
        .iter()
        .map(FieldSet::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn select_list<F: FieldSet>(fields: Option<&[F]>) -> String {
    match fields {
        Some(fields) if !fields.is_empty() => field_list(fields),
        _ => "*".to_string(),
    }
}

pub(crate) fn joins(joins: Option<&[JoinSpec]>, defaults: &BuildDefaults) -> String {
    joins
        .unwrap_or_default()
        .iter()
        .map(|join| {
            format!(
                "{} JOIN {} ON {}",
                defaults.resolve_join_kind(join.kind).as_sql(),
                join.table,
                join.on
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn where_clause<F: FieldSet>(
    conditions: Option<&[Condition<F>]>,
    defaults: &BuildDefaults,
    values: &mut Vec<Value>,
) -> String {
    let conditions = conditions.unwrap_or_default();
    if conditions.is_empty() {
        return String::new();
    }
    let conjuncts: Vec<String> = conditions
        .iter()
        .map(|c| {
            values.push(c.value.clone());
            format!(
                "{} {} ?",
                c.field.name(),
                defaults.resolve_operator(c.operator).as_sql()
            )
        })
        .collect();
    format!("WHERE {}", conjuncts.join(" AND "))
}

pub(crate) fn group_by<F: FieldSet>(fields: Option<&[F]>) -> String {
    match fields {
        Some(fields) if !fields.is_empty() => format!("GROUP BY {}", field_list(fields)),
        _ => String::new(),
    }
}

pub(crate) fn order_by<F: FieldSet>(
    order: Option<&[OrderSpec<F>]>,
    defaults: &BuildDefaults,
) -> String {
    let order = order.unwrap_or_default();
    if order.is_empty() {
        return String::new();
    }
    let terms: Vec<String> = order
        .iter()
        .map(|o| {
            format!(
                "{} {}",
                o.field.name(),
                defaults.resolve_direction(o.direction).as_sql()
            )
        })
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}

pub(crate) fn pagination(pagination: Option<&Pagination>, defaults: &BuildDefaults) -> String {
    pagination
        .and_then(|p| defaults.resolve_pagination(p))
        .map(|(limit, offset)| format!("LIMIT {limit} OFFSET {offset}"))
        .unwrap_or_default()
}

/// Join non-empty fragments with single spaces.
pub(crate) fn assemble<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}
