use crate::error::{SqlError, SqlResult};
use crate::params::Operator;
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Command keywords a table may not be named after (compared case-insensitively).
const RESERVED_TABLE_NAMES: [&str; 4] = ["SELECT", "INSERT", "UPDATE", "DELETE"];

/// Comparison tokens allowed between identifiers in a JOIN `ON` clause.
const JOIN_ON_OPERATORS: [&str; 7] = ["=", "<>", "!=", ">", "<", ">=", "<="];

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid built-in identifier regex")
    })
}

fn safe_text_regex() -> &'static Regex {
    static VALUE_RE: OnceLock<Regex> = OnceLock::new();
    VALUE_RE.get_or_init(|| Regex::new(r#"^[^'";]*$"#).expect("invalid built-in value regex"))
}

fn is_valid_name(name: &str) -> bool {
    name_regex().is_match(name)
}

/// Reject a column name that is not a plain SQL identifier.
pub fn validate_field(name: &str) -> SqlResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(SqlError::invalid_identifier(name))
    }
}

pub fn validate_fields<S: AsRef<str>>(names: &[S]) -> SqlResult<()> {
    names.iter().try_for_each(|n| validate_field(n.as_ref()))
}

/// Reject a malformed table name or one that collides with a command keyword.
pub fn validate_table_name(name: &str) -> SqlResult<()> {
    let upper = name.to_ascii_uppercase();
    if !is_valid_name(name) || RESERVED_TABLE_NAMES.contains(&upper.as_str()) {
        return Err(SqlError::ReservedOrInvalidTable(name.to_string()));
    }
    Ok(())
}

/// Parse an operator string, rejecting anything outside the supported set.
pub fn validate_operator(op: &str) -> SqlResult<Operator> {
    op.parse()
}

/// Reject text literals containing `'`, `"` or `;`.
///
/// Numbers, booleans, null, timestamps and lists always pass.
pub fn validate_value(value: &Value) -> SqlResult<()> {
    match value {
        Value::Text(s) if !safe_text_regex().is_match(s) => {
            Err(SqlError::UnsafeLiteral(s.clone()))
        }
        _ => Ok(()),
    }
}

pub fn validate_values(values: &[Value]) -> SqlResult<()> {
    values.iter().try_for_each(validate_value)
}

/// Check the tokens of a JOIN `ON` clause.
///
/// Accepted tokens: dotted identifiers (`users.id`), comparison operators and
/// `AND` / `OR`.
pub fn validate_join_on(on: &str) -> SqlResult<()> {
    let mut tokens = on.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return Err(SqlError::invalid_identifier(on));
    }
    for token in tokens {
        if JOIN_ON_OPERATORS.contains(&token)
            || token.eq_ignore_ascii_case("AND")
            || token.eq_ignore_ascii_case("OR")
        {
            continue;
        }
        if !token.split('.').all(is_valid_name) {
            return Err(SqlError::invalid_identifier(token));
        }
    }
    Ok(())
}
