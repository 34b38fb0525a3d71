//! Derive macros for dynsql
//!
//! Provides `#[derive(FieldSet)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod field_set;

/// Derive `FieldSet` for a unit-only enum of table columns.
///
/// # Example
///
/// ```ignore
/// use dynsql::FieldSet;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, FieldSet)]
/// enum UserField {
///     #[field(id)]
///     UserId,
///     Name,
///     #[field(rename = "created_at")]
///     Created,
/// }
///
/// assert_eq!(UserField::UserId.name(), "user_id");
/// assert_eq!(UserField::Created.name(), "created_at");
/// ```
///
/// # Attributes
///
/// - `#[field(rename = "name")]` - Use a different column name (default: snake_case variant name)
/// - `#[field(id)]` - Mark the primary key column (default: the column named `id`, if any)
///
/// Column names must match `[A-Za-z_][A-Za-z0-9_]*` and be unique; violations
/// are compile errors.
#[proc_macro_derive(FieldSet, attributes(field))]
pub fn derive_field_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    field_set::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
