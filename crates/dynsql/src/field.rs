//! Closed column sets and row maps over them.
//!
//! A [`FieldSet`] is usually an enum with one unit variant per column, derived
//! with `#[derive(FieldSet)]`:
//!
//! ```ignore
//! use dynsql::FieldSet;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, FieldSet)]
//! enum UserField {
//!     #[field(id)]
//!     Id,
//!     Name,
//!     #[field(rename = "created_at")]
//!     Created,
//! }
//! ```

use crate::value::Value;
use std::fmt::Debug;

/// The enumerated, closed set of valid column names for one table.
pub trait FieldSet: Copy + Eq + Debug + Send + Sync + 'static {
    /// Column name as written into SQL text.
    fn name(&self) -> &'static str;

    /// Every member of the set, in declaration order.
    fn all() -> &'static [Self];

    /// Resolve a column name back to its member.
    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.name() == name)
    }

    /// The primary key column used by `find_by_id`.
    ///
    /// Defaults to the member named `id`.
    fn primary_key() -> Option<Self> {
        Self::from_name("id")
    }
}

/// An insertion-ordered `field -> value` map used for INSERT rows and UPDATE SET data.
///
/// Setting a field that is already present replaces its value in place, so the
/// column order is the order in which fields were first set.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap<F> {
    entries: Vec<(F, Value)>,
}

impl<F> Default for FieldMap<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: FieldSet> FieldMap<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value (builder style).
    pub fn set(mut self, field: F, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field value in place.
    pub fn insert(&mut self, field: F, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &F) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, field: &F) -> bool {
        self.get(field).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = F> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &Value)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both maps hold exactly the same set of fields (order-insensitive).
    pub fn same_fields(&self, other: &Self) -> bool {
        self.len() == other.len() && self.keys().all(|f| other.contains(&f))
    }
}

impl<F: FieldSet, V: Into<Value>> FromIterator<(F, V)> for FieldMap<F> {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

#[cfg(test)]
pub(crate) mod test_fields {
    use super::FieldSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Col {
        Id,
        Name,
        Age,
        Bad,
    }

    impl FieldSet for Col {
        fn name(&self) -> &'static str {
            match self {
                Col::Id => "id",
                Col::Name => "name",
                Col::Age => "age",
                Col::Bad => "id; DROP TABLE users",
            }
        }

        fn all() -> &'static [Self] {
            &[Col::Id, Col::Name, Col::Age, Col::Bad]
        }
    }
}
