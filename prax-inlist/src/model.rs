//! Model metadata and typed column selectors.
//!
//! A [`Column`] is the property selector handed to the membership filters: it
//! names one column of a model and carries the Rust type of its values, so
//! `where_in(user::ID, ["a"])` does not compile when `ID` holds integers.
//!
//! ```rust
//! use prax_inlist::{Column, Model};
//!
//! struct User;
//!
//! impl Model for User {
//!     const MODEL_NAME: &'static str = "User";
//!     const TABLE_NAME: &'static str = "users";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!     const COLUMNS: &'static [&'static str] = &["id", "email"];
//! }
//!
//! mod user {
//!     use super::*;
//!     pub const ID: Column<User, i64> = Column::new("id");
//!     pub const EMAIL: Column<User, String> = Column::new("email");
//! }
//!
//! fn main() {
//!     assert_eq!(user::ID.name(), "id");
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::filter::{Filter, FilterValue};

/// Table metadata for a queryable model.
pub trait Model {
    /// The model name as written in the schema.
    const MODEL_NAME: &'static str;
    /// The table the model maps to.
    const TABLE_NAME: &'static str;
    /// Primary key columns.
    const PRIMARY_KEY: &'static [&'static str];
    /// All columns, in declaration order.
    const COLUMNS: &'static [&'static str];
}

/// A typed handle to one column of model `M` holding values of type `T`.
pub struct Column<M, T> {
    name: &'static str,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Column<M, T> {
    /// Create a column handle.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The column name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this handle names a column at all.
    pub const fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }
}

impl<M, T: Into<FilterValue>> Column<M, T> {
    /// `column = value`
    pub fn equals(&self, value: T) -> Filter {
        Filter::Equals(self.name.to_string(), value.into())
    }

    /// `column > value`
    pub fn gt(&self, value: T) -> Filter {
        Filter::Gt(self.name.to_string(), value.into())
    }

    /// `column < value`
    pub fn lt(&self, value: T) -> Filter {
        Filter::Lt(self.name.to_string(), value.into())
    }

    /// `column IS NULL`
    pub fn is_null(&self) -> Filter {
        Filter::IsNull(self.name.to_string())
    }

    /// Membership through the default JSON-expanded translation.
    pub fn in_json(&self, values: impl IntoIterator<Item = T>) -> Filter {
        Filter::In(self.name.to_string(), values.into_iter().map(Into::into).collect())
    }
}

// Manual impls: derives would demand `M: Clone` and `T: Clone`.
impl<M, T> Clone for Column<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Column<M, T> {}

impl<M, T> PartialEq for Column<M, T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<M, T> Eq for Column<M, T> {}

impl<M, T> fmt::Debug for Column<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.name).finish()
    }
}

impl<M, T> fmt::Display for Column<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post;

    impl Model for Post {
        const MODEL_NAME: &'static str = "Post";
        const TABLE_NAME: &'static str = "posts";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const COLUMNS: &'static [&'static str] = &["id", "title"];
    }

    const ID: Column<Post, i32> = Column::new("id");
    const TITLE: Column<Post, String> = Column::new("title");

    #[test]
    fn test_column_is_copy_without_model_bounds() {
        let a = ID;
        let b = a;
        assert_eq!(a, b);
        assert_eq!(format!("{:?}", TITLE), "Column(\"title\")");
        assert!(!ID.is_unnamed());
        assert!(Column::<Post, i32>::new("").is_unnamed());
    }

    #[test]
    fn test_column_comparisons() {
        assert_eq!(ID.equals(5), Filter::Equals("id".into(), FilterValue::Int(5)));
        assert_eq!(TITLE.is_null(), Filter::IsNull("title".into()));
        assert!(matches!(ID.in_json([1, 2]), Filter::In(_, v) if v.len() == 2));
    }
}
