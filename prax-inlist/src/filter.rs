//! Filter types for building WHERE clauses.
//!
//! ```rust
//! use prax_inlist::{DatabaseType, Filter, FilterValue};
//!
//! let filter = Filter::and([
//!     Filter::Equals("active".into(), FilterValue::Bool(true)),
//!     Filter::InList("id".into(), vec![1.into(), 2.into()]),
//! ]);
//!
//! let (sql, params) = filter.to_sql(DatabaseType::PostgreSQL);
//! assert_eq!(sql, "(active = $1 AND id IN (1, 2))");
//! assert_eq!(params.len(), 1);
//! ```

use serde::Serialize;

use crate::sql::{DatabaseType, SqlBuilder};

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value renders as SQL `NULL` (null or a non-finite float).
    pub fn renders_as_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    /// Convert to a JSON value, as bound by the JSON-expanded `IN` translation.
    ///
    /// Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(v: $ty) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for FilterValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<char> for FilterValue {
    fn from(v: char) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A complete filter that can be converted to SQL.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No condition.
    ///
    /// Combinators treat it as absent: [`and`](Self::and) and [`or`](Self::or)
    /// drop it, and [`not`](Self::not) of it is still `None`. Rendered on its
    /// own it is `1 = 1`.
    #[default]
    None,
    /// Always false; renders as `0 = 1`.
    False,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Less than comparison.
    Lt(String, FilterValue),
    /// Less than or equal comparison.
    Lte(String, FilterValue),
    /// Greater than comparison.
    Gt(String, FilterValue),
    /// Greater than or equal comparison.
    Gte(String, FilterValue),

    /// In a list of values, bound as a single JSON parameter and expanded
    /// server-side.
    In(String, Vec<FilterValue>),
    /// Not in a list of values, bound as a single JSON parameter.
    NotIn(String, Vec<FilterValue>),

    /// In a literal, inline list of values.
    InList(String, Vec<FilterValue>),
    /// Not in a literal, inline list of values.
    NotInList(String, Vec<FilterValue>),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create an AND filter. Empty filters are dropped.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.swap_remove(0),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter. Empty filters are dropped.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.swap_remove(0),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter. Negating no condition is still no condition.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Generate SQL for this filter. Returns (sql, params) where params are
    /// the values to bind, in placeholder order.
    pub fn to_sql(&self, db: DatabaseType) -> (String, Vec<FilterValue>) {
        let mut builder = SqlBuilder::new(db);
        self.write_sql(&mut builder);
        builder.build()
    }

    /// Append this filter's SQL to `builder`, binding parameters as needed.
    pub fn write_sql(&self, builder: &mut SqlBuilder) {
        let db = builder.database();
        match self {
            Self::None => {
                builder.push(db.true_condition());
            }
            Self::False => {
                builder.push(db.false_condition());
            }

            Self::Equals(col, val) if val.is_null() => {
                builder.push_identifier(col).push(" IS NULL");
            }
            Self::NotEquals(col, val) if val.is_null() => {
                builder.push_identifier(col).push(" IS NOT NULL");
            }
            Self::Equals(col, val) => comparison(builder, col, "=", val),
            Self::NotEquals(col, val) => comparison(builder, col, "<>", val),
            Self::Lt(col, val) => comparison(builder, col, "<", val),
            Self::Lte(col, val) => comparison(builder, col, "<=", val),
            Self::Gt(col, val) => comparison(builder, col, ">", val),
            Self::Gte(col, val) => comparison(builder, col, ">=", val),

            Self::In(_, values) if values.is_empty() => {
                builder.push(db.false_condition());
            }
            Self::NotIn(_, values) if values.is_empty() => {
                builder.push(db.true_condition());
            }
            Self::In(col, values) => json_membership(builder, col, "IN", values),
            Self::NotIn(col, values) => json_membership(builder, col, "NOT IN", values),

            Self::InList(_, values) if values.is_empty() => {
                builder.push(db.false_condition());
            }
            Self::NotInList(_, values) if values.is_empty() => {
                builder.push(db.true_condition());
            }
            Self::InList(col, values) => literal_membership(builder, col, "IN", values),
            Self::NotInList(col, values) => literal_membership(builder, col, "NOT IN", values),

            Self::IsNull(col) => {
                builder.push_identifier(col).push(" IS NULL");
            }
            Self::IsNotNull(col) => {
                builder.push_identifier(col).push(" IS NOT NULL");
            }

            Self::And(filters) if filters.is_empty() => {
                builder.push(db.true_condition());
            }
            Self::Or(filters) if filters.is_empty() => {
                builder.push(db.false_condition());
            }
            Self::And(filters) => junction(builder, filters, " AND "),
            Self::Or(filters) => junction(builder, filters, " OR "),
            Self::Not(filter) => {
                builder.push("NOT (");
                filter.write_sql(builder);
                builder.push(")");
            }
        }
    }
}

fn comparison(builder: &mut SqlBuilder, col: &str, op: &str, val: &FilterValue) {
    builder
        .push_identifier(col)
        .push(" ")
        .push(op)
        .push(" ")
        .push_param(val.clone());
}

fn literal_membership(builder: &mut SqlBuilder, col: &str, op: &str, values: &[FilterValue]) {
    builder.push_identifier(col).push(" ").push(op).push(" (");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push_literal(value);
    }
    builder.push(")");
}

fn json_membership(builder: &mut SqlBuilder, col: &str, op: &str, values: &[FilterValue]) {
    let json = FilterValue::Json(serde_json::Value::Array(
        values.iter().map(FilterValue::to_json).collect(),
    ));

    match builder.database() {
        DatabaseType::SQLite => {
            builder
                .push_identifier(col)
                .push(" ")
                .push(op)
                .push(" (SELECT value FROM json_each(")
                .push_param(json)
                .push("))");
        }
        DatabaseType::PostgreSQL => {
            builder
                .push_identifier(col)
                .push("::text ")
                .push(op)
                .push(" (SELECT json_array_elements_text(")
                .push_param(json)
                .push("::json))");
        }
        DatabaseType::MySQL => {
            builder
                .push_identifier(col)
                .push(" ")
                .push(op)
                .push(" (SELECT j.value FROM JSON_TABLE(")
                .push_param(json)
                .push(", '$[*]' COLUMNS (value JSON PATH '$')) AS j)");
        }
        DatabaseType::MSSQL => {
            builder
                .push_identifier(col)
                .push(" ")
                .push(op)
                .push(" (SELECT value FROM OPENJSON(")
                .push_param(json)
                .push("))");
        }
    }
}

fn junction(builder: &mut SqlBuilder, filters: &[Filter], sep: &str) {
    builder.push("(");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            builder.push(sep);
        }
        filter.write_sql(builder);
    }
    builder.push(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(FilterValue::from(7u8), FilterValue::Int(7));
        assert_eq!(FilterValue::from("hello"), FilterValue::String("hello".to_string()));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i32>), FilterValue::Null);
    }

    #[test]
    fn test_filter_and_or() {
        let combined = Filter::and([
            Filter::Equals("name".to_string(), "Alice".into()),
            Filter::Gt("age".to_string(), FilterValue::Int(18)),
        ]);
        let (sql, params) = combined.to_sql(DatabaseType::PostgreSQL);
        assert_eq!(sql, "(name = $1 AND age > $2)");
        assert_eq!(params.len(), 2);

        let either = Filter::or([
            Filter::Equals("status".to_string(), "active".into()),
            Filter::None,
        ]);
        assert!(matches!(either, Filter::Equals(_, _)));
    }

    #[test]
    fn test_none_is_absent_in_combinators() {
        assert_eq!(Filter::or([Filter::None, Filter::False]), Filter::False);
        assert_eq!(Filter::and([Filter::None, Filter::None]), Filter::None);
        assert_eq!(Filter::not(Filter::None), Filter::None);
        assert_eq!(Filter::None.and_then(Filter::False), Filter::False);
        assert_eq!(Filter::None.to_sql(DatabaseType::SQLite).0, "1 = 1");
    }

    #[test]
    fn test_to_json_serializes_values() {
        assert_eq!(FilterValue::Int(3).to_json(), serde_json::json!(3));
        assert_eq!(FilterValue::from("x").to_json(), serde_json::json!("x"));
        assert_eq!(FilterValue::Null.to_json(), serde_json::Value::Null);
        assert_eq!(FilterValue::Float(f64::INFINITY).to_json(), serde_json::Value::Null);
        assert_eq!(FilterValue::Json(serde_json::json!([1])).to_json(), serde_json::json!([1]));
    }

    #[test]
    fn test_renders_as_null() {
        assert!(FilterValue::Null.renders_as_null());
        assert!(FilterValue::Float(f64::NAN).renders_as_null());
        assert!(!FilterValue::Float(0.5).renders_as_null());
        assert!(!FilterValue::Int(0).renders_as_null());
    }

    #[test]
    fn test_filter_not() {
        let filter = Filter::not(Filter::Equals("deleted".to_string(), FilterValue::Bool(true)));
        let (sql, _) = filter.to_sql(DatabaseType::SQLite);
        assert_eq!(sql, "NOT (deleted = ?)");
    }

    #[test]
    fn test_equals_null_is_null_check() {
        let (sql, params) = Filter::Equals("deleted_at".into(), FilterValue::Null).to_sql(DatabaseType::PostgreSQL);
        assert_eq!(sql, "deleted_at IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_in_binds_single_json_parameter() {
        let filter = Filter::In("id".to_string(), vec![1.into(), 2.into(), 3.into()]);

        let (sql, params) = filter.to_sql(DatabaseType::SQLite);
        assert_eq!(sql, "id IN (SELECT value FROM json_each(?))");
        assert_eq!(params, vec![FilterValue::Json(serde_json::json!([1, 2, 3]))]);

        let (sql, _) = filter.to_sql(DatabaseType::MSSQL);
        assert_eq!(sql, "id IN (SELECT value FROM OPENJSON(@P1))");

        let (sql, _) = filter.to_sql(DatabaseType::PostgreSQL);
        assert_eq!(sql, "id::text IN (SELECT json_array_elements_text($1::json))");
    }

    #[test]
    fn test_in_list_is_literal() {
        let filter = Filter::InList("status".to_string(), vec!["active".into(), "pending".into()]);
        let (sql, params) = filter.to_sql(DatabaseType::PostgreSQL);
        assert_eq!(sql, "status IN ('active', 'pending')");
        assert!(params.is_empty());

        let filter = Filter::NotInList("id".to_string(), vec![1.into(), 2.into()]);
        let (sql, _) = filter.to_sql(DatabaseType::MSSQL);
        assert_eq!(sql, "id NOT IN (1, 2)");
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(Filter::InList("id".into(), vec![]).to_sql(DatabaseType::SQLite).0, "0 = 1");
        assert_eq!(Filter::NotInList("id".into(), vec![]).to_sql(DatabaseType::SQLite).0, "1 = 1");
        assert_eq!(Filter::In("id".into(), vec![]).to_sql(DatabaseType::SQLite).0, "0 = 1");
        assert_eq!(Filter::False.to_sql(DatabaseType::MSSQL).0, "0 = 1");
    }

    #[test]
    fn test_parameter_numbering_across_nested_filters() {
        let filter = Filter::and([
            Filter::Equals("a".into(), 1.into()),
            Filter::or([
                Filter::Equals("b".into(), 2.into()),
                Filter::In("c".into(), vec![3.into()]),
            ]),
            Filter::Lte("d".into(), 4.into()),
        ]);
        let (sql, params) = filter.to_sql(DatabaseType::MSSQL);
        assert_eq!(
            sql,
            "(a = @P1 AND (b = @P2 OR c IN (SELECT value FROM OPENJSON(@P3))) AND d <= @P4)"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_reserved_column_is_quoted() {
        let (sql, _) = Filter::InList("order".into(), vec![1.into()]).to_sql(DatabaseType::PostgreSQL);
        assert_eq!(sql, "\"order\" IN (1)");
    }
}
