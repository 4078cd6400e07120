//! Composable SELECT queries over a model.
//!
//! A [`Query`] is the queryable source the membership filters extend. Each
//! builder method consumes the query and returns a new one, so composition
//! never mutates a query another caller still holds (clone it first).
//!
//! ```rust
//! use prax_inlist::{Column, DatabaseType, Model, OrderByField, Query};
//!
//! struct User;
//!
//! impl Model for User {
//!     const MODEL_NAME: &'static str = "User";
//!     const TABLE_NAME: &'static str = "users";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!     const COLUMNS: &'static [&'static str] = &["id", "email", "age"];
//! }
//!
//! const AGE: Column<User, i32> = Column::new("age");
//!
//! let query = Query::<User>::for_database(DatabaseType::SQLite)
//!     .r#where(AGE.gt(18))
//!     .order_by(OrderByField::desc("age"))
//!     .take(10);
//!
//! let (sql, params) = query.build_sql();
//! assert_eq!(sql, "SELECT * FROM users WHERE age > ? ORDER BY age DESC LIMIT 10");
//! assert_eq!(params.len(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::filter::{Filter, FilterValue};
use crate::model::Model;
use crate::sql::{DatabaseType, SqlBuilder};
use crate::types::OrderBy;

/// A SELECT over the table of model `M`.
pub struct Query<M: Model> {
    db: DatabaseType,
    filter: Filter,
    order_by: OrderBy,
    select: Option<Vec<String>>,
    skip: Option<u64>,
    take: Option<u64>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Query<M> {
    /// Create a query for the default dialect (PostgreSQL).
    pub fn new() -> Self {
        Self::for_database(DatabaseType::default())
    }

    /// Create a query rendered for `db`.
    pub fn for_database(db: DatabaseType) -> Self {
        Self {
            db,
            filter: Filter::None,
            order_by: OrderBy::none(),
            select: None,
            skip: None,
            take: None,
            _model: PhantomData,
        }
    }

    /// Change the target dialect.
    pub fn database(mut self, db: DatabaseType) -> Self {
        self.db = db;
        self
    }

    /// The target dialect.
    pub fn database_type(&self) -> DatabaseType {
        self.db
    }

    /// Add a filter condition, AND-combined with any existing one.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        let current = std::mem::take(&mut self.filter);
        self.filter = current.and_then(filter.into());
        self
    }

    /// The accumulated filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Set the order by clause.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = order.into();
        self
    }

    /// Project specific columns instead of `*`.
    pub fn select(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Skip a number of rows.
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Take at most `n` rows.
    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    /// Build the SQL text and the parameters to bind.
    pub fn build_sql(&self) -> (String, Vec<FilterValue>) {
        let mut builder = SqlBuilder::new(self.db);
        let top = self.db == DatabaseType::MSSQL && self.skip.is_none();

        builder.push("SELECT ");
        if let (true, Some(n)) = (top, self.take) {
            builder.push(format!("TOP({}) ", n));
        }
        match self.select {
            Some(ref cols) if !cols.is_empty() => {
                for (i, col) in cols.iter().enumerate() {
                    if i > 0 {
                        builder.push(", ");
                    }
                    builder.push_identifier(col);
                }
            }
            _ => {
                builder.push("*");
            }
        }

        builder.push(" FROM ").push_identifier(M::TABLE_NAME);

        if !self.filter.is_none() {
            builder.push(" WHERE ");
            self.filter.write_sql(&mut builder);
        }

        if !self.order_by.is_empty() {
            builder.push(" ORDER BY ");
            for (i, field) in self.order_by.fields().iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                builder
                    .push_identifier(&field.column)
                    .push(" ")
                    .push(field.order.as_sql());
            }
        }

        self.write_paging(&mut builder, top);

        let (sql, params) = builder.build();
        crate::prax_debug!(table = M::TABLE_NAME, params = params.len(), sql = %sql, "Built query");
        (sql, params)
    }

    fn write_paging(&self, builder: &mut SqlBuilder, top: bool) {
        match self.db {
            DatabaseType::MSSQL => {
                if top {
                    return;
                }
                if let Some(skip) = self.skip {
                    if self.order_by.is_empty() {
                        builder.push(" ORDER BY (SELECT NULL)");
                    }
                    builder.push(format!(" OFFSET {} ROWS", skip));
                    if let Some(take) = self.take {
                        builder.push(format!(" FETCH NEXT {} ROWS ONLY", take));
                    }
                }
            }
            db => {
                match (self.take, self.skip) {
                    (Some(take), _) => {
                        builder.push(format!(" LIMIT {}", take));
                    }
                    (None, Some(_)) if db == DatabaseType::SQLite => {
                        builder.push(" LIMIT -1");
                    }
                    (None, Some(_)) if db == DatabaseType::MySQL => {
                        builder.push(format!(" LIMIT {}", u64::MAX));
                    }
                    _ => {}
                }
                if let Some(skip) = self.skip {
                    builder.push(format!(" OFFSET {}", skip));
                }
            }
        }
    }

    /// The SQL text this query renders to, without parameters.
    pub fn to_query_string(&self) -> String {
        self.build_sql().0
    }
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            filter: self.filter.clone(),
            order_by: self.order_by.clone(),
            select: self.select.clone(),
            skip: self.skip,
            take: self.take,
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("model", &M::MODEL_NAME)
            .field("db", &self.db)
            .field("filter", &self.filter)
            .field("order_by", &self.order_by)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .finish()
    }
}

impl<M: Model> fmt::Display for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use crate::types::OrderByField;
    use pretty_assertions::assert_eq;

    struct TestModel;

    impl Model for TestModel {
        const MODEL_NAME: &'static str = "TestModel";
        const TABLE_NAME: &'static str = "test_models";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
        const COLUMNS: &'static [&'static str] = &["id", "name", "email"];
    }

    const ID: Column<TestModel, i64> = Column::new("id");
    const NAME: Column<TestModel, String> = Column::new("name");

    #[test]
    fn test_query_basic() {
        let query = Query::<TestModel>::new();
        let (sql, params) = query.build_sql();

        assert_eq!(sql, "SELECT * FROM test_models");
        assert!(params.is_empty());
    }

    #[test]
    fn test_where_accumulates_with_and() {
        let query = Query::<TestModel>::new()
            .r#where(ID.gt(1))
            .r#where(NAME.equals("bob".to_string()))
            .r#where(Filter::None);

        let (sql, params) = query.build_sql();
        assert_eq!(sql, "SELECT * FROM test_models WHERE (id > $1 AND name = $2)");
        assert_eq!(params, vec![FilterValue::Int(1), FilterValue::String("bob".into())]);
    }

    #[test]
    fn test_select_and_order() {
        let query = Query::<TestModel>::for_database(DatabaseType::MySQL)
            .select(["id", "order"])
            .order_by(OrderByField::asc("name"));

        assert_eq!(query.to_query_string(), "SELECT id, `order` FROM test_models ORDER BY name ASC");
    }

    #[test]
    fn test_paging_per_dialect() {
        let base = Query::<TestModel>::new().skip(20).take(10);
        assert_eq!(base.to_query_string(), "SELECT * FROM test_models LIMIT 10 OFFSET 20");

        let sqlite = Query::<TestModel>::for_database(DatabaseType::SQLite).skip(5);
        assert_eq!(sqlite.to_query_string(), "SELECT * FROM test_models LIMIT -1 OFFSET 5");

        let top = Query::<TestModel>::for_database(DatabaseType::MSSQL).take(3);
        assert_eq!(top.to_query_string(), "SELECT TOP(3) * FROM test_models");

        let fetch = Query::<TestModel>::for_database(DatabaseType::MSSQL).skip(20).take(10);
        assert_eq!(
            fetch.to_query_string(),
            "SELECT * FROM test_models ORDER BY (SELECT NULL) OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_clone_leaves_original_untouched() {
        let original = Query::<TestModel>::new().r#where(ID.equals(1));
        let narrowed = original.clone().r#where(ID.lt(10));

        assert_eq!(original.to_query_string(), "SELECT * FROM test_models WHERE id = $1");
        assert_ne!(original.filter(), narrowed.filter());
    }

    #[test]
    fn test_display_matches_query_string() {
        let query = Query::<TestModel>::new().r#where(Filter::False);
        assert_eq!(query.to_string(), "SELECT * FROM test_models WHERE 0 = 1");
    }
}
