//! # prax-inlist
//!
//! Literal IN-list membership filters for Prax queries.
//!
//! Filtering by a collection through the default [`Filter::In`] binds the
//! collection as a single JSON parameter and expands it with a JSON subquery
//! (`json_each`, `OPENJSON`, `JSON_TABLE`). The extensions in this crate render
//! the values inline instead:
//!
//! - [`WhereInExt::where_in`] - `col IN (v1, v2, ...)`, or `0 = 1` for no values
//! - [`WhereInExt::where_not_in`] - `col NOT IN (v1, v2, ...)`, or no filter for no values
//! - [`WhereInExt::where_in_batched`] - any number of values, split into
//!   OR-combined lists of at most [`MAX_IN_LIST_VALUES`]
//!
//! ```rust
//! use prax_inlist::prelude::*;
//!
//! struct Order;
//!
//! impl Model for Order {
//!     const MODEL_NAME: &'static str = "Order";
//!     const TABLE_NAME: &'static str = "orders";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!     const COLUMNS: &'static [&'static str] = &["id", "status"];
//! }
//!
//! const STATUS: Column<Order, &'static str> = Column::new("status");
//!
//! # fn main() -> QueryResult<()> {
//! let query = Query::<Order>::for_database(DatabaseType::MSSQL)
//!     .where_not_in(STATUS, ["cancelled", "refunded"])?;
//!
//! assert_eq!(
//!     query.to_query_string(),
//!     "SELECT * FROM orders WHERE status NOT IN (N'cancelled', N'refunded')"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Argument problems surface as [`QueryError`] with a stable [`ErrorCode`]:
//!
//! ```rust
//! use prax_inlist::{ErrorCode, QueryError, MAX_IN_LIST_VALUES};
//!
//! let err = QueryError::value_limit_exceeded(5000, MAX_IN_LIST_VALUES);
//! assert_eq!(err.code, ErrorCode::ParameterLimitExceeded);
//! ```

pub mod error;
pub mod filter;
pub mod logging;
pub mod membership;
pub mod model;
pub mod query;
pub mod sql;
pub mod types;

pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{Filter, FilterValue};
pub use membership::{
    in_list, in_list_batched, not_in_list, MembershipBuilder, MembershipMode, ValueSet, WhereInExt,
    MAX_IN_LIST_VALUES,
};
pub use model::{Column, Model};
pub use query::Query;
pub use sql::{DatabaseType, SqlBuilder};
pub use types::{OrderBy, OrderByField, SortOrder};

pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};

#[doc(hidden)]
pub use tracing as __tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::membership::{MembershipBuilder, WhereInExt, MAX_IN_LIST_VALUES};
    pub use crate::model::{Column, Model};
    pub use crate::query::Query;
    pub use crate::sql::DatabaseType;
    pub use crate::types::{OrderBy, OrderByField, SortOrder};
}
