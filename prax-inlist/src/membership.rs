//! Literal IN-list membership filters.
//!
//! The default [`Filter::In`] translation binds the whole collection as one
//! JSON parameter and expands it server-side. The functions here render the
//! collection inline instead, as `col IN (1, 2, 3)`, which lets the planner
//! see the actual values.
//!
//! Values are deduplicated before anything else (first occurrence wins), and
//! the [`MAX_IN_LIST_VALUES`] limit applies to the distinct count.
//!
//! ```rust
//! use prax_inlist::{Column, DatabaseType, Model, Query, WhereInExt};
//!
//! struct Entity;
//!
//! impl Model for Entity {
//!     const MODEL_NAME: &'static str = "Entity";
//!     const TABLE_NAME: &'static str = "entities";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!     const COLUMNS: &'static [&'static str] = &["id", "name"];
//! }
//!
//! const ID: Column<Entity, i64> = Column::new("id");
//!
//! let query = Query::<Entity>::for_database(DatabaseType::SQLite)
//!     .where_in(ID, [1, 2, 3, 2])
//!     .unwrap();
//! assert_eq!(query.to_query_string(), "SELECT * FROM entities WHERE id IN (1, 2, 3)");
//!
//! let none = Query::<Entity>::new().where_in(ID, Vec::new()).unwrap();
//! assert_eq!(none.to_query_string(), "SELECT * FROM entities WHERE 0 = 1");
//! ```

use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::{QueryError, QueryResult};
use crate::filter::{Filter, FilterValue};
use crate::model::{Column, Model};
use crate::prax_trace;
use crate::query::Query;

/// Maximum number of distinct values in a single IN list.
pub const MAX_IN_LIST_VALUES: usize = 2100;

/// A duplicate-free collection of comparison values, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet<T> {
    values: Vec<T>,
    raw_len: usize,
}

impl<T: Eq + Hash> ValueSet<T> {
    /// Deduplicate `values`, keeping the first occurrence of each.
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        let mut raw_len = 0;
        let set: IndexSet<T> = values.into_iter().inspect(|_| raw_len += 1).collect();
        Self {
            values: set.into_iter().collect(),
            raw_len,
        }
    }
}

impl<T> ValueSet<T> {
    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values supplied before deduplication.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// The distinct values.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Contiguous, non-overlapping batches of at most `size` values.
    pub fn batches(&self, size: usize) -> std::slice::Chunks<'_, T> {
        self.values.chunks(size.max(1))
    }

    /// How many batches [`batches`](Self::batches) yields for `size`.
    pub fn batch_count(&self, size: usize) -> usize {
        self.values.len().div_ceil(size.max(1))
    }
}

impl ValueSet<FilterValue> {
    /// Convert and deduplicate `values`, keeping the first occurrence of each.
    ///
    /// Floats compare by bit pattern and JSON values structurally.
    pub fn from_values<T: Into<FilterValue>>(values: impl IntoIterator<Item = T>) -> Self {
        let mut raw_len = 0;
        let set: IndexSet<DedupKey> = values
            .into_iter()
            .inspect(|_| raw_len += 1)
            .map(|v| DedupKey(v.into()))
            .collect();
        Self {
            values: set.into_iter().map(|key| key.0).collect(),
            raw_len,
        }
    }
}

// `FilterValue` holds floats, so it has no `Eq`/`Hash` of its own.
struct DedupKey(FilterValue);

impl PartialEq for DedupKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (FilterValue::Float(a), FilterValue::Float(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for DedupKey {}

impl Hash for DedupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            FilterValue::Null => {}
            FilterValue::Bool(b) => b.hash(state),
            FilterValue::Int(i) => i.hash(state),
            FilterValue::Float(f) => f.to_bits().hash(state),
            FilterValue::String(s) => s.hash(state),
            FilterValue::Json(j) => j.to_string().hash(state),
        }
    }
}

impl<T: Eq + Hash> FromIterator<T> for ValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T> IntoIterator for ValueSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Rows whose `column` is one of `values`, rendered as a literal IN list.
///
/// Empty `values` yields [`Filter::False`]. More than [`MAX_IN_LIST_VALUES`]
/// distinct values is an error; use [`in_list_batched`] for those.
pub fn in_list<M, T>(column: Column<M, T>, values: impl IntoIterator<Item = T>) -> QueryResult<Filter>
where
    M: Model,
    T: Into<FilterValue>,
{
    require_column(&column)?;
    let set = ValueSet::from_values(values);
    log_value_set("in_list", &column, &set);

    if set.is_empty() {
        return Ok(Filter::False);
    }
    check_limit("where_in", &column, &set)?;

    Ok(membership_predicate(column.name(), set.into_iter().collect(), false))
}

/// Rows whose `column` is none of `values`, rendered as a literal NOT IN list.
///
/// Empty `values` yields [`Filter::None`], so no row is filtered out.
pub fn not_in_list<M, T>(
    column: Column<M, T>,
    values: impl IntoIterator<Item = T>,
) -> QueryResult<Filter>
where
    M: Model,
    T: Into<FilterValue>,
{
    require_column(&column)?;
    let set = ValueSet::from_values(values);
    log_value_set("not_in_list", &column, &set);

    if set.is_empty() {
        return Ok(Filter::None);
    }
    check_limit("where_not_in", &column, &set)?;

    Ok(membership_predicate(column.name(), set.into_iter().collect(), true))
}

/// Like [`in_list`], for collections of any size.
///
/// The distinct values are split by position into batches of at most
/// [`MAX_IN_LIST_VALUES`]; each batch becomes its own IN list and the lists
/// are OR-combined.
pub fn in_list_batched<M, T>(
    column: Column<M, T>,
    values: impl IntoIterator<Item = T>,
) -> QueryResult<Filter>
where
    M: Model,
    T: Into<FilterValue>,
{
    require_column(&column)?;
    let set = ValueSet::from_values(values);
    log_value_set("in_list_batched", &column, &set);

    if set.is_empty() {
        return Ok(Filter::False);
    }

    let batch_count = set.batch_count(MAX_IN_LIST_VALUES);
    debug!(column = column.name(), batches = batch_count, "Splitting IN list into batches");

    let values: Vec<FilterValue> = set.into_iter().collect();
    let predicates = values.chunks(MAX_IN_LIST_VALUES).enumerate().map(|(index, batch)| {
        prax_trace!(column = column.name(), batch = index, size = batch.len(), "IN list batch");
        membership_predicate(column.name(), batch.to_vec(), false)
    });

    Ok(Filter::or(predicates))
}

/// Membership filters on [`Query`].
///
/// Each method consumes the query and returns a new one with the filter
/// AND-combined into its WHERE clause.
///
/// Any value type convertible to [`FilterValue`] works, floats included.
/// Duplicates are detected on the converted value, so floats count as equal
/// only when their bit patterns match, and NaN or infinite floats behave as
/// null members.
pub trait WhereInExt<M: Model>: Sized {
    /// Keep rows whose `column` is one of `values`.
    ///
    /// Empty `values` makes the query return no rows (`WHERE 0 = 1`).
    ///
    /// # Errors
    ///
    /// Fails when more than [`MAX_IN_LIST_VALUES`] distinct values are given,
    /// or when `column` has no name.
    fn where_in<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>;

    /// Keep rows whose `column` is none of `values`.
    ///
    /// Empty `values` returns the query unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`where_in`](Self::where_in).
    fn where_not_in<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>;

    /// Keep rows whose `column` is one of `values`, for any number of values.
    ///
    /// # Errors
    ///
    /// Fails only when `column` has no name.
    fn where_in_batched<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>;
}

impl<M: Model> WhereInExt<M> for Query<M> {
    fn where_in<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>,
    {
        Ok(self.r#where(in_list(column, values)?))
    }

    fn where_not_in<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>,
    {
        match not_in_list(column, values)? {
            Filter::None => Ok(self),
            filter => Ok(self.r#where(filter)),
        }
    }

    fn where_in_batched<T, I>(self, column: Column<M, T>, values: I) -> QueryResult<Self>
    where
        T: Into<FilterValue>,
        I: IntoIterator<Item = T>,
    {
        Ok(self.r#where(in_list_batched(column, values)?))
    }
}

/// Which membership filter a [`MembershipBuilder`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipMode {
    /// [`WhereInExt::where_in`].
    In,
    /// [`WhereInExt::where_not_in`].
    NotIn,
    /// [`WhereInExt::where_in_batched`].
    InBatched,
}

/// Assembles a membership filter from separately supplied parts.
///
/// Useful when the source, selector, or values come from optional plumbing;
/// [`build`](Self::build) reports the first missing part by name.
///
/// ```rust
/// use prax_inlist::{Column, MembershipBuilder, Model, Query};
///
/// struct Tag;
///
/// impl Model for Tag {
///     const MODEL_NAME: &'static str = "Tag";
///     const TABLE_NAME: &'static str = "tags";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///     const COLUMNS: &'static [&'static str] = &["id", "label"];
/// }
///
/// const LABEL: Column<Tag, &'static str> = Column::new("label");
///
/// let err = MembershipBuilder::<Tag, &str>::in_list()
///     .source(Query::<Tag>::new())
///     .selector(LABEL)
///     .build()
///     .unwrap_err();
/// assert!(err.message.contains("'values'"));
/// ```
pub struct MembershipBuilder<M: Model, T> {
    mode: MembershipMode,
    source: Option<Query<M>>,
    selector: Option<Column<M, T>>,
    values: Option<Vec<T>>,
}

impl<M: Model, T> MembershipBuilder<M, T> {
    /// Start a builder for `mode`.
    pub fn new(mode: MembershipMode) -> Self {
        Self {
            mode,
            source: None,
            selector: None,
            values: None,
        }
    }

    /// Start an IN builder.
    pub fn in_list() -> Self {
        Self::new(MembershipMode::In)
    }

    /// Start a NOT IN builder.
    pub fn not_in_list() -> Self {
        Self::new(MembershipMode::NotIn)
    }

    /// Start a batched IN builder.
    pub fn batched() -> Self {
        Self::new(MembershipMode::InBatched)
    }

    /// Set (or clear, with `None`) the query to filter.
    pub fn source(mut self, source: impl Into<Option<Query<M>>>) -> Self {
        self.source = source.into();
        self
    }

    /// Set (or clear, with `None`) the column to test.
    pub fn selector(mut self, selector: impl Into<Option<Column<M, T>>>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Set the comparison values.
    pub fn values(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.values = Some(values.into_iter().collect());
        self
    }

    /// Set or clear the comparison values.
    pub fn maybe_values<I: IntoIterator<Item = T>>(mut self, values: Option<I>) -> Self {
        self.values = values.map(|v| v.into_iter().collect());
        self
    }

    /// The mode this builder applies.
    pub fn mode(&self) -> MembershipMode {
        self.mode
    }
}

impl<M: Model, T> MembershipBuilder<M, T>
where
    T: Into<FilterValue>,
{
    /// Apply the filter.
    ///
    /// # Errors
    ///
    /// A missing-argument error naming `source`, `selector`, or `values`
    /// (checked in that order), or the errors of the selected mode.
    pub fn build(self) -> QueryResult<Query<M>> {
        let source = self.source.ok_or_else(|| QueryError::missing_argument("source"))?;
        let selector = self.selector.ok_or_else(|| QueryError::missing_argument("selector"))?;
        let values = self.values.ok_or_else(|| QueryError::missing_argument("values"))?;

        match self.mode {
            MembershipMode::In => source.where_in(selector, values),
            MembershipMode::NotIn => source.where_not_in(selector, values),
            MembershipMode::InBatched => source.where_in_batched(selector, values),
        }
    }
}

fn require_column<M, T>(column: &Column<M, T>) -> QueryResult<()> {
    if column.is_unnamed() {
        return Err(QueryError::missing_argument("selector"));
    }
    Ok(())
}

fn check_limit<M: Model, T>(
    operation: &str,
    column: &Column<M, T>,
    set: &ValueSet<FilterValue>,
) -> QueryResult<()> {
    if set.len() <= MAX_IN_LIST_VALUES {
        return Ok(());
    }
    warn!(
        table = M::TABLE_NAME,
        column = column.name(),
        distinct = set.len(),
        limit = MAX_IN_LIST_VALUES,
        "Rejecting oversized IN list"
    );
    Err(QueryError::value_limit_exceeded(set.len(), MAX_IN_LIST_VALUES)
        .with_context(format!("{} on {}.{}", operation, M::TABLE_NAME, column.name()))
        .with_model(M::MODEL_NAME))
}

fn log_value_set<M: Model, T>(operation: &str, column: &Column<M, T>, set: &ValueSet<FilterValue>) {
    debug!(
        operation,
        table = M::TABLE_NAME,
        column = column.name(),
        raw = set.raw_len(),
        distinct = set.len(),
        "Building membership filter"
    );
}

// `x IN (NULL)` is never true in SQL, so null members become IS [NOT] NULL.
// `values` is non-empty.
fn membership_predicate(column: &str, values: Vec<FilterValue>, negated: bool) -> Filter {
    let has_null = values.iter().any(FilterValue::renders_as_null);
    let listed: Vec<FilterValue> = values.into_iter().filter(|v| !v.renders_as_null()).collect();
    let column = column.to_string();

    let list = (!listed.is_empty()).then(|| {
        if negated {
            Filter::NotInList(column.clone(), listed)
        } else {
            Filter::InList(column.clone(), listed)
        }
    });

    match (list, has_null, negated) {
        (Some(list), false, _) => list,
        (Some(list), true, false) => Filter::Or(vec![list, Filter::IsNull(column)]),
        (Some(list), true, true) => Filter::And(vec![list, Filter::IsNotNull(column)]),
        (None, _, false) => Filter::IsNull(column),
        (None, _, true) => Filter::IsNotNull(column),
    }
}
