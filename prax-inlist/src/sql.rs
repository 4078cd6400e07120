//! SQL generation utilities: dialects, identifier quoting, inline literals.

use std::fmt::Write as _;

use crate::filter::FilterValue;

/// Escape a string for use as a double-quoted SQL identifier.
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    let reserved = [
        "user", "order", "group", "select", "from", "where", "table", "index",
        "key", "primary", "foreign", "check", "default", "null", "not", "and",
        "or", "in", "is", "like", "between", "case", "when", "then", "else",
        "end", "as", "on", "join", "left", "right", "inner", "outer", "cross",
        "natural", "using", "limit", "offset", "union", "intersect", "except",
        "all", "distinct", "having", "create", "alter", "drop", "insert",
        "update", "delete", "into", "values", "set", "returning", "value",
    ];

    if reserved.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Target database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
    /// SQL Server uses @P1, @P2, etc.
    MSSQL,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type (1-based index).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
            Self::MSSQL => format!("@P{}", index),
        }
    }

    /// Quote an identifier if it is reserved or contains special characters.
    pub fn quote_identifier(&self, name: &str) -> String {
        if !needs_quoting(name) {
            return name.to_string();
        }
        match self {
            Self::PostgreSQL | Self::SQLite => escape_identifier(name),
            Self::MySQL => format!("`{}`", name.replace('`', "``")),
            Self::MSSQL => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Render a value as an inline SQL literal.
    ///
    /// ```rust
    /// use prax_inlist::{DatabaseType, FilterValue};
    ///
    /// assert_eq!(DatabaseType::SQLite.literal(&FilterValue::from("O'Brien")), "'O''Brien'");
    /// assert_eq!(DatabaseType::MSSQL.literal(&FilterValue::from("x")), "N'x'");
    /// assert_eq!(DatabaseType::PostgreSQL.literal(&FilterValue::Bool(true)), "TRUE");
    /// ```
    pub fn literal(&self, value: &FilterValue) -> String {
        let mut out = String::new();
        self.write_literal(value, &mut out);
        out
    }

    /// Write a value as an inline SQL literal into `buffer`.
    ///
    /// MySQL treats `\` as an escape character inside string literals, so
    /// backslashes and NUL are escaped there in addition to doubling `'`.
    pub fn write_literal(&self, value: &FilterValue, buffer: &mut String) {
        match value {
            FilterValue::Null => buffer.push_str("NULL"),
            FilterValue::Bool(b) => buffer.push_str(match (self, b) {
                (Self::PostgreSQL, true) => "TRUE",
                (Self::PostgreSQL, false) => "FALSE",
                (_, true) => "1",
                (_, false) => "0",
            }),
            FilterValue::Int(i) => {
                let _ = write!(buffer, "{}", i);
            }
            FilterValue::Float(f) if f.is_finite() => {
                let _ = write!(buffer, "{}", f);
            }
            FilterValue::Float(_) => buffer.push_str("NULL"),
            FilterValue::String(s) => self.write_string_literal(s, buffer),
            FilterValue::Json(j) => self.write_string_literal(&j.to_string(), buffer),
        }
    }

    fn write_string_literal(&self, s: &str, buffer: &mut String) {
        if *self == Self::MSSQL {
            buffer.push('N');
        }
        buffer.push('\'');
        for c in s.chars() {
            match (self, c) {
                (_, '\'') => buffer.push_str("''"),
                (Self::MySQL, '\\') => buffer.push_str("\\\\"),
                (Self::MySQL, '\0') => buffer.push_str("\\0"),
                _ => buffer.push(c),
            }
        }
        buffer.push('\'');
    }

    /// SQL condition that is always false.
    pub const fn false_condition(&self) -> &'static str {
        "0 = 1"
    }

    /// SQL condition that is always true.
    pub const fn true_condition(&self) -> &'static str {
        "1 = 1"
    }
}

/// A SQL builder that accumulates text and bound parameters.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    db_type: DatabaseType,
    sql: String,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            sql: String::with_capacity(64),
            params: Vec::new(),
        }
    }

    /// Create a SQL Server SQL builder.
    pub fn mssql() -> Self {
        Self::new(DatabaseType::MSSQL)
    }

    /// The dialect this builder renders for.
    pub fn database(&self) -> DatabaseType {
        self.db_type
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a bound parameter placeholder.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        let index = self.params.len() + 1;
        self.sql.push_str(&self.db_type.placeholder(index));
        self.params.push(value.into());
        self
    }

    /// Push an identifier (properly quoted if needed).
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        let quoted = self.db_type.quote_identifier(name);
        self.sql.push_str(&quoted);
        self
    }

    /// Push a value inline as a SQL literal (no parameter is bound).
    pub fn push_literal(&mut self, value: &FilterValue) -> &mut Self {
        self.db_type.write_literal(value, &mut self.sql);
        self
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.sql, self.params)
    }

    /// Get the next parameter index.
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(DatabaseType::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quote_identifier_per_dialect() {
        assert_eq!(DatabaseType::PostgreSQL.quote_identifier("user"), "\"user\"");
        assert_eq!(DatabaseType::MySQL.quote_identifier("order"), "`order`");
        assert_eq!(DatabaseType::MSSQL.quote_identifier("key"), "[key]");
        assert_eq!(DatabaseType::SQLite.quote_identifier("my_table"), "my_table");
        assert_eq!(DatabaseType::SQLite.quote_identifier("_hidden"), "_hidden");
    }

    #[test]
    fn test_quote_identifier_leading_digit() {
        assert_eq!(DatabaseType::PostgreSQL.quote_identifier("1col"), "\"1col\"");
        assert_eq!(DatabaseType::MySQL.quote_identifier("2024_sales"), "`2024_sales`");
        assert_eq!(DatabaseType::MSSQL.quote_identifier("9lives"), "[9lives]");
        assert_eq!(DatabaseType::SQLite.quote_identifier("col1"), "col1");
    }

    #[test]
    fn test_database_placeholder() {
        assert_eq!(DatabaseType::PostgreSQL.placeholder(5), "$5");
        assert_eq!(DatabaseType::MySQL.placeholder(1), "?");
        assert_eq!(DatabaseType::SQLite.placeholder(1), "?");
        assert_eq!(DatabaseType::MSSQL.placeholder(2), "@P2");
    }

    #[test]
    fn test_literals() {
        let pg = DatabaseType::PostgreSQL;
        assert_eq!(pg.literal(&FilterValue::Int(-7)), "-7");
        assert_eq!(pg.literal(&FilterValue::Float(2.5)), "2.5");
        assert_eq!(pg.literal(&FilterValue::Float(f64::NAN)), "NULL");
        assert_eq!(pg.literal(&FilterValue::Null), "NULL");
        assert_eq!(DatabaseType::SQLite.literal(&FilterValue::Bool(false)), "0");
        assert_eq!(pg.literal(&FilterValue::from("it's")), "'it''s'");
        assert_eq!(DatabaseType::MSSQL.literal(&FilterValue::from("a")), "N'a'");
        assert_eq!(
            pg.literal(&FilterValue::Json(serde_json::json!({"k": "v"}))),
            "'{\"k\":\"v\"}'"
        );
    }

    #[test]
    fn test_mysql_escapes_backslash_and_nul() {
        let mysql = DatabaseType::MySQL;
        assert_eq!(mysql.literal(&FilterValue::from(r"a\'b")), r"'a\\''b'");
        assert_eq!(mysql.literal(&FilterValue::from(r"C:\tmp")), r"'C:\\tmp'");
        assert_eq!(mysql.literal(&FilterValue::from("nul\0byte")), r"'nul\0byte'");
        assert_eq!(
            mysql.literal(&FilterValue::from(r"\' OR 1=1 -- ")),
            r"'\\'' OR 1=1 -- '"
        );
    }

    #[test]
    fn test_backslash_is_plain_text_elsewhere() {
        let value = FilterValue::from(r"a\'b");
        assert_eq!(DatabaseType::PostgreSQL.literal(&value), r"'a\''b'");
        assert_eq!(DatabaseType::SQLite.literal(&value), r"'a\''b'");
        assert_eq!(DatabaseType::MSSQL.literal(&value), r"N'a\''b'");
    }

    #[test]
    fn test_default_builder_is_postgres() {
        assert_eq!(SqlBuilder::default().database(), DatabaseType::PostgreSQL);
    }

    #[test]
    fn test_sql_builder() {
        let mut builder = SqlBuilder::mssql();
        builder
            .push("SELECT * FROM ")
            .push_identifier("user")
            .push(" WHERE ")
            .push_identifier("id")
            .push(" = ")
            .push_param(42i32)
            .push(" AND name = ")
            .push_literal(&FilterValue::from("bob"));

        assert_eq!(builder.next_param_index(), 2);
        let (sql, params) = builder.build();
        assert_eq!(sql, "SELECT * FROM [user] WHERE id = @P1 AND name = N'bob'");
        assert_eq!(params, vec![FilterValue::Int(42)]);
    }
}
