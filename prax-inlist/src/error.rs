//! Error types for query composition with actionable messages.
//!
//! Error codes follow the Prax pattern `P{category}{number}`:
//! - 1xxx: Query errors (missing input)
//! - 5xxx: Parameter errors (limits)
//!
//! ```rust
//! use prax_inlist::{ErrorCode, QueryError};
//!
//! let err = QueryError::value_limit_exceeded(2500, 2100);
//! assert_eq!(err.code, ErrorCode::ParameterLimitExceeded);
//! assert!(err.to_string().contains("2500"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query composition.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// Required input missing (P1005).
    RequiredFieldMissing = 1005,

    // Parameter errors (5xxx)
    /// Too many values in a single membership list (P5006).
    ParameterLimitExceeded = 5006,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1005").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RequiredFieldMissing => "Required argument missing",
            Self::ParameterLimitExceeded => "Parameter limit exceeded",
        }
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        format!("https://prax.rs/docs/errors/{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field or argument involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors raised while composing a query.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a missing-argument error naming the absent parameter.
    pub fn missing_argument(parameter: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self::new(
            ErrorCode::RequiredFieldMissing,
            format!("Value cannot be null or missing (parameter '{}')", parameter),
        )
        .with_field(&parameter)
        .with_suggestion(format!("Provide a value for '{}' before building the filter", parameter))
    }

    /// Create a limit-exceeded error for an oversized membership list.
    pub fn value_limit_exceeded(actual: usize, limit: usize) -> Self {
        Self::new(
            ErrorCode::ParameterLimitExceeded,
            format!(
                "Membership list has {} distinct values, which exceeds the limit of {}",
                actual, limit
            ),
        )
        .with_field("values")
        .with_code_suggestion(
            "Split the list into OR-combined batches",
            "query.where_in_batched(user::ID, ids)",
        )
        .with_help(format!(
            "A single IN list may hold at most {} values on every supported database",
            limit
        ))
    }

    // ============== Error Checks ==============

    /// Check if this is a missing-argument error.
    pub fn is_missing_argument(&self) -> bool {
        self.code == ErrorCode::RequiredFieldMissing
    }

    /// Check if this is a limit-exceeded error.
    pub fn is_limit_exceeded(&self) -> bool {
        self.code == ErrorCode::ParameterLimitExceeded
    }

    /// Check if this error came from validating call arguments.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RequiredFieldMissing | ErrorCode::ParameterLimitExceeded
        )
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        self.code.docs_url()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!("     ```\n     {}\n     ```\n", code.replace('\n', "\n     ")));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output.push_str(&format!("\nMore info: {}\n", self.docs_url()));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::RequiredFieldMissing.code(), "P1005");
        assert_eq!(ErrorCode::ParameterLimitExceeded.code(), "P5006");
    }

    #[test]
    fn test_missing_argument_names_parameter() {
        let err = QueryError::missing_argument("values");
        assert!(err.is_missing_argument());
        assert!(err.is_argument_error());
        assert!(err.message.contains("'values'"));
        assert_eq!(err.context.field, Some("values".to_string()));
    }

    #[test]
    fn test_limit_exceeded_mentions_both_counts() {
        let err = QueryError::value_limit_exceeded(2101, 2100);
        assert!(err.is_limit_exceeded());
        assert!(err.message.contains("2101"));
        assert!(err.message.contains("2100"));
        assert!(err.to_string().starts_with("[P5006]"));
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::value_limit_exceeded(3000, 2100).with_context("where_in on users.id");

        let output = err.display_full();
        assert!(output.contains("P5006"));
        assert!(output.contains("where_in on users.id"));
        assert!(output.contains("Suggestions"));
        assert!(output.contains("where_in_batched"));
    }

    #[test]
    fn test_source_is_exposed() {
        let io = std::io::Error::other("disk");
        let err = QueryError::missing_argument("values").with_source(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
