//! Formula error types
//!
//! These are structural failures: malformed formula text or a context that
//! cannot answer a lookup. Spreadsheet errors such as `#DIV/0!` are ordinary
//! values ([`crate::Value::Error`]) and never appear here.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that abort a parse or an evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// Identifier bound nowhere in the context chain
    #[error("Undefined name: {0}")]
    UndefinedName(String),

    /// Operation the context cannot perform (e.g. cell lookup on a bare environment)
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Call target is not a function
    #[error("Not callable: {0}")]
    NotCallable(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Comparison between values of different variants
    #[error("Cannot compare {left} with {right}")]
    Incompatible {
        left: &'static str,
        right: &'static str,
    },

    /// A formula cell depends on its own value
    #[error("Circular reference detected at {0}")]
    CircularReference(String),

    /// Too many formula cells in flight at once
    #[error("Formula dependencies nested too deeply at {position} (limit {limit})")]
    DepthLimit { position: String, limit: usize },

    /// Write to a protected view
    #[error("View is read-only: {0}")]
    ReadOnly(String),

    /// Error from the core crate (addresses, sheets)
    #[error(transparent)]
    Core(#[from] tabula_core::Error),
}

impl FormulaError {
    /// Build a syntax error at a line/column
    pub fn syntax<S: Into<String>>(message: S, line: usize, column: usize) -> Self {
        FormulaError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    /// Check if this is a syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(self, FormulaError::Syntax { .. })
    }
}
