//! Error types for vecform operations.

use thiserror::Error;

use crate::types::FormulaId;

/// Result type alias using [`VecformError`].
pub type Result<T> = std::result::Result<T, VecformError>;

/// Error types for vecform operations.
#[derive(Debug, Error)]
pub enum VecformError {
    // ==================== Evaluation Errors ====================
    /// Parse error with location information.
    #[error("Parse error at line {line}, column {col}: {message}")]
    ParseError {
        line: usize,
        col: usize,
        message: String,
    },

    /// Identifier that is not one of the declared dataset columns.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Function name outside the supported vectorized set.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Function called with the wrong number of arguments.
    #[error("Function {function} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Invalid expression during evaluation.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// A formula could not be evaluated at all.
    #[error("Formula {formula_id} failed: {source}")]
    FormulaFailed {
        formula_id: FormulaId,
        #[source]
        source: Box<VecformError>,
    },

    /// Arrow compute kernel failure.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ==================== Storage Errors ====================
    /// General storage/I/O error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// CSV read or write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sink rejected a batch above its per-call row ceiling.
    #[error("Batch of {rows} rows exceeds the sink limit of {limit} rows per call")]
    BatchTooLarge { rows: usize, limit: usize },

    // ==================== Configuration Errors ====================
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl VecformError {
    /// Wraps an evaluation error with the id of the formula it came from.
    #[must_use]
    pub fn for_formula(self, formula_id: FormulaId) -> Self {
        match self {
            already @ VecformError::FormulaFailed { .. } => already,
            other => VecformError::FormulaFailed {
                formula_id,
                source: Box::new(other),
            },
        }
    }
}
