//! Vectorized execution module.
//!
//! This module provides the column bindings, the expression evaluator and
//! result sanitization, all built on Apache Arrow's columnar format.

pub mod batch;
pub mod evaluator;
pub mod sanitize;

pub use batch::{ColumnBatch, ROW_ID_COLUMN};
pub use evaluator::VectorizedEvaluator;
pub use sanitize::{sanitize, sanitize_value, NEGATIVE_SENTINEL, POSITIVE_SENTINEL};
