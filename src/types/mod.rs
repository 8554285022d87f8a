//! Record types exchanged between the runner, the stores and the evaluator.

mod record;

pub use record::{DataRow, Formula, LogRecord, ResultRecord};

/// Identifier of a dataset row.
pub type RowId = i64;

/// Identifier of a formula.
pub type FormulaId = i64;

/// Names of the numeric dataset columns, in storage order.
pub const DATA_COLUMNS: [&str; 4] = ["a", "b", "c", "d"];
