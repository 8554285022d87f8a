//! Dataset rows, formulas and the records produced by a run.

use serde::{Deserialize, Serialize};

use super::{FormulaId, RowId};

/// One dataset row as delivered by a source.
///
/// A field is `None` when the source value was missing or not numeric.
/// Such fields are evaluated as `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    /// Unique row identifier.
    pub id: RowId,
    /// Values of `a`, `b`, `c` and `d`.
    pub fields: [Option<f64>; 4],
}

impl DataRow {
    /// Creates a row with all four fields present.
    #[must_use]
    pub fn new(id: RowId, a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            id,
            fields: [Some(a), Some(b), Some(c), Some(d)],
        }
    }

    /// Returns the field values with missing and non-finite values set to zero.
    #[must_use]
    pub fn coerced(&self) -> [f64; 4] {
        self.fields
            .map(|field| field.filter(|v| v.is_finite()).unwrap_or(0.0))
    }
}

/// A user-authored formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    /// Unique formula identifier.
    #[serde(rename = "formula_id")]
    pub id: FormulaId,
    /// Expression evaluated when there is no condition or it holds.
    pub expression: String,
    /// Optional boolean predicate selecting between the two branches.
    #[serde(default)]
    pub condition: Option<String>,
    /// Expression evaluated where the condition does not hold.
    #[serde(default)]
    pub false_expression: Option<String>,
}

impl Formula {
    /// Creates an unconditional formula.
    pub fn new(id: FormulaId, expression: impl Into<String>) -> Self {
        Self {
            id,
            expression: expression.into(),
            condition: None,
            false_expression: None,
        }
    }

    /// Sets the condition.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Sets the false-branch expression.
    #[must_use]
    pub fn with_false_expression(mut self, false_expression: impl Into<String>) -> Self {
        self.false_expression = Some(false_expression.into());
        self
    }
}

/// One computed value for a (row, formula) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub row_id: RowId,
    pub formula_id: FormulaId,
    pub method: String,
    pub value: f64,
}

/// Timing of one successfully evaluated formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub formula_id: FormulaId,
    pub method: String,
    pub elapsed_secs: f64,
}
