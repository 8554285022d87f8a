//! Executor module for formula evaluation.
//!
//! [`FormulaEvaluator`] binds a dataset once and evaluates translated
//! formulas against it, one at a time. Conditional formulas are evaluated
//! branch by branch over the whole dataset and combined with a row mask.

pub mod vectorized;

use arrow::array::{AsArray, BooleanArray, Float64Array};
use arrow::compute::kernels::zip::zip;
use arrow::datatypes::Float64Type;
use log::debug;

use crate::error::Result;
use crate::parser::parse_formula;
use crate::translate::TranslatedFormula;

use self::vectorized::{sanitize, ColumnBatch, VectorizedEvaluator};

/// Evaluates translated formulas against a shared, read-only dataset.
#[derive(Debug, Clone, Copy)]
pub struct FormulaEvaluator<'a> {
    batch: &'a ColumnBatch,
}

impl<'a> FormulaEvaluator<'a> {
    /// Creates an evaluator bound to the given dataset.
    #[must_use]
    pub fn new(batch: &'a ColumnBatch) -> Self {
        Self { batch }
    }

    /// Evaluates a formula to one finite value per dataset row.
    ///
    /// With a condition, rows where it holds take the expression value and
    /// the others take the false-expression value, or zero without one.
    /// NaN becomes `0.0` and infinities become `±1e10`.
    ///
    /// # Errors
    ///
    /// Returns `FormulaFailed` carrying the formula id if any of the
    /// formula's texts cannot be parsed or evaluated. No partial result is
    /// produced.
    pub fn evaluate(&self, formula: &TranslatedFormula) -> Result<Float64Array> {
        self.evaluate_branches(formula)
            .map(|raw| sanitize(&raw))
            .map_err(|e| e.for_formula(formula.formula_id))
    }

    fn evaluate_branches(&self, formula: &TranslatedFormula) -> Result<Float64Array> {
        let expression = parse_formula(&formula.expression)?;
        debug!(
            "Formula {} reads columns {:?}",
            formula.formula_id,
            expression.columns()
        );

        let Some(condition) = &formula.condition else {
            return VectorizedEvaluator::evaluate_numeric(&expression, self.batch);
        };

        let condition = parse_formula(condition)?;
        let false_expression = formula
            .false_expression
            .as_deref()
            .map(parse_formula)
            .transpose()?;

        let mask = VectorizedEvaluator::evaluate_mask(&condition, self.batch)?;
        let true_values = VectorizedEvaluator::evaluate_numeric(&expression, self.batch)?;
        let false_values = match false_expression {
            Some(expr) => VectorizedEvaluator::evaluate_numeric(&expr, self.batch)?,
            None => Float64Array::from(vec![0.0; self.batch.num_rows()]),
        };

        select(&mask, &true_values, &false_values)
    }
}

/// Picks `true_values[i]` where `mask[i]` holds and `false_values[i]` elsewhere.
///
/// # Errors
///
/// Returns an Arrow error if the three arrays differ in length.
pub fn select(
    mask: &BooleanArray,
    true_values: &Float64Array,
    false_values: &Float64Array,
) -> Result<Float64Array> {
    let selected = zip(mask, true_values, false_values)?;
    Ok(selected.as_primitive::<Float64Type>().clone())
}
