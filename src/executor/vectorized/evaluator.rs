//! Vectorized expression evaluator.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array};
use arrow::compute::cast;
use arrow::compute::kernels::arity::binary;
use arrow::compute::kernels::boolean::{and, or};
use arrow::compute::kernels::numeric::{add, div, mul, sub};
use arrow::datatypes::{DataType as ArrowDataType, Float64Type};

use crate::error::{Result, VecformError};
use crate::parser::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp};

use super::batch::ColumnBatch;

/// Vectorized expression evaluator.
///
/// Walks an [`Expr`] tree over the columns of a [`ColumnBatch`]. Every node
/// yields a fresh array of `batch.num_rows()` values, either `Float64` or
/// `Boolean`. Floating-point degeneracy (division by zero, domain errors,
/// overflow) never fails; it produces IEEE NaN and infinities.
pub struct VectorizedEvaluator;

impl VectorizedEvaluator {
    /// Evaluates an expression against a batch.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` for identifiers outside the dataset columns and
    /// `TypeError` when `&` or `|` is applied to a numeric operand.
    pub fn evaluate(expr: &Expr, batch: &ColumnBatch) -> Result<ArrayRef> {
        match expr {
            Expr::Number(value) => Ok(Arc::new(Float64Array::from(vec![*value; batch.num_rows()]))),
            Expr::Column(name) => batch
                .column(name)
                .map(|col| Arc::new(col.clone()) as ArrayRef)
                .ok_or_else(|| VecformError::UnknownColumn(name.clone())),
            Expr::Negate(operand) => {
                let values = Self::evaluate_numeric(operand, batch)?;
                Ok(Arc::new(values.unary::<_, Float64Type>(|v| -v)))
            }
            Expr::Arithmetic { left, op, right } => {
                let left_arr = Self::evaluate_numeric(left, batch)?;
                let right_arr = Self::evaluate_numeric(right, batch)?;
                Self::arithmetic(&left_arr, *op, &right_arr)
            }
            Expr::Comparison { left, op, right } => {
                let left_arr = Self::evaluate_numeric(left, batch)?;
                let right_arr = Self::evaluate_numeric(right, batch)?;
                Ok(Arc::new(Self::compare(&left_arr, *op, &right_arr)))
            }
            Expr::Logical { left, op, right } => {
                let left_arr = Self::evaluate_boolean(left, batch, *op)?;
                let right_arr = Self::evaluate_boolean(right, batch, *op)?;
                let result = match op {
                    LogicalOp::And => and(&left_arr, &right_arr)?,
                    LogicalOp::Or => or(&left_arr, &right_arr)?,
                };
                Ok(Arc::new(result))
            }
            Expr::Call { function, args } => Self::call(*function, args, batch),
        }
    }

    /// Evaluates an expression to numbers; boolean results become `1.0` / `0.0`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn evaluate_numeric(expr: &Expr, batch: &ColumnBatch) -> Result<Float64Array> {
        let arr = Self::evaluate(expr, batch)?;
        match arr.data_type() {
            ArrowDataType::Float64 => Ok(arr.as_primitive::<Float64Type>().clone()),
            ArrowDataType::Boolean => {
                let numeric = cast(&arr, &ArrowDataType::Float64)?;
                Ok(numeric.as_primitive::<Float64Type>().clone())
            }
            other => Err(VecformError::TypeError {
                expected: "numeric".into(),
                actual: format!("{other:?}"),
            }),
        }
    }

    /// Evaluates an expression to a row mask.
    ///
    /// Numeric results are coerced per row: any non-zero value, NaN
    /// included, is `true`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn evaluate_mask(expr: &Expr, batch: &ColumnBatch) -> Result<BooleanArray> {
        let arr = Self::evaluate(expr, batch)?;
        match arr.data_type() {
            ArrowDataType::Boolean => Ok(arr.as_boolean().clone()),
            ArrowDataType::Float64 => Ok(BooleanArray::from_unary(
                arr.as_primitive::<Float64Type>(),
                |v| v != 0.0,
            )),
            other => Err(VecformError::TypeError {
                expected: "boolean".into(),
                actual: format!("{other:?}"),
            }),
        }
    }

    /// Evaluates an operand of `&` / `|`, which must already be boolean.
    fn evaluate_boolean(expr: &Expr, batch: &ColumnBatch, op: LogicalOp) -> Result<BooleanArray> {
        let arr = Self::evaluate(expr, batch)?;
        if arr.data_type() == &ArrowDataType::Boolean {
            Ok(arr.as_boolean().clone())
        } else {
            let symbol = match op {
                LogicalOp::And => "&",
                LogicalOp::Or => "|",
            };
            Err(VecformError::TypeError {
                expected: format!("boolean operand for {symbol}"),
                actual: format!("{:?}", arr.data_type()),
            })
        }
    }

    /// Performs arithmetic on two arrays.
    fn arithmetic(
        left: &Float64Array,
        op: ArithmeticOp,
        right: &Float64Array,
    ) -> Result<ArrayRef> {
        let result: ArrayRef = match op {
            ArithmeticOp::Add => add(left, right)?,
            ArithmeticOp::Sub => sub(left, right)?,
            ArithmeticOp::Mul => mul(left, right)?,
            ArithmeticOp::Div => div(left, right)?,
            ArithmeticOp::Mod => Arc::new(binary::<_, _, _, Float64Type>(
                left,
                right,
                floored_mod,
            )?),
        };
        Ok(result)
    }

    /// Compares two arrays with IEEE semantics: NaN is unequal to everything.
    fn compare(left: &Float64Array, op: ComparisonOp, right: &Float64Array) -> BooleanArray {
        match op {
            ComparisonOp::Eq => BooleanArray::from_binary(left, right, |a, b| a == b),
            ComparisonOp::Neq => BooleanArray::from_binary(left, right, |a, b| a != b),
            ComparisonOp::Lt => BooleanArray::from_binary(left, right, |a, b| a < b),
            ComparisonOp::Lte => BooleanArray::from_binary(left, right, |a, b| a <= b),
            ComparisonOp::Gt => BooleanArray::from_binary(left, right, |a, b| a > b),
            ComparisonOp::Gte => BooleanArray::from_binary(left, right, |a, b| a >= b),
        }
    }

    /// Evaluates a vectorized function call.
    fn call(function: Function, args: &[Expr], batch: &ColumnBatch) -> Result<ArrayRef> {
        if !function.accepts(args.len()) {
            return Err(VecformError::ArityMismatch {
                function: function.name().to_string(),
                expected: format!("{:?}", function.arity()),
                actual: args.len(),
            });
        }

        let values = args
            .iter()
            .map(|arg| Self::evaluate_numeric(arg, batch))
            .collect::<Result<Vec<_>>>()?;

        let result = match (function, values.as_slice()) {
            (Function::Sqrt, [x]) => x.unary::<_, Float64Type>(f64::sqrt),
            (Function::Log, [x]) => x.unary::<_, Float64Type>(f64::ln),
            (Function::Abs, [x]) => x.unary::<_, Float64Type>(f64::abs),
            (Function::Exp, [x]) => x.unary::<_, Float64Type>(f64::exp),
            (Function::Round, [x]) => x.unary::<_, Float64Type>(f64::round_ties_even),
            (Function::Round, [x, decimals]) => {
                binary::<_, _, _, Float64Type>(x, decimals, round_to_decimals)?
            }
            (Function::Power, [base, exponent]) => {
                binary::<_, _, _, Float64Type>(base, exponent, f64::powf)?
            }
            (Function::Clip, [x, lo, hi]) => clip(x, lo, hi),
            _ => {
                return Err(VecformError::InvalidExpression(format!(
                    "Unsupported call to {}",
                    function.name()
                )))
            }
        };
        Ok(Arc::new(result))
    }
}

/// Modulo whose result takes the sign of the divisor.
fn floored_mod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) {
        r + y
    } else {
        r
    }
}

/// Rounds half to even at `decimals` places; negative places round left of the point.
fn round_to_decimals(x: f64, decimals: f64) -> f64 {
    let places = decimals as i32;
    if places >= 0 {
        let scale = 10f64.powi(places);
        (x * scale).round_ties_even() / scale
    } else {
        let scale = 10f64.powi(-places);
        (x / scale).round_ties_even() * scale
    }
}

/// Bounds every value to `[lo, hi]`; NaN in any input yields NaN.
fn clip(values: &Float64Array, lo: &Float64Array, hi: &Float64Array) -> Float64Array {
    let clipped: Vec<f64> = values
        .values()
        .iter()
        .zip(lo.values().iter())
        .zip(hi.values().iter())
        .map(|((&x, &lo), &hi)| {
            if x.is_nan() || lo.is_nan() || hi.is_nan() {
                f64::NAN
            } else {
                x.max(lo).min(hi)
            }
        })
        .collect();
    Float64Array::from(clipped)
}
