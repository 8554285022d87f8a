//! Replacement of non-finite evaluation results.

use arrow::array::Float64Array;
use arrow::datatypes::Float64Type;

/// Substitute for `+inf`.
pub const POSITIVE_SENTINEL: f64 = 1e10;

/// Substitute for `-inf`.
pub const NEGATIVE_SENTINEL: f64 = -POSITIVE_SENTINEL;

/// Maps NaN to `0.0` and infinities to the sentinels; finite values pass through.
#[must_use]
pub fn sanitize_value(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value.is_infinite() {
        if value > 0.0 {
            POSITIVE_SENTINEL
        } else {
            NEGATIVE_SENTINEL
        }
    } else {
        value
    }
}

/// Returns a new array in which every value is finite.
#[must_use]
pub fn sanitize(values: &Float64Array) -> Float64Array {
    values.unary::<_, Float64Type>(sanitize_value)
}
