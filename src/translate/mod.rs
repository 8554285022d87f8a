//! Textual rewrite of SQL-flavored formulas into the vectorized dialect.
//!
//! Translation is a best-effort, single-pass rewrite that never fails.
//! Anything it does not recognise is copied through unchanged and rejected
//! later by the parser or the evaluator.
//!
//! # Example
//!
//! ```
//! use vecform::translate::{translate_condition, translate_expression};
//!
//! assert_eq!(translate_expression("SQRT(a) + Ln(b)"), "sqrt(a) + log(b)");
//! assert_eq!(translate_condition("a = 1 AND b <> 2"), "a == 1 & b != 2");
//! ```

mod condition;
mod expression;

pub use condition::translate_condition;
pub use expression::translate_expression;

use crate::types::{Formula, FormulaId};

/// The translated text of one formula, ready for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFormula {
    /// Id of the source formula.
    pub formula_id: FormulaId,
    /// Translated true-branch expression.
    pub expression: String,
    /// Translated condition, if the formula has one.
    pub condition: Option<String>,
    /// Translated false-branch expression. Always `None` without a condition.
    pub false_expression: Option<String>,
}

/// Translates every textual field of a formula.
///
/// Blank conditions and false-expressions count as absent. Conditions go
/// through the function rewrite as well, so math functions may appear in
/// predicates.
#[must_use]
pub fn translate_formula(formula: &Formula) -> TranslatedFormula {
    let condition = non_blank(formula.condition.as_deref())
        .map(|cond| translate_condition(&translate_expression(cond)));
    let false_expression = if condition.is_some() {
        non_blank(formula.false_expression.as_deref()).map(translate_expression)
    } else {
        None
    };

    TranslatedFormula {
        formula_id: formula.id,
        expression: translate_expression(&formula.expression),
        condition,
        false_expression,
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Returns true for characters that form identifiers and number literals.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns the end index (exclusive) of the word starting at `start`.
pub(crate) fn word_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|c| !is_word_char(*c))
        .map_or(chars.len(), |offset| start + offset)
}
