//! Rewrite of scalar math functions into their vectorized names.

use super::{is_word_char, word_end};

/// SQL function names and the vectorized functions they become.
const FUNCTION_NAMES: [(&str, &str); 5] = [
    ("SQRT", "sqrt"),
    ("POWER", "power"),
    ("LN", "log"),
    ("ABS", "abs"),
    ("ROUND", "round"),
];

/// `EXP` operands are clamped to this magnitude so the result stays finite.
const EXP_BOUND: &str = "700";

/// Rewrites math function calls in an arithmetic expression.
///
/// Names match case-insensitively and only as whole words followed by an
/// opening parenthesis, optionally after whitespace. `EXP(x)` becomes
/// `exp(clip(x, -700, 700))`. The result is trimmed.
#[must_use]
pub fn translate_expression(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    rewrite(&chars).trim().to_string()
}

fn rewrite(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        if !is_word_char(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let end = word_end(chars, i);
        let word: String = chars[i..end].iter().collect();
        i = end;

        let Some(open) = open_paren_after(chars, end) else {
            out.push_str(&word);
            continue;
        };

        if word.eq_ignore_ascii_case("EXP") {
            if let Some(close) = matching_paren(chars, open) {
                let operand = rewrite(&chars[open + 1..close]);
                out.push_str(&format!(
                    "exp(clip({}, -{EXP_BOUND}, {EXP_BOUND}))",
                    operand.trim()
                ));
                i = close + 1;
            } else {
                // Unbalanced; the parser reports it.
                out.push_str("exp(");
                i = open + 1;
            }
        } else if let Some(name) = vectorized_name(&word) {
            out.push_str(name);
            out.push('(');
            i = open + 1;
        } else {
            out.push_str(&word);
        }
    }

    out
}

fn vectorized_name(word: &str) -> Option<&'static str> {
    FUNCTION_NAMES
        .iter()
        .find(|(sql, _)| word.eq_ignore_ascii_case(sql))
        .map(|(_, name)| *name)
}

/// Index of the `(` following `pos`, skipping whitespace.
fn open_paren_after(chars: &[char], pos: usize) -> Option<usize> {
    let offset = chars[pos..].iter().position(|c| !c.is_whitespace())?;
    (chars[pos + offset] == '(').then_some(pos + offset)
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
