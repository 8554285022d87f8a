//! Rewrite of boolean connectives and comparison operators.

use super::{is_word_char, word_end};

/// Rewrites a predicate into the vectorized boolean dialect.
///
/// A single left-to-right pass with longest-match operators:
///
/// - the words `AND` / `OR` (any case) become `&` / `|`
/// - `<>` becomes `!=`
/// - `==`, `!=`, `<=` and `>=` are kept
/// - any other `=` becomes `==`
///
/// The result is trimmed.
#[must_use]
pub fn translate_condition(cond: &str) -> String {
    let chars: Vec<char> = cond.chars().collect();
    let mut out = String::with_capacity(chars.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if is_word_char(c) {
            let end = word_end(&chars, i);
            let word: String = chars[i..end].iter().collect();
            if word.eq_ignore_ascii_case("AND") {
                out.push('&');
            } else if word.eq_ignore_ascii_case("OR") {
                out.push('|');
            } else {
                out.push_str(&word);
            }
            i = end;
            continue;
        }

        match (c, chars.get(i + 1).copied()) {
            ('<', Some('>')) => {
                out.push_str("!=");
                i += 2;
            }
            ('=' | '!' | '<' | '>', Some('=')) => {
                out.push(c);
                out.push('=');
                i += 2;
            }
            ('=', _) => {
                out.push_str("==");
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.trim().to_string()
}
