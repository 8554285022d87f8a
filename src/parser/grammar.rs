//! Pest parser integration for the formula dialect grammar.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{Result, VecformError};
use crate::parser::ast::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp};

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct FormulaParser;

/// Parses translated formula text into an expression tree.
///
/// # Errors
///
/// Returns a `ParseError` if the text is syntactically invalid,
/// `UnknownFunction` for a call outside the vectorized set, and
/// `ArityMismatch` for a call with the wrong number of arguments.
pub fn parse_formula(text: &str) -> Result<Expr> {
    let pairs = FormulaParser::parse(Rule::formula, text).map_err(|e| {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c))
            | pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        VecformError::ParseError {
            line,
            col,
            message: e.variant.message().to_string(),
        }
    })?;

    for pair in pairs {
        if pair.as_rule() == Rule::formula {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::expr {
                    return build_node(inner);
                }
            }
        }
    }
    Err(VecformError::ParseError {
        line: 0,
        col: 0,
        message: "No expression found".into(),
    })
}

fn parse_error(pair: &Pair<Rule>, message: impl Into<String>) -> VecformError {
    let (line, col) = pair.as_span().start_pos().line_col();
    VecformError::ParseError {
        line,
        col,
        message: message.into(),
    }
}

fn build_node(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::expr | Rule::conjunction | Rule::comparison | Rule::sum | Rule::product => {
            build_chain(pair)
        }
        Rule::unary => build_unary(pair),
        Rule::primary => build_primary(pair),
        _ => Err(parse_error(&pair, format!("Unexpected {:?}", pair.as_rule()))),
    }
}

/// Folds `operand (op operand)*` left to right.
fn build_chain(pair: Pair<Rule>) -> Result<Expr> {
    let err = parse_error(&pair, "Missing operand");
    let mut parts = pair.into_inner();
    let mut left = build_node(parts.next().ok_or(err)?)?;

    while let Some(op) = parts.next() {
        let right_pair = parts
            .next()
            .ok_or_else(|| parse_error(&op, "Operator without right operand"))?;
        let right = Box::new(build_node(right_pair)?);
        let left_box = Box::new(left);

        left = match op.as_rule() {
            Rule::or_op => Expr::Logical {
                left: left_box,
                op: LogicalOp::Or,
                right,
            },
            Rule::and_op => Expr::Logical {
                left: left_box,
                op: LogicalOp::And,
                right,
            },
            Rule::cmp_op => Expr::Comparison {
                left: left_box,
                op: ComparisonOp::parse(op.as_str()).ok_or_else(|| {
                    parse_error(&op, format!("Unknown operator: {}", op.as_str()))
                })?,
                right,
            },
            Rule::add_op | Rule::mul_op => Expr::Arithmetic {
                left: left_box,
                op: ArithmeticOp::parse(op.as_str()).ok_or_else(|| {
                    parse_error(&op, format!("Unknown operator: {}", op.as_str()))
                })?,
                right,
            },
            _ => return Err(parse_error(&op, "Expected operator")),
        };
    }

    Ok(left)
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr> {
    let err = parse_error(&pair, "Missing operand");
    let mut negations = 0usize;
    let mut operand = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sign_op => {
                if inner.as_str() == "-" {
                    negations += 1;
                }
            }
            _ => operand = Some(build_node(inner)?),
        }
    }

    let operand = operand.ok_or(err)?;
    if negations % 2 == 1 {
        Ok(Expr::Negate(Box::new(operand)))
    } else {
        Ok(operand)
    }
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr> {
    let err = parse_error(&pair, "Empty primary expression");
    let inner = pair.into_inner().next().ok_or(err)?;

    match inner.as_rule() {
        Rule::number => {
            let value: f64 = inner
                .as_str()
                .parse()
                .map_err(|_| parse_error(&inner, format!("Invalid number: {}", inner.as_str())))?;
            Ok(Expr::Number(value))
        }
        Rule::identifier => Ok(Expr::Column(inner.as_str().to_string())),
        Rule::call => build_call(inner),
        Rule::expr => build_node(inner),
        _ => Err(parse_error(&inner, "Invalid primary expression")),
    }
}

fn build_call(pair: Pair<Rule>) -> Result<Expr> {
    let err = parse_error(&pair, "Missing function name");
    let mut parts = pair.into_inner();
    let name = parts.next().ok_or(err)?.as_str().to_string();
    let function =
        Function::parse(&name).ok_or_else(|| VecformError::UnknownFunction(name.clone()))?;

    let mut args = Vec::new();
    if let Some(arguments) = parts.next() {
        for arg in arguments.into_inner() {
            args.push(build_node(arg)?);
        }
    }

    if !function.accepts(args.len()) {
        let (min, max) = function.arity();
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        return Err(VecformError::ArityMismatch {
            function: name,
            expected,
            actual: args.len(),
        });
    }

    Ok(Expr::Call { function, args })
}
