//! Parser for the translated formula dialect.
//!
//! The dialect is a closed grammar: numeric literals, the columns
//! `a`, `b`, `c`, `d`, arithmetic, comparisons, `&` / `|` and the
//! vectorized functions listed in [`ast::Function`].

pub mod ast;
mod grammar;

pub use ast::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp};
pub use grammar::parse_formula;
