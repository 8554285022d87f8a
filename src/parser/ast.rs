//! Expression tree for the translated formula dialect.

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Reference to a dataset column.
    Column(String),
    /// Unary minus.
    Negate(Box<Expr>),
    /// Binary arithmetic.
    Arithmetic {
        left: Box<Expr>,
        op: ArithmeticOp,
        right: Box<Expr>,
    },
    /// Comparison producing a boolean mask.
    Comparison {
        left: Box<Expr>,
        op: ComparisonOp,
        right: Box<Expr>,
    },
    /// Elementwise `&` / `|` over boolean masks.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// Call of a vectorized function.
    Call { function: Function, args: Vec<Expr> },
}

impl Expr {
    /// Returns the dataset columns referenced by this expression, in order of appearance.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Negate(operand) => operand.collect_columns(out),
            Expr::Arithmetic { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::Logical { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    /// Parses an arithmetic operator from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(ArithmeticOp::Add),
            "-" => Some(ArithmeticOp::Sub),
            "*" => Some(ArithmeticOp::Mul),
            "/" => Some(ArithmeticOp::Div),
            "%" => Some(ArithmeticOp::Mod),
            _ => None,
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    /// Parses a comparison operator from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "==" => Some(ComparisonOp::Eq),
            "!=" => Some(ComparisonOp::Neq),
            "<" => Some(ComparisonOp::Lt),
            "<=" => Some(ComparisonOp::Lte),
            ">" => Some(ComparisonOp::Gt),
            ">=" => Some(ComparisonOp::Gte),
            _ => None,
        }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Vectorized functions available to formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Power,
    Log,
    Abs,
    Exp,
    Clip,
    Round,
}

impl Function {
    /// Looks up a function by its dialect name. Names are case-sensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Function::Sqrt),
            "power" => Some(Function::Power),
            "log" => Some(Function::Log),
            "abs" => Some(Function::Abs),
            "exp" => Some(Function::Exp),
            "clip" => Some(Function::Clip),
            "round" => Some(Function::Round),
            _ => None,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Power => "power",
            Function::Log => "log",
            Function::Abs => "abs",
            Function::Exp => "exp",
            Function::Clip => "clip",
            Function::Round => "round",
        }
    }

    /// Returns the accepted argument counts as an inclusive range.
    #[must_use]
    pub fn arity(self) -> (usize, usize) {
        match self {
            Function::Sqrt | Function::Log | Function::Abs | Function::Exp => (1, 1),
            Function::Power => (2, 2),
            Function::Clip => (3, 3),
            Function::Round => (1, 2),
        }
    }

    /// Returns true if `count` arguments are accepted.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        let (min, max) = self.arity();
        (min..=max).contains(&count)
    }
}
