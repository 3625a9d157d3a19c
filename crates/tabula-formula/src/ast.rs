//! Formula Abstract Syntax Tree types

use std::fmt;

use tabula_core::{encode, format_number, offset, Position, Range};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Text literal
    Text(String),

    /// Bare name, resolved through the context chain
    Identifier(String),

    // === References ===
    /// Single cell reference
    CellRef(Position),
    /// Range reference; endpoints are kept in source order
    RangeRef { start: Position, end: Position },

    // === Operators ===
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // === Function call ===
    Call { callee: Box<Expr>, args: Vec<Expr> },
}

/// Binding power of an operator, low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `=` `<>`
    Equality,
    /// `<` `<=` `>` `>=`
    Comparison,
    /// `&`
    Concat,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `^`
    Power,
    /// Unary `+` `-`
    Prefix,
    /// Calls, grouping and atoms
    Call,
}

impl Precedence {
    /// The next weaker binding power
    pub fn lower(self) -> Self {
        match self {
            Precedence::Lowest | Precedence::Equality => Precedence::Lowest,
            Precedence::Comparison => Precedence::Equality,
            Precedence::Concat => Precedence::Comparison,
            Precedence::Sum => Precedence::Concat,
            Precedence::Product => Precedence::Sum,
            Precedence::Power => Precedence::Product,
            Precedence::Prefix => Precedence::Power,
            Precedence::Call => Precedence::Prefix,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Negate => "-",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Text
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOperator::Equal | BinaryOperator::NotEqual => Precedence::Equality,
            BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => Precedence::Comparison,
            BinaryOperator::Concat => Precedence::Concat,
            BinaryOperator::Add | BinaryOperator::Subtract => Precedence::Sum,
            BinaryOperator::Multiply | BinaryOperator::Divide => Precedence::Product,
            BinaryOperator::Power => Precedence::Power,
        }
    }

    /// Only `^` groups to the right
    pub fn is_right_associative(&self) -> bool {
        matches!(self, BinaryOperator::Power)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self.precedence(),
            Precedence::Equality | Precedence::Comparison
        )
    }
}

impl Expr {
    // === Constructors ===

    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn text<S: Into<String>>(s: S) -> Self {
        Expr::Text(s.into())
    }

    pub fn identifier<S: Into<String>>(name: S) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Call of a named function
    pub fn call<S: Into<String>>(name: S, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(Expr::Identifier(name.into())),
            args,
        }
    }

    /// Binding power of this node when rendered as an operand
    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => Precedence::Prefix,
            _ => Precedence::Call,
        }
    }

    /// Clone the tree with every relative reference shifted
    ///
    /// This is what copying a formula from one cell to another does: `A2`
    /// moved by (1, 1) becomes `B3`, while `$A$2` stays put.
    pub fn offset(&self, rows: i64, columns: i64) -> Expr {
        match self {
            Expr::Number(_) | Expr::Text(_) | Expr::Identifier(_) => self.clone(),
            Expr::CellRef(position) => Expr::CellRef(offset(position, rows, columns)),
            Expr::RangeRef { start, end } => Expr::RangeRef {
                start: offset(start, rows, columns),
                end: offset(end, rows, columns),
            },
            Expr::Unary { op, operand } => Expr::unary(*op, operand.offset(rows, columns)),
            Expr::Binary { op, left, right } => Expr::binary(
                *op,
                left.offset(rows, columns),
                right.offset(rows, columns),
            ),
            Expr::Call { callee, args } => Expr::Call {
                callee: Box::new(callee.offset(rows, columns)),
                args: args.iter().map(|arg| arg.offset(rows, columns)).collect(),
            },
        }
    }

    /// Every cell and range the expression reads, cells as 1x1 ranges
    pub fn references(&self) -> Vec<Range> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<Range>) {
        match self {
            Expr::Number(_) | Expr::Text(_) | Expr::Identifier(_) => {}
            Expr::CellRef(position) => out.push(Range::single(position.clone())),
            Expr::RangeRef { start, end } => out.push(Range::new(start.clone(), end.clone())),
            Expr::Unary { operand, .. } => operand.collect_references(out),
            Expr::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Expr::Call { callee, args } => {
                callee.collect_references(out);
                for arg in args {
                    arg.collect_references(out);
                }
            }
        }
    }

    /// Render an indented debug tree, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        match self {
            Expr::Number(n) => out.push_str(&format!("Number({})\n", format_number(*n))),
            Expr::Text(s) => out.push_str(&format!("Text({:?})\n", s)),
            Expr::Identifier(name) => out.push_str(&format!("Identifier({})\n", name)),
            Expr::CellRef(position) => out.push_str(&format!("CellRef({})\n", encode(position))),
            Expr::RangeRef { start, end } => out.push_str(&format!(
                "RangeRef({}, {})\n",
                encode(start),
                encode(end)
            )),
            Expr::Unary { op, operand } => {
                out.push_str(&format!("Unary({})\n", op.symbol()));
                operand.dump_into(out, depth + 1);
            }
            Expr::Binary { op, left, right } => {
                out.push_str(&format!("Binary({})\n", op.symbol()));
                left.dump_into(out, depth + 1);
                right.dump_into(out, depth + 1);
            }
            Expr::Call { callee, args } => {
                out.push_str("Call\n");
                callee.dump_into(out, depth + 1);
                for arg in args {
                    arg.dump_into(out, depth + 1);
                }
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Formula text with the minimum parentheses needed to re-parse to the same tree
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", format_number(*n)),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::CellRef(position) => write!(f, "{}", encode(position)),
            Expr::RangeRef { start, end } => {
                write!(f, "{}:{}", encode(start), encode(&end.without_sheet()))
            }
            Expr::Unary { op, operand } => {
                write!(f, "{}", op.symbol())?;
                write_operand(f, operand, operand.precedence() < Precedence::Prefix)
            }
            Expr::Binary { op, left, right } => {
                let p = op.precedence();
                let right_assoc = op.is_right_associative();
                let left_parens =
                    left.precedence() < p || (left.precedence() == p && right_assoc);
                let right_parens =
                    right.precedence() < p || (right.precedence() == p && !right_assoc);

                write_operand(f, left, left_parens)?;
                write!(f, "{}", op.symbol())?;
                write_operand(f, right, right_parens)
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
