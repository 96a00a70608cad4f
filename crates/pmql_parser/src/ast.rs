use std::fmt;

use pmql_error::Result;

use crate::parser::Parser;

/// Types that can be parsed from a token stream.
pub trait AstParseable: Sized {
    fn parse(parser: &mut Parser) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation, e.g. `(-${a})`
    Negate,
    /// Logical not, e.g. `(!${a})`
    Not,
    /// Bitwise not, e.g. `(~${a})`
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Plus, e.g. `(a + b)`
    Plus,
    /// Minus, e.g. `(a - b)`
    Minus,
    /// Multiply, e.g. `(a * b)`
    Multiply,
    /// Divide, e.g. `(a / b)`
    Divide,
    /// Modulo, e.g. `(a % b)`
    Modulo,
    /// Equal, e.g. `(a == b)`
    Eq,
    /// Not equal, e.g. `(a != b)`
    NotEq,
    /// Greater than, e.g. `(a > b)`
    Gt,
    /// Less than, e.g. `(a < b)`
    Lt,
    /// Greater equal, e.g. `(a >= b)`
    GtEq,
    /// Less equal, e.g. `(a <= b)`
    LtEq,
    /// Logical and, e.g. `(a && b)`
    And,
    /// Logical or, e.g. `(a || b)`
    Or,
    /// Bitwise and, e.g. `(a & b)`
    BitwiseAnd,
    /// Bitwise or, e.g. `(a | b)`
    BitwiseOr,
    /// Bitwise xor, e.g. `(a ^ b)`
    BitwiseXor,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Typed value with an unparsed payload, e.g. `int{42}`.
    Typed { ty: String, raw: String },
    /// The `null` literal.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// An expression literal.
    Literal(Literal),
    /// Variable reference, e.g. `${a}`.
    Variable(String),
    /// A parenthesized unary expression.
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    /// A parenthesized binary expression.
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Condition, e.g. `if(${c}, ${a}, ${b})`.
    If {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// Extension function call, e.g. `@avail(${a}, int{0})`.
    Call { name: String, args: Vec<Expr> },
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::BitNot => write!(f, "~"),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Plus => write!(f, "+"),
            BinaryOperator::Minus => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Modulo => write!(f, "%"),
            BinaryOperator::Eq => write!(f, "=="),
            BinaryOperator::NotEq => write!(f, "!="),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::GtEq => write!(f, ">="),
            BinaryOperator::LtEq => write!(f, "<="),
            BinaryOperator::And => write!(f, "&&"),
            BinaryOperator::Or => write!(f, "||"),
            BinaryOperator::BitwiseAnd => write!(f, "&"),
            BinaryOperator::BitwiseOr => write!(f, "|"),
            BinaryOperator::BitwiseXor => write!(f, "^"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Typed { ty, raw }) => write!(f, "{ty}{{{raw}}}"),
            Expr::Literal(Literal::Null) => write!(f, "null"),
            Expr::Variable(name) => write!(f, "${{{name}}}"),
            Expr::Unary { op, expr } => write!(f, "({op}{expr})"),
            Expr::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::If {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "if({cond}, {then_expr}, {else_expr})"),
            Expr::Call { name, args } => {
                write!(f, "@{name}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
