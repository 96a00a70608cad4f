//! Flat operation nodes making up a compiled expression.
//!
//! An expression is a vector of ops forming a DAG. Ops refer to earlier ops
//! by index, the last op is the root. `Const` and `Var` hold indexes into
//! the constant pool and the substitution list respectively, not op ids.

pub mod eval;

use std::fmt;

use serde::{Deserialize, Serialize};

pub type OpId = usize;

/// Index of an extension function within its pool.
pub type FunId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation, `-`.
    Neg,
    /// Logical not, `!`.
    Not,
    /// Bitwise not, `~`.
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
            UnaryOp::BitNot => "bnot",
        }
    }
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::Eq => "eq",
            BinaryOp::NotEq => "neq",
            BinaryOp::Gt => "gt",
            BinaryOp::Lt => "lt",
            BinaryOp::GtEq => "gteq",
            BinaryOp::LtEq => "lteq",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::BitAnd => "band",
            BinaryOp::BitOr => "bor",
            BinaryOp::BitXor => "bxor",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// A constant. `sub` indexes the expression's constant pool.
    Const { sub: usize },
    /// A variable. `sub` indexes the context's substitution list.
    Var { sub: usize, name: String },
    Unary {
        op: UnaryOp,
        arg: OpId,
    },
    Binary {
        op: BinaryOp,
        left: OpId,
        right: OpId,
    },
    /// Conditional with lazy branches. Only the taken branch is evaluated.
    Ternary {
        cond: OpId,
        then_op: OpId,
        else_op: OpId,
    },
    /// Extension function call. `fun` indexes the pool, `name` is kept for
    /// display and for re-resolving the function on load.
    Call {
        name: String,
        fun: FunId,
        args: Vec<OpId>,
    },
}

impl Op {
    /// Visit every op id this op refers to. Substitution indexes of `Const`
    /// and `Var` are not op ids and are not visited.
    pub fn refers(&self, mut visit: impl FnMut(OpId)) {
        match self {
            Op::Const { .. } | Op::Var { .. } => {}
            Op::Unary { arg, .. } => visit(*arg),
            Op::Binary { left, right, .. } => {
                visit(*left);
                visit(*right);
            }
            Op::Ternary {
                cond,
                then_op,
                else_op,
            } => {
                visit(*cond);
                visit(*then_op);
                visit(*else_op);
            }
            Op::Call { args, .. } => {
                for arg in args {
                    visit(*arg);
                }
            }
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Const { sub } => write!(f, "const(_{sub})"),
            Op::Var { sub, name } => write!(f, "{name}(${sub})"),
            Op::Unary { op, arg } => write!(f, "{op}(#{arg})"),
            Op::Binary { op, left, right } => write!(f, "{op}(#{left}, #{right})"),
            Op::Ternary {
                cond,
                then_op,
                else_op,
            } => write!(f, "if(#{cond} ? #{then_op} : #{else_op})"),
            Op::Call { name, args, .. } => {
                write!(f, "@{name}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "#{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_notation() {
        assert_eq!("const(_0)", Op::Const { sub: 0 }.to_string());
        assert_eq!(
            "a($0)",
            Op::Var {
                sub: 0,
                name: "a".to_string()
            }
            .to_string()
        );
        assert_eq!(
            "add(#1, #2)",
            Op::Binary {
                op: BinaryOp::Add,
                left: 1,
                right: 2
            }
            .to_string()
        );
        assert_eq!(
            "if(#0 ? #1 : #2)",
            Op::Ternary {
                cond: 0,
                then_op: 1,
                else_op: 2
            }
            .to_string()
        );
        assert_eq!(
            "@avail(#0, #1)",
            Op::Call {
                name: "avail".to_string(),
                fun: 0,
                args: vec![0, 1]
            }
            .to_string()
        );
    }

    #[test]
    fn refers_skips_substitutions() {
        let mut seen = Vec::new();
        Op::Const { sub: 3 }.refers(|id| seen.push(id));
        Op::Var {
            sub: 1,
            name: "x".to_string(),
        }
        .refers(|id| seen.push(id));
        assert!(seen.is_empty());

        Op::Ternary {
            cond: 0,
            then_op: 1,
            else_op: 2,
        }
        .refers(|id| seen.push(id));
        assert_eq!(vec![0, 1, 2], seen);
    }
}
