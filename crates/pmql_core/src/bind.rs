//! Lowering of parsed syntax trees into flat op lists.

use std::sync::Arc;

use pmql_error::Result;
use pmql_parser::ast;

use crate::builder::Builder;
use crate::expression::Expression;
use crate::functions::FunctionPool;
use crate::ops::{BinaryOp, OpId, UnaryOp};
use crate::scalar::ScalarValue;

/// Parse expression text and compile it against the given function pool.
pub fn parse(input: &str, pool: Arc<FunctionPool>) -> Result<Expression> {
    let ast = pmql_parser::parse(input)?;
    let mut builder = Builder::new(pool);
    bind(&ast, &mut builder)?;
    builder.finish()
}

/// Append the ops for a syntax subtree to the builder, returning the id of
/// the subtree's root op.
pub fn bind(expr: &ast::Expr, builder: &mut Builder) -> Result<OpId> {
    match expr {
        ast::Expr::Literal(ast::Literal::Null) => Ok(builder.constant(ScalarValue::Null)),
        ast::Expr::Literal(ast::Literal::Typed { ty, raw }) => {
            Ok(builder.constant(ScalarValue::parse_typed(ty, raw)?))
        }
        ast::Expr::Variable(name) => Ok(builder.var(name)),
        ast::Expr::Unary { op, expr } => {
            let arg = bind(expr, builder)?;
            builder.unary(convert_unary(*op), arg)
        }
        ast::Expr::Binary { left, op, right } => {
            let left = bind(left, builder)?;
            let right = bind(right, builder)?;
            builder.binary(convert_binary(*op), left, right)
        }
        ast::Expr::If {
            cond,
            then_expr,
            else_expr,
        } => {
            let cond = bind(cond, builder)?;
            let then_op = bind(then_expr, builder)?;
            let else_op = bind(else_expr, builder)?;
            builder.branch(cond, then_op, else_op)
        }
        ast::Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| bind(arg, builder))
                .collect::<Result<Vec<_>>>()?;
            builder.call(name, args)
        }
    }
}

fn convert_unary(op: ast::UnaryOperator) -> UnaryOp {
    match op {
        ast::UnaryOperator::Negate => UnaryOp::Neg,
        ast::UnaryOperator::Not => UnaryOp::Not,
        ast::UnaryOperator::BitNot => UnaryOp::BitNot,
    }
}

fn convert_binary(op: ast::BinaryOperator) -> BinaryOp {
    match op {
        ast::BinaryOperator::Plus => BinaryOp::Add,
        ast::BinaryOperator::Minus => BinaryOp::Sub,
        ast::BinaryOperator::Multiply => BinaryOp::Mul,
        ast::BinaryOperator::Divide => BinaryOp::Div,
        ast::BinaryOperator::Modulo => BinaryOp::Rem,
        ast::BinaryOperator::Eq => BinaryOp::Eq,
        ast::BinaryOperator::NotEq => BinaryOp::NotEq,
        ast::BinaryOperator::Gt => BinaryOp::Gt,
        ast::BinaryOperator::Lt => BinaryOp::Lt,
        ast::BinaryOperator::GtEq => BinaryOp::GtEq,
        ast::BinaryOperator::LtEq => BinaryOp::LtEq,
        ast::BinaryOperator::And => BinaryOp::And,
        ast::BinaryOperator::Or => BinaryOp::Or,
        ast::BinaryOperator::BitwiseAnd => BinaryOp::BitAnd,
        ast::BinaryOperator::BitwiseOr => BinaryOp::BitOr,
        ast::BinaryOperator::BitwiseXor => BinaryOp::BitXor,
    }
}
