//! Immutable compiled expressions and their evaluation.

use std::fmt;
use std::sync::Arc;

use pmql_error::{PmqlError, Result};

use crate::context::Context;
use crate::functions::{Arguments, FunctionPool};
use crate::ops::{Op, OpId, eval};
use crate::scalar::ScalarValue;

/// A compiled, validated expression.
///
/// Expressions are immutable and hold no evaluation state. All mutable
/// state lives in a [`Context`], so a single expression can be evaluated
/// concurrently with independent contexts.
#[derive(Debug, Clone)]
pub struct Expression {
    ops: Vec<Op>,
    consts: Vec<ScalarValue>,
    pool: Arc<FunctionPool>,
}

impl Expression {
    pub(crate) fn new(ops: Vec<Op>, consts: Vec<ScalarValue>, pool: Arc<FunctionPool>) -> Self {
        debug_assert!(!ops.is_empty());
        Expression { ops, consts, pool }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn constants(&self) -> &[ScalarValue] {
        &self.consts
    }

    pub fn pool(&self) -> &Arc<FunctionPool> {
        &self.pool
    }

    /// Id of the root op.
    pub fn root(&self) -> OpId {
        self.ops.len() - 1
    }

    /// Create a fresh evaluation context. With `cache` enabled, op results
    /// are reused across evaluations until an involved variable changes.
    pub fn context(&self, cache: bool) -> Context {
        Context::new(&self.ops, cache)
    }

    /// Evaluate the expression down from the root.
    ///
    /// Errors are part of the outcome: a failed subtree poisons everything
    /// that needs it, but a ternary that branches away from the failure
    /// still succeeds.
    pub fn eval(&self, ctx: &mut Context) -> Result<ScalarValue> {
        let root = self.root();
        self.eval_op(root, ctx);
        ctx.results().get(root).clone()
    }

    /// Evaluate a single op, storing its outcome in the context. Skips ops
    /// whose cached outcome is still valid.
    pub(crate) fn eval_op(&self, id: OpId, ctx: &mut Context) {
        if ctx.results().is_valid(id) {
            return;
        }

        let outcome = match &self.ops[id] {
            Op::Const { sub } => Ok(self.consts[*sub].clone()),
            Op::Var { sub, name } => match ctx.substitutions()[*sub].value() {
                Some(value) => Ok(value.clone()),
                None => Err(PmqlError::new("Variable has no value").with_field("name", name)),
            },
            Op::Unary { op, arg } => match self.argument(id, *arg, ctx) {
                Ok(value) => eval::apply_unary(*op, &value),
                Err(err) => Err(err),
            },
            Op::Binary { op, left, right } => match self.argument(id, *left, ctx) {
                Ok(left) => match self.argument(id, *right, ctx) {
                    Ok(right) => eval::apply_binary(*op, &left, &right),
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            },
            Op::Ternary {
                cond,
                then_op,
                else_op,
            } => match self.argument(id, *cond, ctx) {
                Ok(cond) => match cond.truthiness() {
                    Ok(true) => self.argument(id, *then_op, ctx),
                    Ok(false) => self.argument(id, *else_op, ctx),
                    Err(err) => Err(PmqlError::new_with_source(
                        format!("Operation {} got a bad condition", self.ops[id]),
                        err,
                    )),
                },
                Err(err) => Err(err),
            },
            Op::Call { name, fun, args } => {
                let mut call_args = Arguments::new(self, ctx, args);
                self.pool.invoke(*fun, &mut call_args).map_err(|err| {
                    PmqlError::new_with_source(
                        format!("Extension function '@{name}' failed"),
                        err,
                    )
                })
            }
        };

        ctx.results_mut().store(id, outcome);
    }

    /// Evaluate an argument op and hand back its value, wrapping failures
    /// with the referring op for context.
    fn argument(&self, of: OpId, arg: OpId, ctx: &mut Context) -> Result<ScalarValue> {
        self.eval_op(arg, ctx);
        match ctx.results().get(arg) {
            Ok(value) => Ok(value.clone()),
            Err(err) => Err(PmqlError::new_with_source(
                format!("Operation {} failed to get argument #{arg}", self.ops[of]),
                err.clone(),
            )),
        }
    }

    /// Pair the expression with a context for display, showing each op
    /// next to its current outcome.
    pub fn log<'a>(&'a self, ctx: &'a Context) -> EvaluationLog<'a> {
        EvaluationLog { expr: self, ctx }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.consts.is_empty() {
            writeln!(f, "Constants:")?;
            for (sub, value) in self.consts.iter().enumerate() {
                writeln!(f, "  _{sub}: {value}")?;
            }
        }
        if !self.pool.is_empty() {
            writeln!(f, "Extension functions:")?;
            for name in self.pool.names() {
                writeln!(f, "  @{name}")?;
            }
        }
        writeln!(f, "Operations:")?;
        for (id, op) in self.ops.iter().enumerate() {
            writeln!(f, "  #{id}: {op}")?;
        }
        Ok(())
    }
}

/// Display adapter showing per-op outcomes alongside the op list.
pub struct EvaluationLog<'a> {
    expr: &'a Expression,
    ctx: &'a Context,
}

impl fmt::Display for EvaluationLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, op) in self.expr.ops.iter().enumerate() {
            write!(f, "#{id}: {op} = ")?;
            match self.ctx.results().slot(id) {
                Some(Ok(value)) => writeln!(f, "{value}")?,
                Some(Err(err)) => writeln!(f, "error: {}", err.message())?,
                None => writeln!(f, "<not evaluated>")?,
            }
        }
        Ok(())
    }
}
