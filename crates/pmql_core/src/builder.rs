//! Incremental expression construction with validation.

use std::collections::HashMap;
use std::sync::Arc;

use pmql_error::{PmqlError, Result};
use tracing::debug;

use crate::expression::Expression;
use crate::functions::FunctionPool;
use crate::ops::{BinaryOp, Op, OpId, UnaryOp};
use crate::scalar::ScalarValue;

/// Builds the flat op list of an expression bottom-up.
///
/// Identical ops are deduplicated, so the result is a DAG: `((a + b) *
/// (a + b))` stores the addition once. Structural errors (references to
/// ops that don't exist yet, unknown functions) are caught at insertion,
/// the rest at [`finish`].
///
/// [`finish`]: Builder::finish
#[derive(Debug)]
pub struct Builder {
    ops: Vec<Op>,
    consts: Vec<ScalarValue>,
    pool: Arc<FunctionPool>,
    dedup: HashMap<Op, OpId, ahash::RandomState>,
    vars_byname: HashMap<String, OpId, ahash::RandomState>,
}

impl Builder {
    pub fn new(pool: Arc<FunctionPool>) -> Self {
        Builder {
            ops: Vec::new(),
            consts: Vec::new(),
            pool,
            dedup: HashMap::default(),
            vars_byname: HashMap::default(),
        }
    }

    /// Rebuild a builder from previously extracted parts, e.g. when loading
    /// a serialized expression. All insertion-time checks are replayed.
    pub fn from_parts(
        consts: Vec<ScalarValue>,
        ops: Vec<Op>,
        pool: Arc<FunctionPool>,
    ) -> Result<Builder> {
        let mut builder = Builder::new(pool);
        builder.consts = consts;

        for op in ops {
            match &op {
                Op::Const { sub } => {
                    if *sub >= builder.consts.len() {
                        return Err(PmqlError::new("Constant index out of range")
                            .with_field("sub", *sub)
                            .with_field("count", builder.consts.len()));
                    }
                }
                Op::Var { sub, name } => {
                    if *sub != builder.vars_byname.len() {
                        return Err(PmqlError::new("Non-sequential variable index")
                            .with_field("sub", *sub)
                            .with_field("name", name));
                    }
                    if builder.vars_byname.contains_key(name) {
                        return Err(
                            PmqlError::new("Duplicate variable").with_field("name", name)
                        );
                    }
                    builder.vars_byname.insert(name.clone(), builder.ops.len());
                }
                Op::Call { name, fun, .. } => {
                    let resolved = builder.pool.lookup(name)?;
                    if resolved != *fun {
                        return Err(PmqlError::new("Extension function id mismatch")
                            .with_field("name", name)
                            .with_field("stored", *fun)
                            .with_field("resolved", resolved));
                    }
                    builder.check_refs(&op)?;
                }
                _ => builder.check_refs(&op)?,
            }

            let id = builder.ops.len();
            builder.dedup.entry(op.clone()).or_insert(id);
            builder.ops.push(op);
        }

        Ok(builder)
    }

    /// Add a constant. Every call creates a distinct constant slot.
    pub fn constant(&mut self, value: impl Into<ScalarValue>) -> OpId {
        let sub = self.consts.len();
        self.consts.push(value.into());
        self.append(Op::Const { sub })
    }

    /// Add a variable. Adding the same name twice returns the existing op.
    pub fn var(&mut self, name: &str) -> OpId {
        if let Some(id) = self.vars_byname.get(name) {
            return *id;
        }

        let id = self.append(Op::Var {
            sub: self.vars_byname.len(),
            name: name.to_string(),
        });
        self.vars_byname.insert(name.to_string(), id);
        id
    }

    pub fn unary(&mut self, op: UnaryOp, arg: OpId) -> Result<OpId> {
        let op = Op::Unary { op, arg };
        self.check_refs(&op)?;
        Ok(self.append(op))
    }

    pub fn binary(&mut self, op: BinaryOp, left: OpId, right: OpId) -> Result<OpId> {
        let op = Op::Binary { op, left, right };
        self.check_refs(&op)?;
        Ok(self.append(op))
    }

    /// Add a conditional. Branch evaluation is lazy, only the branch the
    /// condition picks runs.
    pub fn branch(&mut self, cond: OpId, then_op: OpId, else_op: OpId) -> Result<OpId> {
        let op = Op::Ternary {
            cond,
            then_op,
            else_op,
        };
        self.check_refs(&op)?;
        Ok(self.append(op))
    }

    /// Add an extension function call. The name must resolve in the pool
    /// the builder was created with.
    pub fn call(&mut self, name: &str, args: Vec<OpId>) -> Result<OpId> {
        let fun = self.pool.lookup(name)?;
        let op = Op::Call {
            name: name.to_string(),
            fun,
            args,
        };
        self.check_refs(&op)?;
        Ok(self.append(op))
    }

    /// Validate and seal the expression. The last op added becomes the
    /// root; every op must be reachable from it.
    pub fn finish(self) -> Result<Expression> {
        if self.ops.is_empty() {
            return Err(PmqlError::new("Cannot build an empty expression"));
        }

        let mut visited = vec![false; self.ops.len()];
        self.visit(self.ops.len() - 1, &mut visited)?;

        if let Some(id) = visited.iter().position(|v| !v) {
            return Err(PmqlError::new("Operation is not reachable from the root")
                .with_field("op", &self.ops[id])
                .with_field("id", id));
        }

        debug!(
            ops = self.ops.len(),
            consts = self.consts.len(),
            vars = self.vars_byname.len(),
            "built expression"
        );
        Ok(Expression::new(self.ops, self.consts, self.pool))
    }

    fn append(&mut self, op: Op) -> OpId {
        if let Some(id) = self.dedup.get(&op) {
            return *id;
        }

        let id = self.ops.len();
        self.dedup.insert(op.clone(), id);
        self.ops.push(op);
        id
    }

    /// Each referenced op must already exist, which also rules out forward
    /// and self references.
    fn check_refs(&self, op: &Op) -> Result<()> {
        let mut bad = None;
        op.refers(|arg| {
            if arg >= self.ops.len() && bad.is_none() {
                bad = Some(arg);
            }
        });

        match bad {
            Some(arg) => Err(PmqlError::new("Reference to an unknown operation")
                .with_field("arg", arg)
                .with_field("count", self.ops.len())),
            None => Ok(()),
        }
    }

    fn visit(&self, id: OpId, visited: &mut [bool]) -> Result<()> {
        if visited[id] {
            return Ok(());
        }
        visited[id] = true;

        let op = &self.ops[id];
        match op {
            Op::Const { sub } => {
                if *sub >= self.consts.len() {
                    return Err(PmqlError::new("Constant index out of range")
                        .with_field("op", op)
                        .with_field("sub", *sub));
                }
            }
            Op::Var { sub, .. } => {
                if *sub >= self.vars_byname.len() {
                    return Err(PmqlError::new("Variable index out of range")
                        .with_field("op", op)
                        .with_field("sub", *sub));
                }
            }
            op => {
                let mut args = Vec::new();
                op.refers(|arg| args.push(arg));
                for arg in args {
                    if arg >= id {
                        return Err(PmqlError::new("Reference does not point down the list")
                            .with_field("op", op)
                            .with_field("arg", arg));
                    }
                    self.visit(arg, visited)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn builder() -> Builder {
        Builder::new(Arc::new(FunctionPool::builtin()))
    }

    fn eval(expr: &Expression) -> Result<ScalarValue> {
        let mut ctx: Context = expr.context(false);
        expr.eval(&mut ctx)
    }

    #[test]
    fn builds_and_evaluates() {
        let mut b = builder();
        let two = b.constant(2);
        let three = b.constant(3);
        let sum = b.binary(BinaryOp::Add, two, three).unwrap();
        let expr = b.finish().unwrap();

        assert_eq!(sum, expr.root());
        assert_eq!(ScalarValue::Int64(5), eval(&expr).unwrap());
    }

    #[test]
    fn deduplicates_identical_ops() {
        // ((a + b) * (a + b)) stores the sum once.
        let mut b = builder();
        let a = b.var("a");
        let v = b.var("b");
        let sum1 = b.binary(BinaryOp::Add, a, v).unwrap();
        let sum2 = b.binary(BinaryOp::Add, a, v).unwrap();
        assert_eq!(sum1, sum2);

        b.binary(BinaryOp::Mul, sum1, sum2).unwrap();
        let expr = b.finish().unwrap();
        assert_eq!(4, expr.ops().len());
    }

    #[test]
    fn reuses_variables_by_name() {
        let mut b = builder();
        let a1 = b.var("a");
        let a2 = b.var("a");
        assert_eq!(a1, a2);
    }

    #[test]
    fn constants_are_never_merged() {
        let mut b = builder();
        let c1 = b.constant(42);
        let c2 = b.constant(42);
        assert_ne!(c1, c2);
    }

    #[test]
    fn rejects_unknown_references() {
        let mut b = builder();
        let a = b.var("a");
        assert!(b.unary(UnaryOp::Neg, a + 1).is_err());
        assert!(b.binary(BinaryOp::Add, a, 7).is_err());
        assert!(b.branch(a, a, 9).is_err());
        assert!(b.call("avail", vec![a, 5]).is_err());
    }

    #[test]
    fn rejects_unknown_functions() {
        let mut b = builder();
        let a = b.var("a");
        assert!(b.call("nosuch", vec![a]).is_err());
    }

    #[test]
    fn rejects_empty_expression() {
        assert!(builder().finish().is_err());
    }

    #[test]
    fn rejects_unreachable_ops() {
        let mut b = builder();
        let a = b.var("a");
        b.var("orphan");
        b.unary(UnaryOp::Neg, a).unwrap();
        assert!(b.finish().is_err());
    }

    #[test]
    fn from_parts_replays_validation() {
        let pool = Arc::new(FunctionPool::builtin());

        let mut b = Builder::new(pool.clone());
        let a = b.var("a");
        let zero = b.constant(0);
        b.call("avail", vec![a, zero]).unwrap();
        let expr = b.finish().unwrap();

        let rebuilt = Builder::from_parts(
            expr.constants().to_vec(),
            expr.ops().to_vec(),
            pool.clone(),
        )
        .unwrap()
        .finish()
        .unwrap();
        assert_eq!(expr.ops(), rebuilt.ops());

        // Out-of-range constant reference.
        assert!(
            Builder::from_parts(Vec::new(), vec![Op::Const { sub: 0 }], pool.clone()).is_err()
        );

        // Forward reference.
        assert!(
            Builder::from_parts(
                Vec::new(),
                vec![Op::Unary {
                    op: UnaryOp::Neg,
                    arg: 1
                }],
                pool.clone(),
            )
            .is_err()
        );

        // Call id that doesn't match the pool.
        assert!(
            Builder::from_parts(
                Vec::new(),
                vec![
                    Op::Var {
                        sub: 0,
                        name: "a".to_string()
                    },
                    Op::Call {
                        name: "avail".to_string(),
                        fun: 7,
                        args: vec![0]
                    },
                ],
                pool,
            )
            .is_err()
        );
    }
}
