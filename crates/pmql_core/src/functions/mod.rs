//! Extension functions callable from expressions via `@name(...)`.

pub mod builtin;

use std::collections::HashMap;
use std::fmt;

use pmql_error::{PmqlError, Result};

use crate::context::Context;
use crate::expression::Expression;
use crate::ops::{FunId, OpId};
use crate::scalar::ScalarValue;

/// Lazy accessor for call arguments.
///
/// Arguments are op subtrees, not values. A function pulls the ones it
/// needs with `get`, which evaluates the subtree on first access and serves
/// cached outcomes afterwards. Untouched arguments are never evaluated.
pub struct Arguments<'a> {
    expr: &'a Expression,
    ctx: &'a mut Context,
    ids: &'a [OpId],
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(expr: &'a Expression, ctx: &'a mut Context, ids: &'a [OpId]) -> Self {
        Arguments { expr, ctx, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Evaluate and return the argument at `idx`.
    pub fn get(&mut self, idx: usize) -> Result<ScalarValue> {
        let id = match self.ids.get(idx) {
            Some(id) => *id,
            None => {
                return Err(PmqlError::new("Argument index out of range")
                    .with_field("index", idx)
                    .with_field("arity", self.ids.len()));
            }
        };
        self.expr.eval_op(id, self.ctx);
        self.ctx.results().get(id).clone()
    }
}

/// A single extension function.
pub trait ScalarFunction: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn eval(&self, args: &mut Arguments) -> Result<ScalarValue>;
}

/// An immutable, named collection of extension functions.
///
/// Expressions hold on to the pool they were built with, so function ids
/// baked into call ops stay meaningful for the expression's lifetime.
#[derive(Debug, Default)]
pub struct FunctionPool {
    functions: Vec<Box<dyn ScalarFunction>>,
    byname: HashMap<String, FunId, ahash::RandomState>,
}

impl FunctionPool {
    pub fn empty() -> Self {
        FunctionPool::default()
    }

    /// Pool with all builtin functions registered.
    pub fn builtin() -> Self {
        let mut pool = FunctionPool::empty();
        pool.register(Box::new(builtin::Avail))
            .expect("builtin names are unique");
        pool
    }

    pub fn register(&mut self, function: Box<dyn ScalarFunction>) -> Result<FunId> {
        let name = function.name();
        if self.byname.contains_key(name) {
            return Err(
                PmqlError::new("Duplicate extension function").with_field("name", name)
            );
        }

        let id = self.functions.len();
        self.byname.insert(name.to_string(), id);
        self.functions.push(function);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Result<FunId> {
        match self.byname.get(name) {
            Some(id) => Ok(*id),
            None => Err(PmqlError::new("Unknown extension function").with_field("name", name)),
        }
    }

    pub fn invoke(&self, fun: FunId, args: &mut Arguments) -> Result<ScalarValue> {
        match self.functions.get(fun) {
            Some(function) => function.eval(args),
            None => Err(PmqlError::new("Unknown extension function id").with_field("id", fun)),
        }
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.iter().map(|f| f.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fortytwo;

    impl ScalarFunction for Fortytwo {
        fn name(&self) -> &'static str {
            "fortytwo"
        }

        fn eval(&self, _args: &mut Arguments) -> Result<ScalarValue> {
            Ok(ScalarValue::Int64(42))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut pool = FunctionPool::builtin();
        let avail = pool.lookup("avail").unwrap();

        let id = pool.register(Box::new(Fortytwo)).unwrap();
        assert_ne!(avail, id);
        assert_eq!(id, pool.lookup("fortytwo").unwrap());

        assert!(pool.lookup("missing").is_err());
        assert!(pool.register(Box::new(Fortytwo)).is_err());
    }
}
