//! Per-evaluation state: variable substitutions and cached results.

use std::collections::HashMap;

use pmql_error::{PmqlError, Result};

use crate::ops::Op;
use crate::results::Results;
use crate::scalar::ScalarValue;

/// A single variable slot.
///
/// The slot starts without a value. Evaluating an expression that touches a
/// variable with no value fails, but branches that skip it still succeed.
#[derive(Debug)]
pub struct Substitution {
    name: String,
    value: Option<ScalarValue>,
}

impl Substitution {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&ScalarValue> {
        self.value.as_ref()
    }
}

/// Mutable evaluation state for one expression.
///
/// Contexts are created by [`Expression::context`] and are only meaningful
/// for the expression that made them. Several contexts can exist for the
/// same expression, e.g. one per thread.
///
/// [`Expression::context`]: crate::expression::Expression::context
#[derive(Debug)]
pub struct Context {
    substitutions: Vec<Substitution>,
    byname: HashMap<String, usize, ahash::RandomState>,
    results: Results,
}

impl Context {
    pub(crate) fn new(ops: &[Op], cache: bool) -> Self {
        let mut substitutions = Vec::new();
        let mut byname = HashMap::default();

        for op in ops {
            if let Op::Var { sub, name } = op {
                debug_assert_eq!(*sub, substitutions.len());
                byname.insert(name.clone(), *sub);
                substitutions.push(Substitution {
                    name: name.clone(),
                    value: None,
                });
            }
        }

        Context {
            substitutions,
            byname,
            results: Results::new(ops, cache),
        }
    }

    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// Look up a variable's substitution index by name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.byname.get(name).copied()
    }

    /// Set a variable by substitution index, invalidating every cached
    /// result that depends on it.
    pub fn set(&mut self, sub: usize, value: impl Into<ScalarValue>) -> Result<()> {
        match self.substitutions.get_mut(sub) {
            Some(slot) => {
                slot.value = Some(value.into());
                self.results.invalidate(sub);
                Ok(())
            }
            None => Err(PmqlError::new("No such variable")
                .with_field("sub", sub)
                .with_field("count", self.substitutions.len())),
        }
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<ScalarValue>) -> Result<()> {
        match self.find(name) {
            Some(sub) => self.set(sub, value),
            None => Err(PmqlError::new("No such variable").with_field("name", name)),
        }
    }

    /// Whether every variable has a value.
    pub fn ready(&self) -> bool {
        self.substitutions.iter().all(|sub| sub.value.is_some())
    }

    /// Names of variables that still have no value.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.substitutions
            .iter()
            .filter(|sub| sub.value.is_none())
            .map(|sub| sub.name.as_str())
    }

    pub(crate) fn results(&self) -> &Results {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut Results {
        &mut self.results
    }
}
