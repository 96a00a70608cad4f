//! Cached evaluation outcomes with selective invalidation.
//!
//! Every op gets a result slot. When caching is enabled a validity bitmap
//! tracks which slots are current. Changing a variable intersects the
//! validity bitmap with a precomputed mask that is unset exactly for the
//! ops reachable from that variable, so unrelated subtrees keep their
//! cached outcomes.

use pmql_error::{PmqlError, Result};
use tracing::trace;

use crate::bitmap::Bitmap;
use crate::ops::{Op, OpId};
use crate::scalar::ScalarValue;

#[derive(Debug)]
pub struct Results {
    cache: bool,
    valid: Bitmap,
    /// Inverted dependency masks, indexed by substitution.
    invalidations: Vec<Bitmap>,
    outcomes: Vec<Result<ScalarValue>>,
}

impl Results {
    pub fn new(ops: &[Op], cache: bool) -> Self {
        Results {
            cache,
            valid: Bitmap::new(ops.len()),
            // Masks only matter for invalidation, which is a no-op without
            // caching.
            invalidations: if cache {
                invalidation_masks(ops)
            } else {
                Vec::new()
            },
            outcomes: ops
                .iter()
                .map(|_| Err(PmqlError::new("Not evaluated yet")))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether the stored outcome for an op can be reused.
    pub fn is_valid(&self, id: OpId) -> bool {
        self.cache && self.valid.get(id)
    }

    pub fn store(&mut self, id: OpId, outcome: Result<ScalarValue>) {
        self.outcomes[id] = outcome;
        if self.cache {
            self.valid.set(id, true);
        }
    }

    /// Stored outcome for an op. Only meaningful after the op was evaluated
    /// in the current round.
    pub fn get(&self, id: OpId) -> &Result<ScalarValue> {
        &self.outcomes[id]
    }

    /// Stored outcome, or `None` if caching is on and the slot is stale.
    pub fn slot(&self, id: OpId) -> Option<&Result<ScalarValue>> {
        if !self.cache || self.valid.get(id) {
            Some(&self.outcomes[id])
        } else {
            None
        }
    }

    /// Drop cached outcomes of every op that depends on the given variable.
    pub fn invalidate(&mut self, sub: usize) {
        if !self.cache {
            return;
        }
        if let Some(mask) = self.invalidations.get(sub) {
            self.valid.and_assign(mask);
            trace!(sub, remaining = self.valid.count_set(), "invalidated");
        }
    }
}

/// Compute per-variable invalidation masks. The mask for a variable has a
/// zero bit for every op whose outcome depends on it.
fn invalidation_masks(ops: &[Op]) -> Vec<Bitmap> {
    let mut masks = Vec::new();
    if ops.is_empty() {
        return masks;
    }

    let root = ops.len() - 1;
    for (id, op) in ops.iter().enumerate() {
        if let Op::Var { sub, .. } = op {
            let mut mask = Bitmap::new(ops.len());
            let mut visited = Bitmap::new(ops.len());
            depends(ops, root, id, &mut mask, &mut visited);
            mask.invert();

            if masks.len() <= *sub {
                masks.resize(*sub + 1, Bitmap::new(ops.len()));
            }
            masks[*sub] = mask;
        }
    }
    masks
}

/// Mark every op in the subtree of `id` that transitively refers to the
/// variable op `var`. Returns whether `id` itself depends on it.
///
/// Negative results are memoized via `visited` too. Deduplication makes
/// shared subtrees common, and re-walking a shared non-depending subtree
/// per reference would blow up exponentially with DAG depth.
fn depends(ops: &[Op], id: OpId, var: OpId, marked: &mut Bitmap, visited: &mut Bitmap) -> bool {
    if visited.get(id) {
        return marked.get(id);
    }
    visited.set(id, true);

    let dep = match &ops[id] {
        Op::Var { .. } => id == var,
        Op::Const { .. } => false,
        op => {
            let mut dep = false;
            op.refers(|arg| {
                if depends(ops, arg, var, marked, visited) {
                    dep = true;
                }
            });
            dep
        }
    };

    if dep {
        marked.set(id, true);
    }
    dep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BinaryOp, UnaryOp};

    fn var(sub: usize, name: &str) -> Op {
        Op::Var {
            sub,
            name: name.to_string(),
        }
    }

    /// `((-int{42}) + (-${a}))` laid out as flat ops.
    fn sum_ops() -> Vec<Op> {
        vec![
            Op::Const { sub: 0 },
            var(0, "a"),
            Op::Unary {
                op: UnaryOp::Neg,
                arg: 1,
            },
            Op::Unary {
                op: UnaryOp::Neg,
                arg: 0,
            },
            Op::Binary {
                op: BinaryOp::Add,
                left: 3,
                right: 2,
            },
        ]
    }

    fn validity(results: &Results) -> Vec<bool> {
        (0..results.len()).map(|id| results.is_valid(id)).collect()
    }

    #[test]
    fn invalidation_is_selective() {
        let ops = sum_ops();
        let mut results = Results::new(&ops, true);
        for id in 0..ops.len() {
            results.store(id, Ok(ScalarValue::Int64(0)));
        }
        assert_eq!(vec![true; 5], validity(&results));

        // Only `a` and the ops above it go stale.
        results.invalidate(0);
        assert_eq!(vec![true, false, false, true, false], validity(&results));
    }

    #[test]
    fn independent_variables_have_independent_masks() {
        // `(((-int{42}) + (-${a})) - ${b})`
        let mut ops = sum_ops();
        ops.push(var(1, "b"));
        ops.push(Op::Binary {
            op: BinaryOp::Sub,
            left: 4,
            right: 5,
        });

        let mut results = Results::new(&ops, true);
        for id in 0..ops.len() {
            results.store(id, Ok(ScalarValue::Int64(0)));
        }

        results.invalidate(1);
        assert_eq!(
            vec![true, true, true, true, true, false, false],
            validity(&results)
        );

        results.invalidate(0);
        assert_eq!(
            vec![true, false, false, true, false, false, false],
            validity(&results)
        );
    }

    #[test]
    fn masks_tolerate_deeply_shared_subtrees() {
        // A doubling chain: every op is referenced twice by the next one,
        // so a naive walk revisits subtrees 2^depth times.
        let depth = 64;
        let mut ops = vec![var(0, "a")];
        for id in 0..depth {
            ops.push(Op::Binary {
                op: BinaryOp::Add,
                left: id,
                right: id,
            });
        }
        ops.push(var(1, "b"));
        ops.push(Op::Binary {
            op: BinaryOp::Sub,
            left: depth,
            right: depth + 1,
        });

        let mut results = Results::new(&ops, true);
        for id in 0..ops.len() {
            results.store(id, Ok(ScalarValue::Int64(0)));
        }

        // The chain hangs off `a` only; `b` touches just itself and the root.
        results.invalidate(1);
        assert!(results.is_valid(depth));
        assert!(!results.is_valid(depth + 1));
        assert!(!results.is_valid(depth + 2));

        results.invalidate(0);
        assert!(!results.is_valid(0));
        assert!(!results.is_valid(depth));
    }

    #[test]
    fn disabled_cache_never_reports_valid() {
        let ops = sum_ops();
        let mut results = Results::new(&ops, false);
        results.store(4, Ok(ScalarValue::Int64(0)));
        assert!(!results.is_valid(4));
        assert!(results.slot(4).is_some());
    }

    #[test]
    fn stale_slots_are_hidden() {
        let ops = sum_ops();
        let mut results = Results::new(&ops, true);
        assert!(results.slot(2).is_none());

        results.store(2, Ok(ScalarValue::Int64(1)));
        assert!(results.slot(2).is_some());

        results.invalidate(0);
        assert!(results.slot(2).is_none());
    }
}
