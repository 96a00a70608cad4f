//! Expression serialization.
//!
//! Only constants and ops are stored. Extension functions are code, so a
//! loaded expression is bound against a pool supplied by the caller, and
//! loading fails if a called function is missing or moved.

use std::sync::Arc;

use pmql_error::{Result, ResultExt};
use serde::{Deserialize, Serialize};

use crate::builder::Builder;
use crate::expression::Expression;
use crate::functions::FunctionPool;
use crate::ops::Op;
use crate::scalar::ScalarValue;

#[derive(Debug, Serialize, Deserialize)]
struct StoredExpression {
    consts: Vec<ScalarValue>,
    ops: Vec<Op>,
}

/// Serialize an expression to JSON.
pub fn store(expr: &Expression) -> Result<String> {
    let stored = StoredExpression {
        consts: expr.constants().to_vec(),
        ops: expr.ops().to_vec(),
    };
    serde_json::to_string(&stored).context("Failed to serialize expression")
}

/// Deserialize an expression, revalidating it against the given pool.
pub fn load(data: &str, pool: Arc<FunctionPool>) -> Result<Expression> {
    let stored: StoredExpression =
        serde_json::from_str(data).context("Failed to deserialize expression")?;
    Builder::from_parts(stored.consts, stored.ops, pool)?.finish()
}
