//! Expression compilation and evaluation.
//!
//! An expression is compiled once into a flat, deduplicated list of ops
//! ([`expression::Expression`]) and then evaluated any number of times
//! against mutable [`context::Context`] state holding variable values and
//! cached per-op results.
//!
//! ```
//! use std::sync::Arc;
//!
//! use pmql_core::functions::FunctionPool;
//! use pmql_core::scalar::ScalarValue;
//!
//! let pool = Arc::new(FunctionPool::builtin());
//! let expr = pmql_core::parse("if((${a} > int{0}), ${a}, (-${a}))", pool).unwrap();
//!
//! let mut ctx = expr.context(true);
//! ctx.set_by_name("a", -3).unwrap();
//! assert_eq!(ScalarValue::Int64(3), expr.eval(&mut ctx).unwrap());
//! ```

pub mod bind;
pub mod bitmap;
pub mod builder;
pub mod context;
pub mod expression;
pub mod functions;
pub mod ops;
pub mod results;
pub mod scalar;
pub mod serial;

pub use bind::parse;
