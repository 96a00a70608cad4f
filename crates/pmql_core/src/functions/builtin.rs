use pmql_error::Result;

use super::{Arguments, ScalarFunction};
use crate::scalar::ScalarValue;

/// `@avail(a, b, ...)` returns its first non-null argument, or null when all
/// arguments are null. Arguments past the first non-null one are not
/// evaluated.
#[derive(Debug)]
pub struct Avail;

impl ScalarFunction for Avail {
    fn name(&self) -> &'static str {
        "avail"
    }

    fn eval(&self, args: &mut Arguments) -> Result<ScalarValue> {
        for idx in 0..args.len() {
            let value = args.get(idx)?;
            if !value.is_null() {
                return Ok(value);
            }
        }
        Ok(ScalarValue::Null)
    }
}
