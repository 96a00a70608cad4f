use std::fmt;

use pmql_error::{PmqlError, Result, ResultExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Boolean,
    Int64,
    Float64,
    Utf8,
}

impl DataType {
    /// Resolve a type name as it appears in expression text, e.g. the `int`
    /// of `int{42}`.
    pub fn from_name(name: &str) -> Result<DataType> {
        Ok(match name {
            "bool" => DataType::Boolean,
            "int" | "i64" => DataType::Int64,
            "float" | "f64" | "double" => DataType::Float64,
            "str" | "string" => DataType::Utf8,
            other => {
                return Err(
                    PmqlError::new(format!("Unknown value type: '{other}'"))
                        .with_field("expected", "bool, int, float or string"),
                );
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Boolean => "bool",
            DataType::Int64 => "int",
            DataType::Float64 => "float",
            DataType::Utf8 => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single owned scalar value.
///
/// `Null` is a first-class value rather than an absent one. Arithmetic and
/// bitwise operations propagate it, comparisons treat it as equal to itself
/// and ordered before every other value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Interpret the value as a condition.
    ///
    /// Null is falsy, numbers are truthy when non-zero. Strings have no
    /// truthiness and produce an error.
    pub fn truthiness(&self) -> Result<bool> {
        match self {
            ScalarValue::Null => Ok(false),
            ScalarValue::Boolean(b) => Ok(*b),
            ScalarValue::Int64(v) => Ok(*v != 0),
            ScalarValue::Float64(v) => Ok(*v != 0.0),
            ScalarValue::Utf8(_) => Err(PmqlError::new(
                "Cannot interpret a string value as a condition",
            )),
        }
    }

    /// Parse a raw literal payload into a value of the named type, e.g.
    /// `("int", "42")` into `Int64(42)`.
    ///
    /// String payloads may be wrapped in single quotes, which are stripped.
    pub fn parse_typed(ty: &str, raw: &str) -> Result<ScalarValue> {
        Ok(match DataType::from_name(ty)? {
            DataType::Null => ScalarValue::Null,
            DataType::Boolean => match raw.trim() {
                "true" => ScalarValue::Boolean(true),
                "false" => ScalarValue::Boolean(false),
                other => {
                    return Err(PmqlError::new(format!("Invalid bool literal: '{other}'")));
                }
            },
            DataType::Int64 => ScalarValue::Int64(
                raw.trim()
                    .parse::<i64>()
                    .context_fn(|| format!("Invalid int literal: '{raw}'"))?,
            ),
            DataType::Float64 => ScalarValue::Float64(
                raw.trim()
                    .parse::<f64>()
                    .context_fn(|| format!("Invalid float literal: '{raw}'"))?,
            ),
            DataType::Utf8 => {
                let inner = raw
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .unwrap_or(raw);
                ScalarValue::Utf8(inner.to_string())
            }
        })
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Boolean(b) => write!(f, "bool{{{b}}}"),
            ScalarValue::Int64(v) => write!(f, "int{{{v}}}"),
            ScalarValue::Float64(v) => write!(f, "float{{{v}}}"),
            ScalarValue::Utf8(v) => write!(f, "string{{'{v}'}}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Boolean(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int64(v as i64)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => ScalarValue::Null,
        }
    }
}
