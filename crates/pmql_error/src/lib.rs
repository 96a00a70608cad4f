//! Error type and result helpers shared by all pmql crates.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub type Result<T, E = PmqlError> = std::result::Result<T, E>;

/// Error type used throughout pmql.
///
/// Errors carry a human-readable message, optional key/value fields for
/// machine-relevant details, and an optional source error. Errors are cheaply
/// cloneable so they can live in cached evaluation results.
#[derive(Debug, Clone)]
pub struct PmqlError {
    message: String,
    fields: Vec<(&'static str, String)>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl PmqlError {
    pub fn new(message: impl Into<String>) -> Self {
        PmqlError {
            message: message.into(),
            fields: Vec::new(),
            source: None,
        }
    }

    pub fn new_with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        PmqlError {
            message: message.into(),
            fields: Vec::new(),
            source: Some(Arc::new(source)),
        }
    }

    /// Attach a key/value field to the error.
    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PmqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for (key, value) in &self.fields {
            write!(f, "\n  {key}: {value}")?;
        }
        if let Some(source) = &self.source {
            write!(f, "\n  caused by: {source}")?;
        }
        Ok(())
    }
}

impl Error for PmqlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|s| s as _)
    }
}

/// Extension trait for adding context to results.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message.
    fn context(self, message: &'static str) -> Result<T>;

    /// Wrap the error with a lazily produced context message.
    fn context_fn(self, message: impl FnOnce() -> String) -> Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, message: &'static str) -> Result<T> {
        self.map_err(|err| PmqlError::new_with_source(message, err))
    }

    fn context_fn(self, message: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|err| PmqlError::new_with_source(message(), err))
    }
}

/// Extension trait for turning empty options into errors.
pub trait OptionExt<T> {
    fn required(self, what: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(PmqlError::new(format!("Missing required value: {what}"))),
        }
    }
}

/// Return early with a "not implemented" error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {
        return Err($crate::PmqlError::new(format!("Not implemented: {}", format_args!($($arg)*))))
    };
}
