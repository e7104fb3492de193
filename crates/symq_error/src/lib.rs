use std::error::Error;
use std::fmt;

/// Result type alias used across the workspace.
pub type Result<T, E = SymqError> = std::result::Result<T, E>;

/// Error type for all core operations.
///
/// Errors produced by resolution and execution are treated as programming
/// errors in how operators were declared or matched. There's no retry or
/// degraded-mode path built on top of these.
#[derive(Debug)]
pub struct SymqError {
    /// Message describing what went wrong.
    msg: String,

    /// Optional underlying error.
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl SymqError {
    pub fn new(msg: impl Into<String>) -> Self {
        SymqError {
            msg: msg.into(),
            source: None,
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        SymqError {
            msg: msg.into(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for SymqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl Error for SymqError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Add context to errors as they bubble up.
pub trait ResultExt<T> {
    /// Wrap the error with a static message.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap the error with a lazily computed message.
    fn context_fn(self, f: impl FnOnce() -> String) -> Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| SymqError::with_source(msg, Box::new(e)))
    }

    fn context_fn(self, f: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| SymqError::with_source(f(), Box::new(e)))
    }
}

/// Lift an `Option` into a `Result` with a resolution-style error.
pub trait OptionExt<T> {
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        self.ok_or_else(|| SymqError::new(msg))
    }
}

/// Return a "not implemented" error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        return Err($crate::SymqError::new(format!("Not implemented: {msg}")));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_source() {
        let err: Result<()> = Err(SymqError::new("inner"));
        let wrapped = err.context("outer").unwrap_err();
        assert_eq!("outer: inner", wrapped.to_string());
    }

    #[test]
    fn required_on_none() {
        let opt: Option<()> = None;
        let err = opt.required("missing thing").unwrap_err();
        assert_eq!("missing thing", err.to_string());
    }
}
