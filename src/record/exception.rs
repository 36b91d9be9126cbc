//! Errors carried as plain data so they survive client fan-out and bridges.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Snapshot of an error and its `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionData {
    pub type_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ExceptionData>>,
}

impl ExceptionData {
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            inner: None,
        }
    }

    /// Captures `error` with its static type name and walks its source chain.
    #[must_use]
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            inner: error.source().map(|source| Box::new(Self::from_dyn(source))),
        }
    }

    /// Same as [`Self::from_error`] when only a trait object is at hand.
    #[must_use]
    pub fn from_dyn(error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            type_name: "cause".to_string(),
            message: error.to_string(),
            inner: error.source().map(|source| Box::new(Self::from_dyn(source))),
        }
    }

    /// Converts a payload caught by `catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new("panic", message)
    }

    /// Depth-first iterator over this error and its causes.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |e| e.inner.as_deref())
    }
}

impl fmt::Display for ExceptionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl std::error::Error for ExceptionData {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .as_deref()
            .map(|inner| inner as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_source_chain() {
        let io = std::io::Error::other("disk gone");
        let err = crate::Error::Io(io);
        let data = ExceptionData::from_error(&err);
        assert_eq!(data.type_name, "actmon::error::Error");
        assert_eq!(data.chain().count(), 2);
        assert_eq!(data.inner.as_ref().map(|i| i.message.as_str()), Some("disk gone"));
    }

    #[test]
    fn panic_payloads_keep_their_text() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(ExceptionData::from_panic(payload.as_ref()).message, "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(ExceptionData::from_panic(payload.as_ref()).message, "kaboom");
    }
}
