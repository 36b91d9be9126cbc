//! Unified error type for all actmon operations.
//!
//! Only caller-side misuse surfaces here. Faults raised by clients never reach
//! the caller: they are routed to the critical error collector instead.

use std::path::PathBuf;

/// Error type for actmon operations.
#[derive(Debug)]
pub enum Error {
    /// I/O error.
    Io(std::io::Error),
    /// TOML config parsing error.
    ConfigParse(toml::de::Error),
    /// Wire record (de)serialization error.
    Wire(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
    /// Cyclic include detected in config sources.
    CyclicInclude(PathBuf),
    /// A monitor operation was started from inside another operation on the
    /// same monitor, on the same thread (typically from a client callback).
    Reentrancy,
    /// Two threads used the same monitor at the same time.
    ConcurrentAccess {
        /// Token of the thread that currently owns the monitor.
        owner: u64,
        /// Token of the rejected caller.
        caller: u64,
    },
    /// Tags created by another `TagContext` than the monitor's.
    ForeignTags(String),
    /// Filter text that is neither a preset name nor `{group,line}`.
    InvalidFilter(String),
    /// Invalid log level string.
    InvalidLevel(String),
    /// Atomic tag containing the separator or only whitespace.
    InvalidTag(String),
    /// Bound client is already attached to another monitor.
    ClientAlreadyBound(String),
    /// A bound client refused to be attached.
    ClientRegistration {
        /// Type name of the client.
        client: String,
        /// Error reported by the client.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ConfigParse(e) => write!(f, "parse error: {e}"),
            Self::Wire(e) => write!(f, "wire format error: {e}"),
            Self::ConfigDirNotFound => write!(f, "config directory not found"),
            Self::CyclicInclude(p) => write!(f, "cyclic include: {}", p.display()),
            Self::Reentrancy => write!(f, "reentrant call detected on activity monitor"),
            Self::ConcurrentAccess { owner, caller } => write!(
                f,
                "concurrent access: monitor is owned by thread #{owner}, called from thread #{caller}"
            ),
            Self::ForeignTags(tags) => {
                write!(f, "tags '{tags}' belong to another tag context")
            }
            Self::InvalidFilter(s) => write!(f, "invalid filter: {s}"),
            Self::InvalidLevel(s) => write!(f, "invalid level: {s}"),
            Self::InvalidTag(s) => write!(f, "invalid tag: '{s}'"),
            Self::ClientAlreadyBound(name) => {
                write!(f, "client {name} is already bound to another monitor")
            }
            Self::ClientRegistration { client, source } => {
                write!(f, "client {client} refused registration: {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ConfigParse(e) => Some(e),
            Self::Wire(e) => Some(e),
            Self::ClientRegistration { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigParse(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Wire(e)
    }
}
