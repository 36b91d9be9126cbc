//! Severity levels of lines and groups, and the per-axis thresholds that gate them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a line or group.
///
/// Discriminants line up with [`LevelFilter`] so a level can be compared
/// against a threshold without a lookup table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    /// High-volume instrumentation.
    Trace = 1,
    /// Normal operational milestones.
    #[default]
    Info = 2,
    /// Anomalies that may need attention.
    Warn = 3,
    /// Failures that prevent an operation from completing.
    Error = 4,
    /// Failures that compromise the whole process.
    Fatal = 5,
}

impl Level {
    /// Lowercase because config files use lowercase level strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Convenience for iteration in tests and counters.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Trace,
            Self::Info,
            Self::Warn,
            Self::Error,
            Self::Fatal,
        ]
    }

    /// Error and Fatal groups escalate the monitor filter to maximum verbosity.
    #[must_use]
    pub const fn is_error_or_fatal(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by `FromStr` so callers can distinguish "unknown level" from other parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: '{}'", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl From<ParseLevelError> for crate::Error {
    fn from(e: ParseLevelError) -> Self {
        Self::InvalidLevel(e.0)
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Level as carried by a record: the severity plus the `filtered` decoration.
///
/// `filtered` is set when the emitter already checked the monitor filter
/// before sending the record. A record without it went through the
/// unfiltered path and must always be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogLevel {
    pub level: Level,
    pub filtered: bool,
}

impl LogLevel {
    #[must_use]
    pub const fn unfiltered(level: Level) -> Self {
        Self {
            level,
            filtered: false,
        }
    }

    #[must_use]
    pub const fn filtered(level: Level) -> Self {
        Self {
            level,
            filtered: true,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        Self::unfiltered(level)
    }
}

/// Threshold applied to one axis (groups or lines) of a [`crate::FilterSet`].
///
/// Ordered by verbosity: `None` lets everything through, `Off` nothing.
/// `Undefined` has no opinion and defers to whatever it is combined with.
/// `Invalid` never filters anything; caches use it to mean "recompute me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum LevelFilter {
    Invalid = -2,
    #[default]
    Undefined = -1,
    None = 0,
    Trace = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

impl LevelFilter {
    /// Whether a record of `level` passes this threshold.
    ///
    /// `Undefined` accepts: callers resolve it against the process default
    /// before asking when that matters.
    #[must_use]
    pub const fn accepts(self, level: Level) -> bool {
        match self {
            Self::Off | Self::Invalid => false,
            Self::Undefined | Self::None => true,
            _ => level as i8 >= self as i8,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Undefined => "undefined",
            Self::None => "none",
            Self::Trace => "trace",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Off => "off",
        }
    }

    pub(crate) const fn to_bits(self) -> u8 {
        (self as i8 + 2) as u8
    }

    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Undefined,
            2 => Self::None,
            3 => Self::Trace,
            4 => Self::Info,
            5 => Self::Warn,
            6 => Self::Error,
            7 => Self::Fatal,
            8 => Self::Off,
            _ => Self::Invalid,
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => Self::Trace,
            Level::Info => Self::Info,
            Level::Warn => Self::Warn,
            Level::Error => Self::Error,
            Level::Fatal => Self::Fatal,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelFilter {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "undefined" => Ok(Self::Undefined),
            "none" => Ok(Self::None),
            "off" => Ok(Self::Off),
            other => other.parse::<Level>().map(Self::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_cover_every_variant() {
        for filter in [
            LevelFilter::Invalid,
            LevelFilter::Undefined,
            LevelFilter::None,
            LevelFilter::Trace,
            LevelFilter::Info,
            LevelFilter::Warn,
            LevelFilter::Error,
            LevelFilter::Fatal,
            LevelFilter::Off,
        ] {
            assert_eq!(LevelFilter::from_bits(filter.to_bits()), filter);
        }
    }
}
