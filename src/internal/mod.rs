//! actmon's own diagnostic logger, for faults the library cannot report
//! through a monitor (client failures, config problems, guard misuse).
//!
//! Uses `OnceLock` so the sink is initialized exactly once, even if several
//! entry points race to call `init`. Calls made before initialization vanish.

use crate::config::Config;
use chrono::Local;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(crate::Error::InvalidLevel(other.to_string())),
        }
    }
}

#[derive(Debug)]
struct Sink {
    enabled: bool,
    level: Level,
}

impl Sink {
    fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.internal.enabled,
            level: config.parse_internal_level(),
        }
    }

    fn write(&self, level: Level, scope: &str, msg: &str) {
        if !self.enabled || level < self.level {
            return;
        }
        let line = format!(
            "{} [{level}] {scope}  {msg}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        );
        // Diagnostics must never fail the caller.
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

static INTERNAL_SINK: OnceLock<Sink> = OnceLock::new();

/// Initializes from the user's config file, or defaults if it can't be loaded.
/// Only the first call takes effect.
pub fn init() {
    let was_init = INTERNAL_SINK.get().is_some();
    INTERNAL_SINK.get_or_init(|| Sink::from_config(&Config::load().unwrap_or_default()));
    if !was_init {
        debug("INTERNAL", "Internal logger ready");
    }
}

/// Initializes from an already-loaded config to avoid reading it twice.
pub fn init_with_config(config: &Config) {
    let was_init = INTERNAL_SINK.get().is_some();
    INTERNAL_SINK.get_or_init(|| Sink::from_config(config));
    if !was_init {
        debug(
            "INTERNAL",
            &format!("Internal logger ready, level {}", config.internal.level),
        );
    }
}

#[must_use]
pub fn is_initialized() -> bool {
    INTERNAL_SINK.get().is_some()
}

fn log(level: Level, scope: &str, msg: &str) {
    if let Some(sink) = INTERNAL_SINK.get() {
        sink.write(level, scope, msg);
    }
}

/// High-volume instrumentation: resync retries, client registration.
pub fn trace(scope: &str, msg: &str) {
    log(Level::Trace, scope, msg);
}

pub fn debug(scope: &str, msg: &str) {
    log(Level::Debug, scope, msg);
}

pub fn info(scope: &str, msg: &str) {
    log(Level::Info, scope, msg);
}

/// Recoverable anomalies: bad config values, failing detach callbacks.
pub fn warn(scope: &str, msg: &str) {
    log(Level::Warn, scope, msg);
}

/// Client faults and guard misuse.
pub fn error(scope: &str, msg: &str) {
    log(Level::Error, scope, msg);
}
