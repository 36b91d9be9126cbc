//! Configuration struct definitions.

use serde::Deserialize;

/// Process-wide defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Filter used on any axis a monitor leaves undefined.
    pub default_filter: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_filter: "verbose".to_string(),
        }
    }
}

/// The library's own diagnostic output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InternalConfig {
    /// Enable diagnostics on stderr.
    pub enabled: bool,
    /// Minimum level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
        }
    }
}

/// Bounded collector of client faults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CriticalErrorsConfig {
    /// Faults kept before the oldest are dropped.
    pub capacity: usize,
}

impl Default for CriticalErrorsConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

/// Defaults for relays created without explicit options.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Drop unfiltered lines the target would reject.
    pub apply_target_filter: bool,
    /// Copy the target's topic and tags onto the source at attach.
    pub pull_topic_and_tags: bool,
    /// Mirror source topic and tag changes onto the target.
    pub push_topic_and_tags: bool,
}

/// Per-topic settings applied when a monitor is created with that topic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Configured filter of monitors created for the topic.
    pub filter: Option<String>,
}
