//! TOML configuration loading and `source = "..."` include resolution.
//!
//! Struct definitions live in `structs`; this module owns file I/O, cycle
//! detection and the merge of included files.

mod structs;

pub use structs::{BridgeConfig, CriticalErrorsConfig, GeneralConfig, InternalConfig, TopicConfig};

use crate::filter::FilterSet;
use crate::internal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Root of `actmon.conf`. Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub internal: InternalConfig,
    pub critical_errors: CriticalErrorsConfig,
    pub bridge: BridgeConfig,
    /// Keyed by topic name.
    pub topics: HashMap<String, TopicConfig>,
}

/// Splits `source = "..."` include lines from the TOML body, since serde
/// cannot represent them. Returns the include paths and the remaining content.
#[doc(hidden)]
#[must_use]
pub fn extract_sources(content: &str) -> (Vec<String>, String) {
    let mut sources = Vec::new();
    let mut remaining = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let include = trimmed
            .strip_prefix("source")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='));
        if let Some(value) = include {
            let path = value.trim().trim_matches('"').trim_matches('\'');
            if !path.is_empty() {
                sources.push(path.to_string());
            }
        } else {
            remaining.push_str(line);
            remaining.push('\n');
        }
    }

    (sources, remaining)
}

impl Config {
    /// Loads `~/.config/actmon/actmon.conf` with its includes resolved.
    ///
    /// # Errors
    /// Fails if the config directory can't be determined, a file can't be
    /// read or parsed, or includes form a cycle.
    pub fn load() -> Result<Self, crate::Error> {
        let config_path = Self::get_config_path()?;
        let config = Self::load_with_sources(&config_path, &mut HashSet::new())?;
        internal::debug(
            "CONFIG",
            &format!("Config loaded from {}", config_path.display()),
        );
        Ok(config)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or contains cyclic includes.
    pub fn load_from(path: &Path) -> Result<Self, crate::Error> {
        Self::load_with_sources(path, &mut HashSet::new())
    }

    /// Parses a configuration from a string. Include lines are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConfigParse`] on invalid TOML.
    pub fn parse(content: &str) -> Result<Self, crate::Error> {
        let (_, body) = extract_sources(content);
        Ok(toml::from_str(&body)?)
    }

    fn load_with_sources(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<Self, crate::Error> {
        if !path.exists() {
            internal::debug("CONFIG", "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !seen.insert(canonical.clone()) {
            internal::warn(
                "CONFIG",
                &format!("Cyclic include detected: {}", canonical.display()),
            );
            return Err(crate::Error::CyclicInclude(canonical));
        }

        let content = fs::read_to_string(path)?;
        let (sources, toml_content) = extract_sources(&content);
        let mut config: Self = toml::from_str(&toml_content)?;

        for source_path in sources {
            internal::debug("CONFIG", &format!("Processing source: {source_path}"));
            let expanded = shellexpand::tilde(&source_path);
            let mut source_file = PathBuf::from(expanded.as_ref());
            if source_file.is_relative()
                && let Some(dir) = path.parent()
            {
                source_file = dir.join(source_file);
            }
            if source_file.exists() {
                let source_config = Self::load_with_sources(&source_file, seen)?;
                config.merge(source_config);
            } else {
                internal::warn("CONFIG", &format!("Source file not found: {source_path}"));
            }
        }

        Ok(config)
    }

    /// Folds an included config's topics into `self`; entries already present win.
    pub fn merge(&mut self, other: Self) {
        for (topic, settings) in other.topics {
            self.topics.entry(topic).or_insert(settings);
        }
    }

    /// `~/.config/actmon/actmon.conf`.
    ///
    /// # Errors
    /// Fails when the platform has no concept of a config directory.
    pub fn get_config_path() -> Result<PathBuf, crate::Error> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("actmon").join("actmon.conf"))
            .ok_or(crate::Error::ConfigDirNotFound)
    }

    /// Process default filter; an unparsable value falls back to verbose.
    #[must_use]
    pub fn parse_default_filter(&self) -> FilterSet {
        parse_filter_or(&self.general.default_filter, FilterSet::VERBOSE)
    }

    /// Configured filter for monitors of `topic`, if any.
    #[must_use]
    pub fn topic_filter(&self, topic: &str) -> Option<FilterSet> {
        let text = self.topics.get(topic)?.filter.as_deref()?;
        Some(parse_filter_or(text, FilterSet::UNDEFINED))
    }

    /// Filters of every configured topic, invalid entries replaced by `UNDEFINED`.
    #[must_use]
    pub fn topic_filters(&self) -> HashMap<String, FilterSet> {
        self.topics
            .keys()
            .filter_map(|topic| Some((topic.clone(), self.topic_filter(topic)?)))
            .collect()
    }

    #[must_use]
    pub fn parse_internal_level(&self) -> internal::Level {
        self.internal.level.parse().unwrap_or(internal::Level::Warn)
    }
}

fn parse_filter_or(text: &str, fallback: FilterSet) -> FilterSet {
    text.parse().unwrap_or_else(|e| {
        internal::warn("CONFIG", &format!("{e}; using {fallback}"));
        fallback
    })
}
