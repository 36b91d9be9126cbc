//! Process-scoped settings shared by a family of monitors.
//!
//! A [`MonitorContext`] owns the tag registry, the default filter used
//! where a monitor has no opinion, the critical error collector and the
//! hook run on every monitor it creates. The global context is built from
//! the user's config on first use; tests create isolated ones.

mod critical;

pub use critical::{CriticalError, CriticalErrorCollector};

use crate::bridge::RelayOptions;
use crate::config::Config;
use crate::filter::FilterSet;
use crate::internal;
use crate::monitor::Monitor;
use crate::tags::{TagContext, TagSet};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Names of the tags the monitor itself attaches.
pub mod well_known {
    /// Lines emitted when the topic changes.
    pub const TOPIC_CHANGED: &str = "MonitorTopicChanged";
    /// Text conclusions supplied when closing a group.
    pub const USER_CONCLUSION: &str = "UserConclusion";
    /// Conclusions computed by a group's deferred callback.
    pub const AUTO_CONCLUSION: &str = "AutoConclusion";
    /// Closes synthesized when a bridge relay is detached.
    pub const BRIDGE_PREMATURE_CLOSE: &str = "BridgePrematureClose";
}

/// Well-known tags interned in one context.
#[derive(Debug, Clone)]
pub struct WellKnownTags {
    pub topic_changed: TagSet,
    pub user_conclusion: TagSet,
    pub auto_conclusion: TagSet,
    pub premature_close: TagSet,
}

impl WellKnownTags {
    fn intern(tags: &TagContext) -> Self {
        Self {
            topic_changed: tags.find_or_create(well_known::TOPIC_CHANGED),
            user_conclusion: tags.find_or_create(well_known::USER_CONCLUSION),
            auto_conclusion: tags.find_or_create(well_known::AUTO_CONCLUSION),
            premature_close: tags.find_or_create(well_known::BRIDGE_PREMATURE_CLOSE),
        }
    }
}

/// Callback run on every monitor a context creates.
pub type AutoConfiguration = Arc<dyn Fn(&Monitor) + Send + Sync>;

static GLOBAL: OnceLock<Arc<MonitorContext>> = OnceLock::new();

pub struct MonitorContext {
    default_filter: AtomicU16,
    tags: TagContext,
    well_known: WellKnownTags,
    critical_errors: CriticalErrorCollector,
    auto_configuration: RwLock<Option<AutoConfiguration>>,
    topic_filters: RwLock<HashMap<String, FilterSet>>,
    bridge_defaults: RelayOptions,
}

impl MonitorContext {
    /// The process-wide context, configured from `actmon.conf` on first use.
    pub fn global() -> &'static Arc<Self> {
        GLOBAL.get_or_init(|| {
            let config = Config::load().unwrap_or_else(|e| {
                internal::warn("CONFIG", &format!("{e}; using defaults"));
                Config::default()
            });
            internal::init_with_config(&config);
            Self::from_config_named("global", &config)
        })
    }

    /// Isolated context with default settings.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::from_config_named("isolated", &Config::default())
    }

    /// Isolated context built from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Arc<Self> {
        Self::from_config_named("configured", config)
    }

    fn from_config_named(name: &str, config: &Config) -> Arc<Self> {
        let bridge = config.bridge;
        Self::build(
            TagContext::new(name),
            config.parse_default_filter(),
            config.critical_errors.capacity,
            config.topic_filters(),
            RelayOptions {
                apply_target_filter: bridge.apply_target_filter,
                pull_topic_and_tags: bridge.pull_topic_and_tags,
                push_topic_and_tags: bridge.push_topic_and_tags,
            },
        )
    }

    fn build(
        tags: TagContext,
        default_filter: FilterSet,
        capacity: usize,
        topic_filters: HashMap<String, FilterSet>,
        bridge_defaults: RelayOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            default_filter: AtomicU16::new(default_filter.to_bits()),
            well_known: WellKnownTags::intern(&tags),
            tags,
            critical_errors: CriticalErrorCollector::new(capacity),
            auto_configuration: RwLock::new(None),
            topic_filters: RwLock::new(topic_filters),
            bridge_defaults,
        })
    }

    /// Isolated child context. Its default filter is this one's combined
    /// with `default_override` on every axis where the override is not `None`.
    #[must_use]
    pub fn derive(&self, default_override: FilterSet) -> Arc<Self> {
        let default_filter = self.default_filter().combine_none_only(default_override);
        Self::build(
            TagContext::new(format!("{}/derived", self.tags.name())),
            default_filter,
            self.critical_errors.capacity(),
            self.topic_filters
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            self.bridge_defaults,
        )
    }

    /// New monitor with an empty topic.
    #[must_use]
    pub fn create_monitor(self: &Arc<Self>) -> Monitor {
        self.create_monitor_with_topic("")
    }

    /// New monitor whose configured filter comes from the topic's settings, if any.
    #[must_use]
    pub fn create_monitor_with_topic(self: &Arc<Self>, topic: &str) -> Monitor {
        let filter = self.topic_filter(topic).unwrap_or(FilterSet::UNDEFINED);
        let monitor = Monitor::create(self.clone(), topic, filter);
        let hook = self
            .auto_configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(&monitor);
        }
        monitor
    }

    /// Filter resolving the undefined axes of every monitor in this context.
    #[must_use]
    pub fn default_filter(&self) -> FilterSet {
        FilterSet::from_bits(self.default_filter.load(Ordering::Acquire))
    }

    /// Changes the default filter. Monitors see it at their next decision.
    pub fn set_default_filter(&self, filter: FilterSet) {
        self.default_filter.store(filter.to_bits(), Ordering::Release);
    }

    /// Tag context all monitors of this context must use.
    #[must_use]
    pub const fn tags(&self) -> &TagContext {
        &self.tags
    }

    /// Tags the monitors attach to lines they generate themselves.
    #[must_use]
    pub const fn well_known(&self) -> &WellKnownTags {
        &self.well_known
    }

    /// Where client faults of this context end up.
    #[must_use]
    pub const fn critical_errors(&self) -> &CriticalErrorCollector {
        &self.critical_errors
    }

    /// Options for relays created with [`crate::BridgeRelay::with_default_options`].
    #[must_use]
    pub const fn bridge_defaults(&self) -> RelayOptions {
        self.bridge_defaults
    }

    /// Installs the hook run on each monitor created from now on.
    pub fn set_auto_configuration(&self, hook: impl Fn(&Monitor) + Send + Sync + 'static) {
        *self
            .auto_configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Removes the hook. Monitors already configured keep their settings.
    pub fn clear_auto_configuration(&self) {
        *self
            .auto_configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Configured filter given to monitors created for `topic`.
    #[must_use]
    pub fn topic_filter(&self, topic: &str) -> Option<FilterSet> {
        self.topic_filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .copied()
    }

    /// Sets the filter for monitors created for `topic` from now on.
    pub fn set_topic_filter(&self, topic: impl Into<String>, filter: FilterSet) {
        self.topic_filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.into(), filter);
    }
}

impl std::fmt::Debug for MonitorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorContext")
            .field("name", &self.tags.name())
            .field("default_filter", &self.default_filter())
            .field("critical_errors", &self.critical_errors.len())
            .finish_non_exhaustive()
    }
}
