use super::{BridgeRelay, RelayOptions, WireConclusion, WireLine};
use crate::filter::FilterSet;
use crate::monitor::{Monitor, MonitorInner};
use crate::record::GroupConclusion;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receiving end of bridges into one monitor.
///
/// Only wire types cross this boundary. The target does not keep its
/// monitor alive; once the monitor is gone, deliveries are dropped and the
/// reported filter is `OFF`.
pub struct BridgeTarget {
    monitor: Weak<MonitorInner>,
    relays: Mutex<Vec<Weak<BridgeRelay>>>,
}

impl BridgeTarget {
    pub(crate) const fn new(monitor: Weak<MonitorInner>) -> Self {
        Self {
            monitor,
            relays: Mutex::new(Vec::new()),
        }
    }

    fn monitor(&self) -> Option<Monitor> {
        self.monitor.upgrade().map(Monitor::from_inner)
    }

    fn relays(&self) -> MutexGuard<'_, Vec<Weak<BridgeRelay>>> {
        self.relays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.monitor.strong_count() > 0
    }

    /// Actual filter of the target monitor.
    ///
    /// Resynchronized only when the caller already runs inside an operation
    /// of the target; otherwise the last computed value is returned and the
    /// target reports the fresh one to its relays after its next resync.
    #[must_use]
    pub fn actual_filter(&self) -> FilterSet {
        self.monitor().map_or(FilterSet::OFF, |m| {
            if m.is_busy_on_current_thread() {
                m.actual_filter().unwrap_or_else(|_| m.cached_actual_filter())
            } else {
                m.cached_actual_filter()
            }
        })
    }

    /// Default filter of the target's context, used to resolve undefined axes.
    #[must_use]
    pub fn default_filter(&self) -> FilterSet {
        self.monitor()
            .map_or(FilterSet::VERBOSE, |m| m.context().default_filter())
    }

    /// Relay options configured for the target's context.
    #[must_use]
    pub fn default_relay_options(&self) -> RelayOptions {
        self.monitor()
            .map(|m| m.context().bridge_defaults())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn topic(&self) -> String {
        self.monitor().as_ref().map(Monitor::topic).unwrap_or_default()
    }

    #[must_use]
    pub fn auto_tags_text(&self) -> String {
        self.monitor()
            .map(|m| m.auto_tags().to_string())
            .unwrap_or_default()
    }

    /// # Errors
    /// Guard errors of the target monitor.
    pub fn unfiltered_log(&self, line: WireLine) -> Result<(), crate::Error> {
        let Some(monitor) = self.monitor() else {
            return Ok(());
        };
        let data = line.into_line_data(monitor.context().tags());
        monitor.unfiltered_log(data)
    }

    /// Opens a group unconditionally. Returns false if the monitor is gone.
    ///
    /// # Errors
    /// Guard errors of the target monitor.
    pub fn open_group(&self, line: WireLine) -> Result<bool, crate::Error> {
        let Some(monitor) = self.monitor() else {
            return Ok(false);
        };
        let data = line.into_group_data(monitor.context().tags());
        let token = monitor.unfiltered_open_group(data)?;
        Ok(!token.is_rejected())
    }

    /// Closes the target's current group.
    ///
    /// # Errors
    /// Guard errors of the target monitor.
    pub fn close_group(&self, conclusions: Vec<WireConclusion>) -> Result<bool, crate::Error> {
        let Some(monitor) = self.monitor() else {
            return Ok(false);
        };
        if conclusions.is_empty() {
            return monitor.close_group();
        }
        let tags = monitor.context().tags();
        let list = conclusions
            .into_iter()
            .map(|c| c.into_conclusion(tags))
            .collect();
        monitor.close_group_with(GroupConclusion::Tagged(list))
    }

    /// # Errors
    /// Guard errors of the target monitor.
    pub fn set_topic(&self, topic: &str) -> Result<(), crate::Error> {
        match self.monitor() {
            Some(monitor) => monitor.set_topic(topic),
            None => Ok(()),
        }
    }

    /// # Errors
    /// Guard errors of the target monitor.
    pub fn set_auto_tags(&self, tags: &str) -> Result<(), crate::Error> {
        let Some(monitor) = self.monitor() else {
            return Ok(());
        };
        let tags = monitor.context().tags().find_or_create(tags);
        monitor.set_auto_tags(tags)
    }

    pub(crate) fn add_relay(&self, relay: Weak<BridgeRelay>) {
        let mut relays = self.relays();
        relays.retain(|r| r.strong_count() > 0);
        relays.push(relay);
    }

    pub(crate) fn remove_relay(&self, relay: &Weak<BridgeRelay>) {
        self.relays()
            .retain(|r| r.strong_count() > 0 && !Weak::ptr_eq(r, relay));
    }

    /// Live relays feeding this target.
    #[must_use]
    pub fn relay_count(&self) -> usize {
        self.relays().iter().filter(|r| r.strong_count() > 0).count()
    }

    /// Invalidates the cached filter of every relay.
    pub(crate) fn notify_actual_filter_changed(&self) {
        let relays: Vec<Arc<BridgeRelay>> =
            self.relays().iter().filter_map(Weak::upgrade).collect();
        for relay in relays {
            relay.on_target_actual_filter_changed();
        }
    }
}

impl std::fmt::Debug for BridgeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeTarget")
            .field("alive", &self.is_alive())
            .field("relays", &self.relay_count())
            .finish()
    }
}
