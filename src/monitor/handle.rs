use super::{Monitor, MonitorInner};
use crate::filter::FilterSet;
use std::borrow::Cow;
use std::panic::Location;
use std::sync::{Arc, Weak};

/// Non-owning reference to a monitor, handed to bound clients.
///
/// Holding one never keeps a monitor alive; once the monitor is dropped
/// every method becomes a no-op.
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Weak<MonitorInner>,
}

impl MonitorHandle {
    pub(crate) const fn new(inner: Weak<MonitorInner>) -> Self {
        Self { inner }
    }

    /// The monitor, unless it was dropped.
    #[must_use]
    pub fn monitor(&self) -> Option<Monitor> {
        self.inner.upgrade().map(Monitor::from_inner)
    }

    /// Whether the monitor still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether this handle designates `monitor`.
    #[must_use]
    pub fn is(&self, monitor: &Monitor) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&monitor.inner))
    }

    /// Marks the monitor's filter as stale. Safe from any thread, at any time.
    pub fn signal_change(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.mark_filter_dirty();
        }
    }

    /// Reports that a client's minimal filter went from `old` to `new`.
    ///
    /// From inside an operation on the monitor (typically the client's own
    /// callback) the change is applied at once, skipping the recomputation
    /// when it cannot move the aggregate. From anywhere else the monitor is
    /// only marked stale: another thread never enters it, and the owner
    /// catches up at its next operation.
    pub fn on_client_minimal_filter_changed(&self, old: FilterSet, new: FilterSet) {
        let Some(monitor) = self.monitor() else {
            return;
        };
        if monitor.is_busy_on_current_thread() {
            monitor.client_filter_changed(old, new);
        } else {
            monitor.inner.mark_filter_dirty();
        }
    }

    /// Sets topic and auto tags in one step, typically while a client is
    /// being attached and the monitor is already busy on this thread.
    ///
    /// # Errors
    /// [`crate::Error::ConcurrentAccess`] if another thread is using the monitor.
    #[track_caller]
    pub fn initialize_topic_and_auto_tags(
        &self,
        topic: &str,
        tags: &str,
    ) -> Result<(), crate::Error> {
        let location = Location::caller();
        let Some(monitor) = self.monitor() else {
            return Ok(());
        };
        let _entered = monitor.inner.guard.try_enter_concurrent_only()?;
        let tags = monitor.inner.context.tags().find_or_create(tags);
        monitor.do_set_auto_tags(tags);
        monitor.do_set_topic(topic, Cow::Borrowed(location.file()), location.line(), true)
    }
}

impl PartialEq for MonitorHandle {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MonitorHandle {}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
