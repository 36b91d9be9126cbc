//! The activity monitor: topic, auto tags, filters, the group stack and
//! fan-out to registered clients.
//!
//! Every mutating operation takes the monitor's reentrancy guard for its
//! whole duration. Internal state sits behind a mutex that is never held
//! while client code runs, so clients may read the monitor from their
//! callbacks; they may not mutate it.

mod dispatch;
mod filter_sync;
mod guard;
mod handle;
mod stack;

pub use handle::MonitorHandle;

use crate::bridge::BridgeTarget;
use crate::client::{BoundClient, Client, ClientRef, ClientRegistry};
use crate::context::MonitorContext;
use crate::filter::FilterSet;
use crate::level::Level;
use crate::record::{
    Conclusion, ExceptionData, GroupConclusion, GroupData, GroupRecord, LineData, LogLine,
    LogTime,
};
use crate::tags::TagSet;
use chrono::{DateTime, Utc};
use guard::ReentrancyGuard;
use stack::{GroupStack, PoppedSlot};
use std::borrow::Cow;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Identifies a group returned by an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupToken {
    index: usize,
    serial: u64,
    depth: usize,
}

impl GroupToken {
    /// 0 when the group was rejected by the filter.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.depth == 0
    }
}

#[derive(Debug)]
struct CoreState {
    configured_filter: FilterSet,
    client_filter: FilterSet,
    actual_filter: FilterSet,
    topic: String,
    auto_tags: TagSet,
    last_log_time: LogTime,
    stack: GroupStack,
}

/// What a restore changed, so notifications can be sent once the state lock is gone.
struct Restored {
    filter_changed: bool,
    tags: Option<TagSet>,
    previous_topic: Option<String>,
}

impl CoreState {
    /// Recomputes the actual filter; true if it changed.
    fn update_actual(&mut self) -> bool {
        let actual = self.configured_filter.combine(self.client_filter);
        let changed = actual != self.actual_filter;
        self.actual_filter = actual;
        changed
    }

    fn next_log_time(&mut self, requested: Option<DateTime<Utc>>) -> LogTime {
        let time = LogTime::after(self.last_log_time, requested.unwrap_or_else(Utc::now));
        self.last_log_time = time;
        time
    }

    fn restore(&mut self, popped: PoppedSlot) -> Restored {
        self.configured_filter = popped.saved_filter;
        let filter_changed = self.update_actual();
        let tags = (self.auto_tags != popped.saved_tags).then(|| {
            self.auto_tags = popped.saved_tags;
            self.auto_tags.clone()
        });
        Restored {
            filter_changed,
            tags,
            previous_topic: popped.previous_topic,
        }
    }
}

pub(crate) struct MonitorInner {
    context: Arc<MonitorContext>,
    guard: ReentrancyGuard,
    filter_dirty: AtomicBool,
    clients: ClientRegistry,
    state: Mutex<CoreState>,
    bridge_target: OnceLock<Arc<BridgeTarget>>,
}

/// Handle to an activity monitor. Clones share the same monitor.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    /// Monitor of the process-wide context.
    #[must_use]
    pub fn new() -> Self {
        MonitorContext::global().create_monitor()
    }

    pub(crate) fn create(
        context: Arc<MonitorContext>,
        topic: &str,
        configured_filter: FilterSet,
    ) -> Self {
        let state = CoreState {
            configured_filter,
            client_filter: FilterSet::UNDEFINED,
            actual_filter: configured_filter,
            topic: topic.to_string(),
            auto_tags: TagSet::default(),
            last_log_time: LogTime::UNKNOWN,
            stack: GroupStack::default(),
        };
        Self {
            inner: Arc::new(MonitorInner {
                context,
                guard: ReentrancyGuard::default(),
                filter_dirty: AtomicBool::new(false),
                clients: ClientRegistry::default(),
                state: Mutex::new(state),
                bridge_target: OnceLock::new(),
            }),
        }
    }

    pub(crate) const fn from_inner(inner: Arc<MonitorInner>) -> Self {
        Self { inner }
    }

    fn state(&self) -> MutexGuard<'_, CoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn context(&self) -> &Arc<MonitorContext> {
        &self.inner.context
    }

    /// Weak handle given to bound clients.
    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle::new(Arc::downgrade(&self.inner))
    }

    /// Whether both handles designate the same monitor.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Endpoint through which relays attached to other monitors feed this one.
    #[must_use]
    pub fn bridge_target(&self) -> Arc<BridgeTarget> {
        self.inner
            .bridge_target
            .get_or_init(|| Arc::new(BridgeTarget::new(Arc::downgrade(&self.inner))))
            .clone()
    }

    /// Current topic, restored when the group that changed it closes.
    #[must_use]
    pub fn topic(&self) -> String {
        self.state().topic.clone()
    }

    /// Tags added to every line and group emitted from now on.
    #[must_use]
    pub fn auto_tags(&self) -> TagSet {
        self.state().auto_tags.clone()
    }

    /// Filter configured on the monitor itself, without client contributions.
    #[must_use]
    pub fn minimal_filter(&self) -> FilterSet {
        self.state().configured_filter
    }

    /// Last computed aggregate of client minimal filters, possibly stale.
    #[must_use]
    pub fn client_filter(&self) -> FilterSet {
        self.state().client_filter
    }

    /// Combination of the configured and client filters, resynchronized first
    /// if a client signaled a change. Also valid from inside a client callback,
    /// where the running operation already owns the monitor.
    ///
    /// # Errors
    /// [`crate::Error::ConcurrentAccess`] if a resync is needed while another thread uses the monitor.
    pub fn actual_filter(&self) -> Result<FilterSet, crate::Error> {
        if self.inner.filter_dirty.load(Ordering::SeqCst) {
            let _entered = self.inner.guard.try_enter_concurrent_only()?;
            self.resync();
        }
        Ok(self.state().actual_filter)
    }

    /// Whether the calling thread is inside an operation on this monitor.
    pub(crate) fn is_busy_on_current_thread(&self) -> bool {
        self.inner.guard.is_held_by_current_thread()
    }

    /// Actual filter as last computed, without resynchronizing.
    #[must_use]
    pub fn cached_actual_filter(&self) -> FilterSet {
        self.state().actual_filter
    }

    /// Whether a client signaled a change not yet folded into the actual filter.
    #[must_use]
    pub fn is_filter_dirty(&self) -> bool {
        self.inner.filter_dirty.load(Ordering::SeqCst)
    }

    /// Marks the actual filter as needing a resync. Callable from any thread.
    pub fn signal_change(&self) {
        self.inner.mark_filter_dirty();
    }

    /// Stamp of the last emitted line or group.
    #[must_use]
    pub fn last_log_time(&self) -> LogTime {
        self.state().last_log_time
    }

    /// Innermost accepted group.
    #[must_use]
    pub fn current_group(&self) -> Option<Arc<GroupRecord>> {
        self.state().stack.current_unfiltered().cloned()
    }

    /// Open groups, rejected ones included.
    #[must_use]
    pub fn open_group_count(&self) -> usize {
        self.state().stack.open_count()
    }

    /// Depth of the innermost accepted group.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state()
            .stack
            .current_unfiltered()
            .map_or(0, |g| g.depth)
    }

    /// Slots allocated for open groups. Grows, never shrinks.
    #[must_use]
    pub fn group_capacity(&self) -> usize {
        self.state().stack.capacity()
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.inner.clients.len()
    }

    /// Registered clients in registration order.
    #[must_use]
    pub fn clients(&self) -> Arc<[ClientRef]> {
        self.inner.clients.snapshot()
    }

    fn check_tags(&self, tags: &TagSet) -> Result<(), crate::Error> {
        if self.inner.context.tags().accepts(tags) {
            Ok(())
        } else {
            Err(crate::Error::ForeignTags(tags.to_string()))
        }
    }

    /// # Errors
    /// [`crate::Error::Reentrancy`] or [`crate::Error::ConcurrentAccess`] on misuse.
    #[track_caller]
    pub fn set_topic(&self, topic: &str) -> Result<(), crate::Error> {
        let location = Location::caller();
        let _entered = self.inner.guard.enter()?;
        self.do_set_topic(topic, Cow::Borrowed(location.file()), location.line(), true)
    }

    pub(crate) fn do_set_topic(
        &self,
        topic: &str,
        file: Cow<'static, str>,
        line: u32,
        remember_previous: bool,
    ) -> Result<(), crate::Error> {
        {
            let mut state = self.state();
            if state.topic == topic {
                return Ok(());
            }
            let previous = std::mem::replace(&mut state.topic, topic.to_string());
            if remember_previous
                && let Some(slot) = state.stack.current_slot_mut()
                && slot.previous_topic.is_none()
            {
                slot.previous_topic = Some(previous);
            }
        }
        self.dispatch(|c| c.on_topic_changed(topic, &file, line));
        let tag = self.inner.context.well_known().topic_changed.clone();
        let data = LineData::new(Level::Info, format!("Topic: {topic}"))
            .tags(tag)
            .location(file, line);
        self.do_unfiltered_log(data)
    }

    /// # Errors
    /// [`crate::Error::ForeignTags`] for tags of another context, or a guard error on misuse.
    pub fn set_auto_tags(&self, tags: TagSet) -> Result<(), crate::Error> {
        let _entered = self.inner.guard.enter()?;
        self.check_tags(&tags)?;
        self.do_set_auto_tags(tags);
        Ok(())
    }

    pub(crate) fn do_set_auto_tags(&self, tags: TagSet) {
        {
            let mut state = self.state();
            if state.auto_tags == tags {
                return;
            }
            state.auto_tags = tags.clone();
        }
        self.dispatch(|c| c.on_auto_tags_changed(&tags));
    }

    /// Sets the configured filter. Groups restore the value they saw at open.
    ///
    /// # Errors
    /// [`crate::Error::Reentrancy`] or [`crate::Error::ConcurrentAccess`] on misuse.
    pub fn set_minimal_filter(&self, filter: FilterSet) -> Result<(), crate::Error> {
        let _entered = self.inner.guard.enter()?;
        let changed = {
            let mut state = self.state();
            state.configured_filter = filter;
            state.update_actual()
        };
        if changed {
            self.notify_actual_filter_changed();
        }
        Ok(())
    }

    /// # Errors
    /// Guard errors when a resync is needed concurrently.
    pub fn should_log_line(&self, level: Level) -> Result<bool, crate::Error> {
        let filter = self.actual_filter()?;
        Ok(filter.accepts_line(level, self.inner.context.default_filter()))
    }

    /// # Errors
    /// Guard errors when a resync is needed concurrently.
    pub fn should_open_group(&self, level: Level) -> Result<bool, crate::Error> {
        let filter = self.actual_filter()?;
        Ok(filter.accepts_group(level, self.inner.context.default_filter()))
    }

    /// Emits a line if the actual filter accepts `level`. Returns whether it was emitted.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn log(&self, level: Level, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(level, text))
    }

    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn trace(&self, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(Level::Trace, text))
    }

    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn info(&self, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(Level::Info, text))
    }

    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn warn(&self, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(Level::Warn, text))
    }

    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn error(&self, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(Level::Error, text))
    }

    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn fatal(&self, text: impl Into<String>) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(Level::Fatal, text))
    }

    /// Emits a line carrying `error` as exception data.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn log_error<E: std::error::Error + 'static>(
        &self,
        level: Level,
        text: impl Into<String>,
        error: &E,
    ) -> Result<bool, crate::Error> {
        self.log_with(LineData::new(level, text).exception(ExceptionData::from_error(error)))
    }

    /// Filtered emission of a fully described line.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    pub fn log_with(&self, data: LineData) -> Result<bool, crate::Error> {
        let _entered = self.inner.guard.enter()?;
        self.check_tags(&data.tags)?;
        self.resync_if_dirty();
        let accepted = self
            .state()
            .actual_filter
            .accepts_line(data.level.level, self.inner.context.default_filter());
        if accepted {
            self.do_unfiltered_log(data.filtered())?;
        }
        Ok(accepted)
    }

    /// Sends a line to every client without consulting the filter.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    pub fn unfiltered_log(&self, data: LineData) -> Result<(), crate::Error> {
        let _entered = self.inner.guard.enter()?;
        self.check_tags(&data.tags)?;
        self.do_unfiltered_log(data)
    }

    fn do_unfiltered_log(&self, data: LineData) -> Result<(), crate::Error> {
        let line = {
            let mut state = self.state();
            let tags = data.tags.union(&state.auto_tags)?;
            let time = state.next_log_time(data.time);
            LogLine {
                level: data.level,
                text: data.text,
                tags,
                exception: data.exception,
                time,
                file: data.file,
                line: data.line,
            }
        };
        self.dispatch(|c| c.on_unfiltered_log(&line));
        Ok(())
    }

    /// Opens a group, rejected (depth 0) if the filter refuses `level`.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn open_group(&self, level: Level, text: impl Into<String>) -> Result<GroupToken, crate::Error> {
        self.open_group_with(GroupData::new(level, text))
    }

    /// Opens a group; the filter applies unless `data` is already marked filtered.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    pub fn open_group_with(&self, data: GroupData) -> Result<GroupToken, crate::Error> {
        let apply_filter = !data.data.level.filtered;
        let _entered = self.inner.guard.enter()?;
        self.do_open_group(data, apply_filter)
    }

    /// Opens a group without consulting the filter.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    pub fn unfiltered_open_group(&self, data: GroupData) -> Result<GroupToken, crate::Error> {
        let _entered = self.inner.guard.enter()?;
        self.do_open_group(data, false)
    }

    fn do_open_group(&self, mut data: GroupData, apply_filter: bool) -> Result<GroupToken, crate::Error> {
        self.check_tags(&data.data.tags)?;
        self.resync_if_dirty();
        let default_filter = self.inner.context.default_filter();

        let (record, token, escalated) = {
            let mut state = self.state();
            let level = data.data.level.level;
            let accepted =
                !apply_filter || state.actual_filter.accepts_group(level, default_filter);
            let tags = data.data.tags.union(&state.auto_tags)?;
            let saved_filter = state.configured_filter;
            let saved_tags = state.auto_tags.clone();
            let (index, serial) = state.stack.push(saved_filter, saved_tags);
            if !accepted {
                return Ok(GroupToken {
                    index,
                    serial,
                    depth: 0,
                });
            }

            let parent = state.stack.current_unfiltered().cloned();
            let depth = parent.as_ref().map_or(1, |p| p.depth + 1);
            let time = state.next_log_time(data.data.time);
            if apply_filter {
                data.data.level.filtered = true;
            }
            let record = Arc::new(GroupRecord::new(index, depth, data, time, tags, parent));
            state.stack.accept(index, record.clone());

            let escalated = level.is_error_or_fatal() && {
                state.configured_filter = FilterSet::VERBOSE;
                state.update_actual()
            };
            let token = GroupToken {
                index,
                serial,
                depth,
            };
            (record, token, escalated)
        };

        if escalated {
            self.notify_actual_filter_changed();
        }
        self.dispatch(|c| c.on_open_group(&record));
        Ok(token)
    }

    /// Closes the current group. Returns false when no group is open.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn close_group(&self) -> Result<bool, crate::Error> {
        let location = Location::caller();
        let _entered = self.inner.guard.enter()?;
        self.do_close_group(None, None, location)
    }

    /// Closes the current group with an explicit conclusion.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    #[track_caller]
    pub fn close_group_with(
        &self,
        conclusion: impl Into<GroupConclusion>,
    ) -> Result<bool, crate::Error> {
        let location = Location::caller();
        let _entered = self.inner.guard.enter()?;
        self.do_close_group(None, Some(conclusion.into()), location)
    }

    /// Closes the group identified by `token` and every group opened inside it.
    /// Returns false if that group is no longer open.
    ///
    /// # Errors
    /// [`crate::Error::ForeignTags`] or guard errors.
    #[track_caller]
    pub fn close_group_at(
        &self,
        token: GroupToken,
        conclusion: Option<GroupConclusion>,
    ) -> Result<bool, crate::Error> {
        let location = Location::caller();
        let _entered = self.inner.guard.enter()?;
        self.do_close_group(Some((token.index, token.serial)), conclusion, location)
    }

    /// Runs `f` inside a group opened at `level`.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    #[track_caller]
    pub fn with_group<R>(
        &self,
        level: Level,
        text: impl Into<String>,
        f: impl FnOnce(&Self) -> R,
    ) -> Result<R, crate::Error> {
        let token = self.open_group(level, text)?;
        let result = f(self);
        self.close_group_at(token, None)?;
        Ok(result)
    }

    fn do_close_group(
        &self,
        target: Option<(usize, u64)>,
        conclusion: Option<GroupConclusion>,
        location: &'static Location<'static>,
    ) -> Result<bool, crate::Error> {
        if let Some(GroupConclusion::Tagged(list)) = &conclusion {
            for c in list {
                self.check_tags(&c.tag)?;
            }
        }

        let target_index = {
            let state = self.state();
            match (target, state.stack.current_index()) {
                (_, None) => return Ok(false),
                (None, Some(current)) => current,
                (Some((index, serial)), Some(_)) => {
                    if !state.stack.is_open(index, serial) {
                        return Ok(false);
                    }
                    index
                }
            }
        };

        while self
            .state()
            .stack
            .current_index()
            .is_some_and(|current| current > target_index)
        {
            self.close_current(None, location)?;
        }
        self.close_current(conclusion, location)?;
        Ok(true)
    }

    fn close_current(
        &self,
        conclusion: Option<GroupConclusion>,
        location: &'static Location<'static>,
    ) -> Result<(), crate::Error> {
        let record = self.state().stack.current_record().cloned();

        let Some(record) = record else {
            // Rejected slot: clients never saw it open.
            let Some(restored) = self.pop_and_restore() else {
                return Ok(());
            };
            self.notify_restored(restored.filter_changed, restored.tags);
            return self.restore_topic(restored.previous_topic, location);
        };

        let mut conclusions = self.initial_conclusions(conclusion, &record);
        {
            let mut state = self.state();
            let time = state.next_log_time(None);
            record.mark_closed(time);
        }
        self.dispatch(|c| c.on_group_closing(&record, &mut conclusions));

        let Some(restored) = self.pop_and_restore() else {
            return Ok(());
        };
        self.notify_restored(restored.filter_changed, restored.tags);
        self.dispatch(|c| c.on_group_closed(&record, &conclusions));
        self.restore_topic(restored.previous_topic, location)
    }

    fn pop_and_restore(&self) -> Option<Restored> {
        let mut state = self.state();
        let popped = state.stack.pop()?;
        Some(state.restore(popped))
    }

    fn notify_restored(&self, filter_changed: bool, tags: Option<TagSet>) {
        if filter_changed {
            self.notify_actual_filter_changed();
        }
        if let Some(tags) = tags {
            self.dispatch(|c| c.on_auto_tags_changed(&tags));
        }
    }

    fn restore_topic(
        &self,
        previous_topic: Option<String>,
        location: &'static Location<'static>,
    ) -> Result<(), crate::Error> {
        match previous_topic {
            Some(topic) => {
                self.do_set_topic(&topic, Cow::Borrowed(location.file()), location.line(), false)
            }
            None => Ok(()),
        }
    }

    /// An explicit non-empty conclusion wins; otherwise the group's deferred
    /// conclusion is used. The two are never combined here.
    fn initial_conclusions(
        &self,
        conclusion: Option<GroupConclusion>,
        record: &GroupRecord,
    ) -> Vec<Conclusion> {
        let auto = record.take_auto_conclusion();
        let well_known = self.inner.context.well_known();
        match conclusion.filter(|c| !c.is_empty()) {
            Some(GroupConclusion::Text(text)) => {
                vec![Conclusion::new(well_known.user_conclusion.clone(), text)]
            }
            Some(GroupConclusion::Tagged(list)) => list,
            None => auto
                .map(|f| f())
                .filter(|text| !text.is_empty())
                .map(|text| vec![Conclusion::new(well_known.auto_conclusion.clone(), text)])
                .unwrap_or_default(),
        }
    }

    /// Registers a plain client. Returns false if it was already registered.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    pub fn register_client(&self, client: Arc<dyn Client>) -> Result<bool, crate::Error> {
        self.register(ClientRef::Plain(client))
    }

    /// Registers a bound client and attaches it to this monitor.
    ///
    /// # Errors
    /// [`crate::Error::ClientRegistration`] if the client refuses, or guard errors.
    pub fn register_bound_client(
        &self,
        client: Arc<dyn BoundClient>,
    ) -> Result<bool, crate::Error> {
        self.register(ClientRef::Bound(client))
    }

    fn register(&self, client: ClientRef) -> Result<bool, crate::Error> {
        let _entered = self.inner.guard.enter()?;
        if self.inner.clients.contains(client.addr()) {
            return Ok(false);
        }
        if let Some(bound) = client.as_bound() {
            let handle = self.handle();
            dispatch::call_client(|| bound.set_monitor(Some(&handle), false)).map_err(|e| {
                crate::Error::ClientRegistration {
                    client: client.name().to_string(),
                    source: Box::new(e),
                }
            })?;
            self.inner.mark_filter_dirty();
        }
        crate::internal::trace("CLIENT", &format!("registered {client:?}"));
        Ok(self.inner.clients.add(client))
    }

    /// Removes a client by identity. Returns false if it was not registered.
    ///
    /// # Errors
    /// Guard errors on reentrant or concurrent use.
    pub fn unregister_client<C: ?Sized>(&self, client: &Arc<C>) -> Result<bool, crate::Error> {
        let _entered = self.inner.guard.enter()?;
        Ok(self.remove_client(Arc::as_ptr(client).cast(), false).is_some())
    }
}

impl MonitorInner {
    pub(crate) fn mark_filter_dirty(&self) {
        self.filter_dirty.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Monitor")
            .field("topic", &state.topic)
            .field("auto_tags", &state.auto_tags)
            .field("actual_filter", &state.actual_filter)
            .field("open_groups", &state.stack.open_count())
            .finish_non_exhaustive()
    }
}
