use super::{BridgeTarget, RelayOptions, WireConclusion, WireLine};
use crate::client::{BoundClient, Client, ClientResult};
use crate::context::well_known;
use crate::filter::FilterSet;
use crate::internal;
use crate::level::LogLevel;
use crate::monitor::MonitorHandle;
use crate::record::{Conclusion, GroupRecord, LogLine};
use crate::tags::TagSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Text of the conclusions added to groups closed because a relay went away.
pub const PREMATURE_CLOSE_TEXT: &str = "Prematurely closed by bridge removal.";

/// Client of a source monitor replaying its activity onto a [`BridgeTarget`].
///
/// The relay reports the target's actual filter as its minimal filter, so
/// the source produces at least what the target wants. Groups are tracked
/// per depth: a close is forwarded only if the matching open was.
pub struct BridgeRelay {
    this: Weak<Self>,
    target: Arc<BridgeTarget>,
    options: RelayOptions,
    /// Cached target filter in the low 16 bits (`FilterSet::INVALID` when it
    /// must be fetched again), invalidation count above them.
    target_filter: AtomicU64,
    /// Index `depth - 1` tells whether the group at that depth was forwarded.
    opened: Mutex<Vec<bool>>,
    source: Mutex<Option<MonitorHandle>>,
}

const FILTER_BITS: u32 = 16;
const FILTER_MASK: u64 = (1 << FILTER_BITS) - 1;

const fn pack_filter(epoch: u64, filter: FilterSet) -> u64 {
    (epoch << FILTER_BITS) | filter.to_bits() as u64
}

#[allow(clippy::cast_possible_truncation)]
const fn unpack_filter(packed: u64) -> FilterSet {
    FilterSet::from_bits((packed & FILTER_MASK) as u16)
}

impl BridgeRelay {
    #[must_use]
    pub fn new(target: Arc<BridgeTarget>, options: RelayOptions) -> Arc<Self> {
        let relay = Arc::new_cyclic(|this| Self {
            this: this.clone(),
            target,
            options,
            target_filter: AtomicU64::new(pack_filter(0, FilterSet::INVALID)),
            opened: Mutex::new(Vec::new()),
            source: Mutex::new(None),
        });
        relay.target.add_relay(Arc::downgrade(&relay));
        relay
    }

    /// Relay using the options configured in the target's context.
    #[must_use]
    pub fn with_default_options(target: Arc<BridgeTarget>) -> Arc<Self> {
        let options = target.default_relay_options();
        Self::new(target, options)
    }

    #[must_use]
    pub const fn options(&self) -> RelayOptions {
        self.options
    }

    #[must_use]
    pub const fn target(&self) -> &Arc<BridgeTarget> {
        &self.target
    }

    /// Source monitor the relay is registered on.
    #[must_use]
    pub fn source(&self) -> Option<MonitorHandle> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Groups forwarded to the target and not closed yet.
    #[must_use]
    pub fn forwarded_open_groups(&self) -> usize {
        self.opened().iter().filter(|forwarded| **forwarded).count()
    }

    fn opened(&self) -> MutexGuard<'_, Vec<bool>> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The target's actual filter, fetched again after an invalidation.
    #[must_use]
    pub fn target_filter(&self) -> FilterSet {
        let mut seen = self.target_filter.load(Ordering::SeqCst);
        loop {
            let cached = unpack_filter(seen);
            if cached.is_valid() {
                return cached;
            }
            let fresh = self.target.actual_filter();
            match self.cache_target_filter(seen, fresh) {
                Ok(()) => return fresh,
                Err(current) => seen = current,
            }
        }
    }

    /// Stores `fresh` unless the cache moved since `seen` was read, in which
    /// case the current packed value is returned.
    fn cache_target_filter(&self, seen: u64, fresh: FilterSet) -> Result<(), u64> {
        let epoch = seen >> FILTER_BITS;
        self.target_filter
            .compare_exchange(
                seen,
                pack_filter(epoch, fresh),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
    }

    /// Called by the target when its actual filter changed.
    pub(crate) fn on_target_actual_filter_changed(&self) {
        let _ = self
            .target_filter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |packed| {
                let epoch = (packed >> FILTER_BITS).wrapping_add(1);
                Some(pack_filter(epoch, FilterSet::INVALID))
            });
        if let Some(source) = self.source() {
            source.signal_change();
        }
    }

    fn should_forward_line(&self, level: LogLevel) -> bool {
        if !level.filtered && !self.options.apply_target_filter {
            return true;
        }
        self.target_filter()
            .accepts_line(level.level, self.target.default_filter())
    }

    fn should_forward_group(&self, level: LogLevel) -> bool {
        if !level.filtered && !self.options.apply_target_filter {
            return true;
        }
        self.target_filter()
            .accepts_group(level.level, self.target.default_filter())
    }

    /// Closes every group still open on the target because of this relay.
    fn close_forwarded_groups(&self) {
        let opened = std::mem::take(&mut *self.opened());
        let pending = opened.iter().filter(|forwarded| **forwarded).count();
        if pending == 0 {
            return;
        }
        internal::debug(
            "BRIDGE",
            &format!("closing {pending} group(s) left open by a detached relay"),
        );
        for _ in 0..pending {
            let conclusion =
                WireConclusion::new(well_known::BRIDGE_PREMATURE_CLOSE, PREMATURE_CLOSE_TEXT);
            if let Err(e) = self.target.close_group(vec![conclusion]) {
                internal::warn("BRIDGE", &format!("premature close failed: {e}"));
            }
        }
    }
}

impl Client for BridgeRelay {
    fn name(&self) -> &'static str {
        "BridgeRelay"
    }

    fn on_unfiltered_log(&self, line: &LogLine) -> ClientResult {
        // The target gets its own topic line from set_topic.
        if self.options.push_topic_and_tags && line.tags.contains(well_known::TOPIC_CHANGED) {
            return Ok(());
        }
        if self.should_forward_line(line.level) {
            self.target.unfiltered_log(WireLine::from_line(line))?;
        }
        Ok(())
    }

    fn on_open_group(&self, group: &Arc<GroupRecord>) -> ClientResult {
        let forwarded =
            self.should_forward_group(group.level) && self.target.open_group(WireLine::from_group(group))?;
        let mut opened = self.opened();
        opened.resize(group.depth - 1, false);
        opened.push(forwarded);
        Ok(())
    }

    fn on_group_closed(&self, group: &Arc<GroupRecord>, conclusions: &[Conclusion]) -> ClientResult {
        let forwarded = {
            let mut opened = self.opened();
            let forwarded = opened.get(group.depth - 1).copied().unwrap_or(false);
            opened.truncate(group.depth - 1);
            forwarded
        };
        if forwarded {
            self.target
                .close_group(conclusions.iter().map(WireConclusion::from).collect())?;
        }
        Ok(())
    }

    fn on_topic_changed(&self, topic: &str, _file: &str, _line: u32) -> ClientResult {
        if self.options.push_topic_and_tags {
            self.target.set_topic(topic)?;
        }
        Ok(())
    }

    fn on_auto_tags_changed(&self, tags: &TagSet) -> ClientResult {
        if self.options.push_topic_and_tags {
            self.target.set_auto_tags(&tags.to_string())?;
        }
        Ok(())
    }
}

impl BoundClient for BridgeRelay {
    /// A gone target contributes nothing rather than shutting the source down.
    fn minimal_filter(&self) -> ClientResult<FilterSet> {
        if self.target.is_alive() {
            Ok(self.target_filter())
        } else {
            Ok(FilterSet::UNDEFINED)
        }
    }

    fn set_monitor(&self, monitor: Option<&MonitorHandle>, force_remove: bool) -> ClientResult {
        match monitor {
            Some(handle) => {
                {
                    let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(current) = source.as_ref()
                        && current.is_alive()
                        && current != handle
                    {
                        return Err(Box::new(crate::Error::ClientAlreadyBound(
                            self.name().to_string(),
                        )));
                    }
                    *source = Some(handle.clone());
                }
                self.opened().clear();
                internal::debug("BRIDGE", "relay bound to source monitor");
                if self.options.pull_topic_and_tags {
                    handle.initialize_topic_and_auto_tags(
                        &self.target.topic(),
                        &self.target.auto_tags_text(),
                    )?;
                }
            }
            None => {
                self.source
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                internal::debug(
                    "BRIDGE",
                    &format!("relay unbound from source monitor (forced: {force_remove})"),
                );
                self.close_forwarded_groups();
            }
        }
        Ok(())
    }
}

impl Drop for BridgeRelay {
    fn drop(&mut self) {
        self.target.remove_relay(&self.this);
    }
}

impl std::fmt::Debug for BridgeRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRelay")
            .field("options", &self.options)
            .field("forwarded_open_groups", &self.forwarded_open_groups())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MonitorContext;

    #[test]
    fn fetch_overtaken_by_invalidation_is_not_cached() {
        let target = MonitorContext::new().create_monitor();
        target.set_minimal_filter(FilterSet::RELEASE).unwrap();
        let relay = BridgeRelay::new(target.bridge_target(), RelayOptions::default());

        let seen = relay.target_filter.load(Ordering::SeqCst);
        let stale = relay.target.actual_filter();
        target.set_minimal_filter(FilterSet::VERBOSE).unwrap();

        assert!(relay.cache_target_filter(seen, stale).is_err());
        assert!(!unpack_filter(relay.target_filter.load(Ordering::SeqCst)).is_valid());
        assert_eq!(relay.target_filter(), FilterSet::VERBOSE);
    }

    #[test]
    fn packed_cache_keeps_epoch_and_filter_apart() {
        let packed = pack_filter(7, FilterSet::TERSE);
        assert_eq!(unpack_filter(packed), FilterSet::TERSE);
        assert_eq!(packed >> FILTER_BITS, 7);
        assert!(!unpack_filter(pack_filter(u64::MAX, FilterSet::INVALID)).is_valid());
    }
}
