//! Keeps the actual filter in line with the minimal filters of bound clients.
//!
//! Clients signal changes by raising the dirty flag from any thread. The
//! owning thread recomputes the aggregate before its next filter decision.

use super::{dispatch, Monitor};
use crate::client::ClientRef;
use crate::filter::FilterSet;
use crate::internal;
use std::sync::atomic::{fence, Ordering};

impl Monitor {
    pub(super) fn resync_if_dirty(&self) {
        if self.inner.filter_dirty.load(Ordering::SeqCst) {
            self.resync();
        }
    }

    /// Recomputes the client filter. The caller owns the guard.
    pub(super) fn resync(&self) {
        let client_filter = loop {
            self.inner.filter_dirty.store(false, Ordering::SeqCst);
            let aggregate = self.aggregate_client_filters();
            fence(Ordering::SeqCst);
            if !self.inner.filter_dirty.load(Ordering::SeqCst) {
                break aggregate;
            }
            internal::trace("FILTER", "client filter changed during resync, retrying");
        };

        let changed = {
            let mut state = self.state();
            state.client_filter = client_filter;
            state.update_actual()
        };
        if changed {
            internal::trace(
                "FILTER",
                &format!("actual filter is now {}", self.cached_actual_filter()),
            );
            self.notify_actual_filter_changed();
        }
    }

    /// Combination of the minimal filters of every bound client.
    /// Faulty clients are evicted on the way.
    fn aggregate_client_filters(&self) -> FilterSet {
        let mut aggregate = FilterSet::UNDEFINED;
        for client in self.inner.clients.snapshot().iter() {
            let ClientRef::Bound(bound) = client else {
                continue;
            };
            match dispatch::call_client(|| bound.minimal_filter()) {
                Ok(filter) => {
                    aggregate = aggregate.combine(filter);
                    // OFF absorbs every other value.
                    if aggregate == FilterSet::OFF {
                        break;
                    }
                }
                Err(e) => self.remove_faulty(client, e),
            }
        }
        aggregate
    }

    /// Lets a bridge target tell its relays that this monitor's filter moved.
    pub(super) fn notify_actual_filter_changed(&self) {
        if let Some(target) = self.inner.bridge_target.get() {
            target.notify_actual_filter_changed();
        }
    }

    /// Applies a client's filter change without a full recomputation when
    /// the old value cannot have shaped the aggregate and the new one does
    /// not move it. The caller owns the guard.
    pub(super) fn client_filter_changed(&self, old: FilterSet, new: FilterSet) {
        if self.inner.filter_dirty.load(Ordering::SeqCst) {
            self.resync();
            return;
        }
        let current = self.state().client_filter;
        if !old.may_contribute_to(current) && current.combine(new) == current {
            return;
        }
        self.resync();
    }
}
