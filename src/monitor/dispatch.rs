//! Fan-out of monitor events to clients, with fault isolation.

use super::Monitor;
use crate::client::{Client, ClientRef, ClientResult};
use crate::internal;
use crate::record::ExceptionData;
use std::panic::{self, AssertUnwindSafe};

/// Runs one client callback, turning a returned error or a panic into
/// exception data.
pub(crate) fn call_client<T>(f: impl FnOnce() -> ClientResult<T>) -> Result<T, ExceptionData> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ExceptionData::from_dyn(e.as_ref())),
        Err(payload) => Err(ExceptionData::from_panic(payload.as_ref())),
    }
}

impl Monitor {
    /// Calls `f` on every registered client in registration order.
    /// A client that fails is removed and the remaining ones still run.
    pub(super) fn dispatch(&self, mut f: impl FnMut(&dyn Client) -> ClientResult) {
        let clients = self.inner.clients.snapshot();
        for client in clients.iter() {
            if let Err(e) = call_client(|| f(client.client())) {
                self.remove_faulty(client, e);
            }
        }
    }

    pub(super) fn remove_faulty(&self, client: &ClientRef, error: ExceptionData) {
        internal::error(
            "CLIENT",
            &format!("removing {client:?} after failure: {error}"),
        );
        self.inner.context.critical_errors().add(error, client.name());
        self.remove_client(client.addr(), true);
    }

    /// Unregisters the client at `addr`, detaching it if bound.
    /// The caller owns the guard.
    pub(super) fn remove_client(&self, addr: *const (), force: bool) -> Option<ClientRef> {
        let removed = self.inner.clients.remove(addr)?;
        if let ClientRef::Bound(bound) = &removed {
            if let Err(e) = call_client(|| bound.set_monitor(None, force)) {
                internal::warn(
                    "CLIENT",
                    &format!("{removed:?} failed while being detached: {e}"),
                );
            }
            self.inner.mark_filter_dirty();
        }
        internal::trace("CLIENT", &format!("unregistered {removed:?}"));
        Some(removed)
    }
}
