//! Copy-on-write list of registered clients.

use super::ClientRef;
use std::sync::{Arc, Mutex, PoisonError};

/// Ordered clients of one monitor.
///
/// Every change publishes a fresh array, so dispatch iterates a snapshot and
/// never observes a half-applied registration.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<Arc<[ClientRef]>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn snapshot(&self) -> Arc<[ClientRef]> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub(crate) fn contains(&self, addr: *const ()) -> bool {
        self.snapshot().iter().any(|c| c.addr() == addr)
    }

    /// Appends `client` unless the same object is already registered.
    pub(crate) fn add(&self, client: ClientRef) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if clients.iter().any(|c| c.addr() == client.addr()) {
            return false;
        }
        let mut next = clients.to_vec();
        next.push(client);
        *clients = next.into();
        true
    }

    pub(crate) fn remove(&self, addr: *const ()) -> Option<ClientRef> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let position = clients.iter().position(|c| c.addr() == addr)?;
        let mut next = clients.to_vec();
        let removed = next.remove(position);
        *clients = next.into();
        Some(removed)
    }
}
