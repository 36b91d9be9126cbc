//! Single-owner guard enforcing that a monitor runs one operation at a time.
//!
//! The owner is recorded as a per-thread token. Re-entering from the owning
//! thread and entering from another thread while owned are both caller bugs
//! and are reported as errors, never waited on.

use crate::internal;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

/// Non-zero token identifying the calling thread.
pub(crate) fn current_thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

#[derive(Debug, Default)]
pub(crate) struct ReentrancyGuard {
    /// 0 when free.
    owner: AtomicU64,
}

/// Held for the duration of one monitor operation; releases on drop,
/// including during unwinding.
#[must_use = "the monitor is released as soon as the guard is dropped"]
pub(crate) struct Entered<'a> {
    guard: &'a ReentrancyGuard,
    token: u64,
}

impl ReentrancyGuard {
    /// # Errors
    /// [`crate::Error::Reentrancy`] if the calling thread already owns the guard,
    /// [`crate::Error::ConcurrentAccess`] if another thread does.
    pub(crate) fn enter(&self) -> Result<Entered<'_>, crate::Error> {
        let token = current_thread_token();
        match self
            .owner
            .compare_exchange(0, token, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(Entered { guard: self, token }),
            Err(owner) if owner == token => Err(crate::Error::Reentrancy),
            Err(owner) => Err(crate::Error::ConcurrentAccess {
                owner,
                caller: token,
            }),
        }
    }

    /// Like [`Self::enter`] but tolerates the calling thread already owning
    /// the guard, in which case `Ok(None)` is returned and nothing will be released.
    ///
    /// # Errors
    /// [`crate::Error::ConcurrentAccess`] if another thread owns the guard.
    pub(crate) fn try_enter_concurrent_only(&self) -> Result<Option<Entered<'_>>, crate::Error> {
        match self.enter() {
            Ok(entered) => Ok(Some(entered)),
            Err(crate::Error::Reentrancy) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether the calling thread owns the guard, that is, runs inside an
    /// operation of the monitor.
    pub(crate) fn is_held_by_current_thread(&self) -> bool {
        self.owner.load(Ordering::Acquire) == current_thread_token()
    }

    fn release(&self, token: u64) -> bool {
        self.owner
            .compare_exchange(token, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        if !self.guard.release(self.token) {
            internal::error(
                "MONITOR",
                &format!(
                    "guard released by thread #{} but owned by #{}",
                    self.token,
                    self.guard.owner.load(Ordering::Acquire)
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn enter_release_enter() {
        let guard = ReentrancyGuard::default();
        drop(guard.enter().unwrap());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn same_thread_is_reentrancy() {
        let guard = ReentrancyGuard::default();
        let _entered = guard.enter().unwrap();
        assert!(matches!(guard.enter(), Err(Error::Reentrancy)));
        assert!(guard.try_enter_concurrent_only().unwrap().is_none());
        assert!(guard.is_held_by_current_thread());
    }

    #[test]
    fn other_thread_is_concurrent_access() {
        let guard = ReentrancyGuard::default();
        let _entered = guard.enter().unwrap();
        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(matches!(
                    guard.enter(),
                    Err(Error::ConcurrentAccess { .. })
                ));
                assert!(matches!(
                    guard.try_enter_concurrent_only(),
                    Err(Error::ConcurrentAccess { .. })
                ));
            });
        });
    }

    #[test]
    fn released_on_unwind() {
        let guard = ReentrancyGuard::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _entered = guard.enter().unwrap();
            panic!("inside operation");
        }));
        assert!(result.is_err());
        assert!(guard.enter().is_ok());
    }
}
