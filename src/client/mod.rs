//! Listeners attached to a monitor.
//!
//! A [`Client`] receives every accepted line, group and topic/tag change.
//! A [`BoundClient`] additionally reports a minimal filter the monitor must
//! honor and is told when it is attached to or detached from a monitor.
//! Which of the two a client is gets decided once, at registration.

mod collector;
mod error_counter;
mod path_catcher;
mod registry;

pub use collector::{CollectedEntry, Collector, EntryKind};
pub use error_counter::{ConclusionMode, ErrorCounter, ErrorCounts};
pub use path_catcher::{PathCatcher, PathEntry};
pub use registry::ClientRegistry;

use crate::filter::FilterSet;
use crate::monitor::MonitorHandle;
use crate::record::{Conclusion, GroupRecord, LogLine};
use crate::tags::TagSet;
use std::sync::Arc;

/// Error a client callback may report. The client is then removed.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

pub type ClientResult<T = ()> = Result<T, ClientError>;

/// Listener of one or more monitors.
///
/// Callbacks run synchronously on the thread that drives the monitor, while
/// that monitor is busy: calling back into the same monitor from a callback
/// fails with [`crate::Error::Reentrancy`]. Returning an error or panicking
/// removes the client and reports the fault to the critical error collector.
pub trait Client: Send + Sync {
    /// Used as context when the client faults.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn on_unfiltered_log(&self, _line: &LogLine) -> ClientResult {
        Ok(())
    }

    fn on_open_group(&self, _group: &Arc<GroupRecord>) -> ClientResult {
        Ok(())
    }

    /// May add, remove or rewrite conclusions before the group is popped.
    fn on_group_closing(
        &self,
        _group: &Arc<GroupRecord>,
        _conclusions: &mut Vec<Conclusion>,
    ) -> ClientResult {
        Ok(())
    }

    fn on_group_closed(&self, _group: &Arc<GroupRecord>, _conclusions: &[Conclusion]) -> ClientResult {
        Ok(())
    }

    fn on_topic_changed(&self, _topic: &str, _file: &str, _line: u32) -> ClientResult {
        Ok(())
    }

    fn on_auto_tags_changed(&self, _tags: &TagSet) -> ClientResult {
        Ok(())
    }
}

/// Client that constrains the monitor filter and tracks the monitor it is bound to.
pub trait BoundClient: Client {
    /// Floor combined into the monitor's client filter.
    ///
    /// When it changes, call [`MonitorHandle::signal_change`] (from any
    /// thread) or [`MonitorHandle::on_client_minimal_filter_changed`].
    fn minimal_filter(&self) -> ClientResult<FilterSet>;

    /// Called with `Some` on registration and `None` on removal.
    /// `force_remove` is set when the monitor evicts a faulty client.
    ///
    /// Returning an error on registration aborts it.
    fn set_monitor(&self, monitor: Option<&MonitorHandle>, force_remove: bool) -> ClientResult;
}

/// Registered client with its capability resolved.
#[derive(Clone)]
pub enum ClientRef {
    Plain(Arc<dyn Client>),
    Bound(Arc<dyn BoundClient>),
}

impl ClientRef {
    #[must_use]
    pub fn client(&self) -> &dyn Client {
        match self {
            Self::Plain(client) => client.as_ref(),
            Self::Bound(client) => client.as_ref(),
        }
    }

    #[must_use]
    pub const fn as_bound(&self) -> Option<&Arc<dyn BoundClient>> {
        match self {
            Self::Plain(_) => None,
            Self::Bound(client) => Some(client),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.client().name()
    }

    /// Identity of the client object, independent of the trait it was registered as.
    pub(crate) fn addr(&self) -> *const () {
        match self {
            Self::Plain(client) => Arc::as_ptr(client).cast(),
            Self::Bound(client) => Arc::as_ptr(client).cast(),
        }
    }
}

impl std::fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => write!(f, "Plain({})", self.name()),
            Self::Bound(_) => write!(f, "Bound({})", self.name()),
        }
    }
}
