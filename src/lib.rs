//! `actmon` - Activity monitor with nested groups and filtered fan-out.
//!
//! A [`Monitor`] receives log lines and groups from application code,
//! decides with a two-axis [`FilterSet`] what gets through, and forwards
//! accepted records to registered clients:
//! - Nested groups with filter/tag restore on close and error escalation
//! - Client-contributed minimal filters, resynchronized lazily
//! - Reentrancy and cross-thread misuse detected, never deadlocked on
//! - Faulty clients isolated and reported to a critical error collector
//! - Bridges replaying one monitor's activity onto another
//!
//! # Example
//!
//! ```
//! use actmon::{Collector, FilterSet, Level, MonitorContext};
//! use std::sync::Arc;
//!
//! let context = MonitorContext::new();
//! let monitor = context.create_monitor();
//! monitor.set_minimal_filter(FilterSet::TERSE).unwrap();
//!
//! let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 100));
//! monitor.register_bound_client(collector.clone()).unwrap();
//!
//! monitor.with_group(Level::Info, "Import", |m| {
//!     m.trace("skipped").unwrap();
//!     m.error("row 12 is malformed").unwrap();
//! }).unwrap();
//!
//! assert_eq!(collector.lines(), ["row 12 is malformed"]);
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod context;
mod error;
pub mod filter;
pub mod internal;
pub mod level;
pub mod monitor;
pub mod record;
pub mod tags;

pub use bridge::{BridgeRelay, BridgeTarget, RelayOptions, WireConclusion, WireLine};
pub use client::{
    BoundClient, Client, ClientError, ClientResult, CollectedEntry, Collector, ConclusionMode,
    EntryKind, ErrorCounter, ErrorCounts, PathCatcher, PathEntry,
};
pub use config::Config;
pub use context::{CriticalError, CriticalErrorCollector, MonitorContext};
pub use error::Error;
pub use filter::FilterSet;
pub use level::{Level, LevelFilter, LogLevel};
pub use monitor::{GroupToken, Monitor, MonitorHandle};
pub use record::{
    Conclusion, ExceptionData, GroupConclusion, GroupData, GroupRecord, LineData, LogLine, LogTime,
};
pub use tags::{TagContext, TagSet};
