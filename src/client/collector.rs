//! Bounded in-memory capture of monitor output.

use super::{BoundClient, Client, ClientResult};
use crate::filter::FilterSet;
use crate::level::LogLevel;
use crate::monitor::MonitorHandle;
use crate::record::{Conclusion, ExceptionData, GroupRecord, LogLine, LogTime};
use crate::tags::TagSet;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Line,
    OpenGroup,
    CloseGroup,
}

/// One captured event.
#[derive(Debug, Clone)]
pub struct CollectedEntry {
    pub kind: EntryKind,
    pub level: LogLevel,
    pub text: String,
    pub tags: TagSet,
    pub exception: Option<ExceptionData>,
    /// Number of accepted groups open around the entry. A group's own
    /// open and close entries carry its depth.
    pub depth: usize,
    pub time: LogTime,
    /// Filled for [`EntryKind::CloseGroup`].
    pub conclusions: Vec<Conclusion>,
}

#[derive(Debug, Default)]
struct Captured {
    entries: VecDeque<CollectedEntry>,
    depth: usize,
    dropped: u64,
}

/// Bound client keeping the most recent entries its own filter accepts.
///
/// Its filter is also a floor for the monitor: a collector asking for
/// `Trace` lines makes the monitor emit them.
#[derive(Debug)]
pub struct Collector {
    filter: AtomicU16,
    capacity: usize,
    captured: Mutex<Captured>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl Collector {
    #[must_use]
    pub fn new(filter: FilterSet, capacity: usize) -> Self {
        Self {
            filter: AtomicU16::new(filter.to_bits()),
            capacity: capacity.max(1),
            captured: Mutex::new(Captured::default()),
            monitor: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn filter(&self) -> FilterSet {
        FilterSet::from_bits(self.filter.load(Ordering::Acquire))
    }

    /// Changes the filter and tells the bound monitor. Callable from any thread.
    pub fn set_minimal_filter(&self, filter: FilterSet) {
        let old = FilterSet::from_bits(self.filter.swap(filter.to_bits(), Ordering::AcqRel));
        if old != filter
            && let Some(handle) = self.handle()
        {
            handle.on_client_minimal_filter_changed(old, filter);
        }
    }

    /// Monitor this collector is attached to.
    #[must_use]
    pub fn handle(&self) -> Option<MonitorHandle> {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<CollectedEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Texts of the captured lines, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::Line)
            .map(|e| e.text.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Entries evicted to stay within capacity.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    pub fn clear(&self) {
        let mut captured = self.lock();
        captured.entries.clear();
        captured.dropped = 0;
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.captured.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, captured: &mut Captured, entry: CollectedEntry) {
        if captured.entries.len() == self.capacity {
            captured.entries.pop_front();
            captured.dropped += 1;
        }
        captured.entries.push_back(entry);
    }

    fn group_entry(group: &GroupRecord, kind: EntryKind, conclusions: &[Conclusion]) -> CollectedEntry {
        CollectedEntry {
            kind,
            level: group.level,
            text: group.text.clone(),
            tags: group.tags.clone(),
            exception: group.exception.clone(),
            depth: group.depth,
            time: group.close_time().unwrap_or(group.open_time),
            conclusions: conclusions.to_vec(),
        }
    }
}

impl Client for Collector {
    fn name(&self) -> &'static str {
        "Collector"
    }

    fn on_unfiltered_log(&self, line: &LogLine) -> ClientResult {
        if !self.filter().accepts_line(line.level.level, FilterSet::VERBOSE) {
            return Ok(());
        }
        let mut captured = self.lock();
        let entry = CollectedEntry {
            kind: EntryKind::Line,
            level: line.level,
            text: line.text.clone(),
            tags: line.tags.clone(),
            exception: line.exception.clone(),
            depth: captured.depth,
            time: line.time,
            conclusions: Vec::new(),
        };
        self.push(&mut captured, entry);
        Ok(())
    }

    fn on_open_group(&self, group: &Arc<GroupRecord>) -> ClientResult {
        let mut captured = self.lock();
        captured.depth = group.depth;
        if self.filter().accepts_group(group.level.level, FilterSet::VERBOSE) {
            self.push(&mut captured, Self::group_entry(group, EntryKind::OpenGroup, &[]));
        }
        Ok(())
    }

    fn on_group_closed(&self, group: &Arc<GroupRecord>, conclusions: &[Conclusion]) -> ClientResult {
        let mut captured = self.lock();
        captured.depth = group.depth.saturating_sub(1);
        if self.filter().accepts_group(group.level.level, FilterSet::VERBOSE) {
            self.push(
                &mut captured,
                Self::group_entry(group, EntryKind::CloseGroup, conclusions),
            );
        }
        Ok(())
    }
}

impl BoundClient for Collector {
    fn minimal_filter(&self) -> ClientResult<FilterSet> {
        Ok(self.filter())
    }

    fn set_monitor(&self, monitor: Option<&MonitorHandle>, _force_remove: bool) -> ClientResult {
        let mut bound = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        match monitor {
            Some(handle) => {
                if let Some(current) = bound.as_ref()
                    && current.is_alive()
                    && current != handle
                {
                    return Err(Box::new(crate::Error::ClientAlreadyBound(
                        self.name().to_string(),
                    )));
                }
                *bound = Some(handle.clone());
            }
            None => *bound = None,
        }
        Ok(())
    }
}
