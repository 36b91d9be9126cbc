//! Bounded record of faults raised by clients.

use crate::record::ExceptionData;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use ulid::Ulid;

/// One client fault.
#[derive(Debug, Clone)]
pub struct CriticalError {
    pub id: Ulid,
    /// Position among every error ever added, dropped ones included.
    pub sequence: u64,
    pub time: DateTime<Utc>,
    /// Who raised it, usually a client name.
    pub context: String,
    pub error: ExceptionData,
}

#[derive(Debug, Default)]
struct Ring {
    entries: VecDeque<CriticalError>,
    next_sequence: u64,
    dropped: u64,
}

/// Keeps the most recent critical errors; older ones are dropped and counted.
#[derive(Debug)]
pub struct CriticalErrorCollector {
    capacity: usize,
    ring: Mutex<Ring>,
}

impl CriticalErrorCollector {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ring: Mutex::new(Ring::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `error`, returning its id.
    pub fn add(&self, error: ExceptionData, context: &str) -> Ulid {
        let mut ring = self.lock();
        let id = Ulid::new();
        let sequence = ring.next_sequence;
        ring.next_sequence += 1;
        if ring.entries.len() == self.capacity {
            ring.entries.pop_front();
            ring.dropped += 1;
        }
        ring.entries.push_back(CriticalError {
            id,
            sequence,
            time: Utc::now(),
            context: context.to_string(),
            error,
        });
        id
    }

    /// Retained errors, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<CriticalError> {
        self.lock().entries.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.lock().dropped
    }

    /// Removes and returns every retained error.
    pub fn drain(&self) -> Vec<CriticalError> {
        self.lock().entries.drain(..).collect()
    }

    pub fn clear(&self) {
        let mut ring = self.lock();
        ring.entries.clear();
        ring.dropped = 0;
    }
}

impl Default for CriticalErrorCollector {
    fn default() -> Self {
        Self::new(128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_dropped() {
        let collector = CriticalErrorCollector::new(2);
        for i in 0..3 {
            collector.add(ExceptionData::new("test", format!("fault {i}")), "client");
        }
        let errors = collector.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].sequence, 1);
        assert_eq!(errors[1].error.message, "fault 2");
        assert_eq!(collector.dropped_count(), 1);
        assert_ne!(errors[0].id, errors[1].id);
    }
}
