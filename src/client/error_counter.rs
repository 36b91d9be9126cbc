//! Per-group error and warning counts, with an optional closing conclusion.

use super::{Client, ClientResult};
use crate::level::Level;
use crate::record::{Conclusion, GroupRecord, LogLine};
use crate::tags::TagSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Counts of fatal, error and warn entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    pub fatal: u32,
    pub error: u32,
    pub warn: u32,
}

impl ErrorCounts {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fatal == 0 && self.error == 0 && self.warn == 0
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.fatal + self.error + self.warn
    }

    fn count(&mut self, level: Level) {
        match level {
            Level::Fatal => self.fatal += 1,
            Level::Error => self.error += 1,
            Level::Warn => self.warn += 1,
            Level::Trace | Level::Info => {}
        }
    }

    fn absorb(&mut self, other: Self) {
        self.fatal += other.fatal;
        self.error += other.error;
        self.warn += other.warn;
    }
}

impl fmt::Display for ErrorCounts {
    /// `1 fatal, 2 errors, 1 warning`; empty counts print nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.fatal, "fatal", "fatal"),
            (self.error, "error", "errors"),
            (self.warn, "warning", "warnings"),
        ];
        let mut first = true;
        for (n, one, many) in parts {
            if n == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{n} {}", if n == 1 { one } else { many })?;
        }
        Ok(())
    }
}

/// When the counter adds its own conclusion to a closing group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConclusionMode {
    #[default]
    None,
    /// Only when no other conclusion is present.
    SetWhenEmpty,
    AlwaysAppend,
}

/// Counts errors and warnings per open group and rolls them up on close.
#[derive(Debug)]
pub struct ErrorCounter {
    mode: ConclusionMode,
    tag: TagSet,
    /// Index 0 counts everything outside groups.
    stack: Mutex<Vec<ErrorCounts>>,
}

impl Default for ErrorCounter {
    fn default() -> Self {
        Self::new(ConclusionMode::None)
    }
}

impl ErrorCounter {
    #[must_use]
    pub fn new(mode: ConclusionMode) -> Self {
        Self {
            mode,
            tag: TagSet::default(),
            stack: Mutex::new(vec![ErrorCounts::default()]),
        }
    }

    /// Tag attached to the conclusions this counter contributes.
    #[must_use]
    pub fn with_tag(mut self, tag: TagSet) -> Self {
        self.tag = tag;
        self
    }

    /// Counts of the innermost open group.
    #[must_use]
    pub fn current(&self) -> ErrorCounts {
        self.lock().last().copied().unwrap_or_default()
    }

    /// Counts outside any group, closed groups included.
    #[must_use]
    pub fn root(&self) -> ErrorCounts {
        self.lock().first().copied().unwrap_or_default()
    }

    pub fn clear(&self) {
        *self.lock() = vec![ErrorCounts::default()];
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ErrorCounts>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Client for ErrorCounter {
    fn name(&self) -> &'static str {
        "ErrorCounter"
    }

    fn on_unfiltered_log(&self, line: &LogLine) -> ClientResult {
        if let Some(top) = self.lock().last_mut() {
            top.count(line.level.level);
        }
        Ok(())
    }

    fn on_open_group(&self, group: &Arc<GroupRecord>) -> ClientResult {
        let mut stack = self.lock();
        if let Some(top) = stack.last_mut() {
            top.count(group.level.level);
        }
        stack.push(ErrorCounts::default());
        Ok(())
    }

    fn on_group_closing(
        &self,
        _group: &Arc<GroupRecord>,
        conclusions: &mut Vec<Conclusion>,
    ) -> ClientResult {
        let counts = self.current();
        if counts.is_empty() {
            return Ok(());
        }
        let add = match self.mode {
            ConclusionMode::None => false,
            ConclusionMode::SetWhenEmpty => conclusions.is_empty(),
            ConclusionMode::AlwaysAppend => true,
        };
        if add {
            conclusions.push(Conclusion::new(self.tag.clone(), counts.to_string()));
        }
        Ok(())
    }

    fn on_group_closed(&self, _group: &Arc<GroupRecord>, _conclusions: &[Conclusion]) -> ClientResult {
        let mut stack = self.lock();
        // Registered mid-group: the root is never popped.
        if stack.len() > 1
            && let Some(closed) = stack.pop()
            && let Some(parent) = stack.last_mut()
        {
            parent.absorb(closed);
        }
        Ok(())
    }
}
