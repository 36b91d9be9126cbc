//! Remembers where in the group hierarchy the last interesting entries happened.

use super::{Client, ClientResult};
use crate::level::Level;
use crate::record::{Conclusion, GroupRecord, LogLine};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An entry together with the texts of the groups it was emitted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub level: Level,
    pub text: String,
    /// Enclosing group texts, outermost first.
    pub path: Vec<String>,
}

#[derive(Debug, Default)]
struct PathState {
    groups: Vec<Arc<GroupRecord>>,
    last_line: Option<PathEntry>,
    last_error: Option<PathEntry>,
    last_warn_or_error: Option<PathEntry>,
}

impl PathState {
    fn path(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.text.clone()).collect()
    }

    fn record(&mut self, level: Level, text: &str) {
        let entry = PathEntry {
            level,
            text: text.to_string(),
            path: self.path(),
        };
        if level >= Level::Warn {
            self.last_warn_or_error = Some(entry.clone());
        }
        if level.is_error_or_fatal() {
            self.last_error = Some(entry);
        }
    }
}

/// Tracks the open group path, the last line and the path at the last
/// error and last warning.
#[derive(Debug, Default)]
pub struct PathCatcher {
    state: Mutex<PathState>,
}

impl PathCatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of the currently open groups, outermost first.
    #[must_use]
    pub fn current_path(&self) -> Vec<String> {
        self.lock().path()
    }

    #[must_use]
    pub fn last_line(&self) -> Option<PathEntry> {
        self.lock().last_line.clone()
    }

    /// Last error or fatal line or group.
    #[must_use]
    pub fn last_error(&self) -> Option<PathEntry> {
        self.lock().last_error.clone()
    }

    #[must_use]
    pub fn last_warn_or_error(&self) -> Option<PathEntry> {
        self.lock().last_warn_or_error.clone()
    }

    /// Forgets the last entries; the open path is kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.last_line = None;
        state.last_error = None;
        state.last_warn_or_error = None;
    }

    fn lock(&self) -> MutexGuard<'_, PathState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Client for PathCatcher {
    fn name(&self) -> &'static str {
        "PathCatcher"
    }

    fn on_unfiltered_log(&self, line: &LogLine) -> ClientResult {
        let mut state = self.lock();
        state.last_line = Some(PathEntry {
            level: line.level.level,
            text: line.text.clone(),
            path: state.path(),
        });
        state.record(line.level.level, &line.text);
        Ok(())
    }

    fn on_open_group(&self, group: &Arc<GroupRecord>) -> ClientResult {
        let mut state = self.lock();
        state.record(group.level.level, &group.text);
        state.groups.push(group.clone());
        Ok(())
    }

    fn on_group_closed(&self, group: &Arc<GroupRecord>, _conclusions: &[Conclusion]) -> ClientResult {
        let mut state = self.lock();
        if let Some(position) = state.groups.iter().rposition(|g| Arc::ptr_eq(g, group)) {
            state.groups.truncate(position);
        }
        Ok(())
    }
}
