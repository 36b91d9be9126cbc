//! Records exchanged between emitters, the monitor and its clients.
//!
//! `LineData`/`GroupData` are what callers hand to the monitor; `LogLine`
//! and `GroupRecord` are what clients receive once the monitor has stamped,
//! tagged and accepted them.

mod exception;
mod time;

pub use exception::ExceptionData;
pub use time::LogTime;

use crate::level::{Level, LogLevel};
use crate::tags::TagSet;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Callback computing a group's conclusion text when it closes.
pub type AutoConclusion = Box<dyn FnOnce() -> String + Send>;

/// Caller-side description of one log line.
#[derive(Debug, Clone)]
pub struct LineData {
    pub level: LogLevel,
    pub text: String,
    pub tags: TagSet,
    pub exception: Option<ExceptionData>,
    /// Requested instant; the monitor makes it unique and monotonic.
    pub time: Option<DateTime<Utc>>,
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl LineData {
    /// Unfiltered line located at the caller.
    #[must_use]
    #[track_caller]
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            level: LogLevel::unfiltered(level),
            text: text.into(),
            tags: TagSet::default(),
            exception: None,
            time: None,
            file: Cow::Borrowed(location.file()),
            line: location.line(),
        }
    }

    #[must_use]
    pub fn tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn exception(mut self, exception: ExceptionData) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub const fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Marks the line as already checked against the monitor filter.
    #[must_use]
    pub const fn filtered(mut self) -> Self {
        self.level.filtered = true;
        self
    }

    #[must_use]
    pub fn location(mut self, file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }
}

/// Caller-side description of a group to open.
pub struct GroupData {
    pub data: LineData,
    pub auto_conclusion: Option<AutoConclusion>,
}

impl GroupData {
    #[must_use]
    #[track_caller]
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            data: LineData::new(level, text),
            auto_conclusion: None,
        }
    }

    #[must_use]
    pub fn tags(mut self, tags: TagSet) -> Self {
        self.data.tags = tags;
        self
    }

    #[must_use]
    pub fn exception(mut self, exception: ExceptionData) -> Self {
        self.data.exception = Some(exception);
        self
    }

    /// Marks the group as already checked against the monitor filter.
    #[must_use]
    pub const fn filtered(mut self) -> Self {
        self.data.level.filtered = true;
        self
    }

    /// Conclusion text used when the group is closed without an explicit one.
    #[must_use]
    pub fn conclude_with(mut self, f: impl FnOnce() -> String + Send + 'static) -> Self {
        self.auto_conclusion = Some(Box::new(f));
        self
    }
}

impl From<LineData> for GroupData {
    fn from(data: LineData) -> Self {
        Self {
            data,
            auto_conclusion: None,
        }
    }
}

impl fmt::Debug for GroupData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupData")
            .field("data", &self.data)
            .field("auto_conclusion", &self.auto_conclusion.is_some())
            .finish()
    }
}

/// Accepted line as delivered to clients.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
    /// Line tags combined with the monitor's auto tags.
    pub tags: TagSet,
    pub exception: Option<ExceptionData>,
    pub time: LogTime,
    pub file: Cow<'static, str>,
    pub line: u32,
}

/// Accepted group as delivered to clients.
pub struct GroupRecord {
    /// Slot position in the monitor's group stack.
    pub index: usize,
    /// 1-based depth counting only accepted groups.
    pub depth: usize,
    pub level: LogLevel,
    pub text: String,
    pub tags: TagSet,
    pub exception: Option<ExceptionData>,
    pub open_time: LogTime,
    pub file: Cow<'static, str>,
    pub line: u32,
    /// Nearest accepted ancestor.
    pub parent: Option<Arc<GroupRecord>>,
    close_time: OnceLock<LogTime>,
    auto_conclusion: Mutex<Option<AutoConclusion>>,
}

impl GroupRecord {
    pub(crate) fn new(
        index: usize,
        depth: usize,
        data: GroupData,
        open_time: LogTime,
        tags: TagSet,
        parent: Option<Arc<Self>>,
    ) -> Self {
        let GroupData {
            data,
            auto_conclusion,
        } = data;
        Self {
            index,
            depth,
            level: data.level,
            text: data.text,
            tags,
            exception: data.exception,
            open_time,
            file: data.file,
            line: data.line,
            parent,
            close_time: OnceLock::new(),
            auto_conclusion: Mutex::new(auto_conclusion),
        }
    }

    /// Set once the group has started closing.
    #[must_use]
    pub fn close_time(&self) -> Option<LogTime> {
        self.close_time.get().copied()
    }

    pub(crate) fn mark_closed(&self, time: LogTime) {
        let _ = self.close_time.set(time);
    }

    /// Replaces the deferred conclusion callback; clients may install one in `on_open_group`.
    pub fn set_auto_conclusion(&self, f: impl FnOnce() -> String + Send + 'static) {
        *self
            .auto_conclusion
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(f));
    }

    #[must_use]
    pub fn has_auto_conclusion(&self) -> bool {
        self.auto_conclusion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn take_auto_conclusion(&self) -> Option<AutoConclusion> {
        self.auto_conclusion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Texts of this group and its accepted ancestors, outermost first.
    #[must_use]
    pub fn path(&self) -> Vec<String> {
        let mut path: Vec<String> =
            std::iter::successors(Some(self), |g| g.parent.as_deref())
                .map(|g| g.text.clone())
                .collect();
        path.reverse();
        path
    }
}

impl fmt::Debug for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRecord")
            .field("index", &self.index)
            .field("depth", &self.depth)
            .field("level", &self.level)
            .field("text", &self.text)
            .field("tags", &self.tags)
            .field("open_time", &self.open_time)
            .field("close_time", &self.close_time())
            .finish_non_exhaustive()
    }
}

/// One tagged conclusion of a closing group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    pub tag: TagSet,
    pub text: String,
}

impl Conclusion {
    #[must_use]
    pub fn new(tag: TagSet, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

/// Conclusion supplied by the caller when closing a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupConclusion {
    /// Free text, tagged `UserConclusion` by the monitor.
    Text(String),
    Tagged(Vec<Conclusion>),
}

impl GroupConclusion {
    /// Ad-hoc objects conclude with their string form.
    pub fn display(value: &impl fmt::Display) -> Self {
        Self::Text(value.to_string())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Tagged(list) => list.is_empty(),
        }
    }
}

impl From<&str> for GroupConclusion {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for GroupConclusion {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Conclusion>> for GroupConclusion {
    fn from(list: Vec<Conclusion>) -> Self {
        Self::Tagged(list)
    }
}

impl From<Conclusion> for GroupConclusion {
    fn from(conclusion: Conclusion) -> Self {
        Self::Tagged(vec![conclusion])
    }
}
