//! Narrow, serializable records crossing a bridge.
//!
//! Tags travel as their `|`-separated text so the receiving side can intern
//! them in its own tag context.

use crate::level::{Level, LogLevel};
use crate::record::{Conclusion, ExceptionData, GroupData, GroupRecord, LineData, LogLine, LogTime};
use crate::tags::TagContext;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A line or group header as seen by a bridge target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLine {
    pub tags: String,
    pub level: Level,
    pub filtered: bool,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionData>,
    pub time: LogTime,
    pub file: String,
    pub line: u32,
}

impl WireLine {
    #[must_use]
    pub fn from_line(line: &LogLine) -> Self {
        Self {
            tags: line.tags.to_string(),
            level: line.level.level,
            filtered: line.level.filtered,
            text: line.text.clone(),
            exception: line.exception.clone(),
            time: line.time,
            file: line.file.to_string(),
            line: line.line,
        }
    }

    #[must_use]
    pub fn from_group(group: &GroupRecord) -> Self {
        Self {
            tags: group.tags.to_string(),
            level: group.level.level,
            filtered: group.level.filtered,
            text: group.text.clone(),
            exception: group.exception.clone(),
            time: group.open_time,
            file: group.file.to_string(),
            line: group.line,
        }
    }

    /// Rebuilds caller-side data, interning the tags in `tags`.
    #[must_use]
    pub fn into_line_data(self, tags: &TagContext) -> LineData {
        LineData {
            level: LogLevel {
                level: self.level,
                filtered: self.filtered,
            },
            tags: tags.find_or_create(&self.tags),
            text: self.text,
            exception: self.exception,
            time: Some(self.time.time),
            file: Cow::Owned(self.file),
            line: self.line,
        }
    }

    #[must_use]
    pub fn into_group_data(self, tags: &TagContext) -> GroupData {
        GroupData::from(self.into_line_data(tags))
    }

    /// # Errors
    /// [`crate::Error::Wire`] if serialization fails.
    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// [`crate::Error::Wire`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One tagged conclusion crossing a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConclusion {
    pub tag: String,
    pub text: String,
}

impl WireConclusion {
    #[must_use]
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn into_conclusion(self, tags: &TagContext) -> Conclusion {
        Conclusion::new(tags.find_or_create(&self.tag), self.text)
    }
}

impl From<&Conclusion> for WireConclusion {
    fn from(conclusion: &Conclusion) -> Self {
        Self::new(conclusion.tag.to_string(), conclusion.text.clone())
    }
}
