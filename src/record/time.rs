//! Log timestamps that stay strictly increasing within one monitor.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// UTC instant plus a uniquifier that breaks ties between records emitted
/// within the clock resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LogTime {
    pub time: DateTime<Utc>,
    pub uniquifier: u8,
}

impl LogTime {
    /// Stamp older than anything a monitor can produce.
    pub const UNKNOWN: Self = Self {
        time: DateTime::<Utc>::MIN_UTC,
        uniquifier: 0,
    };

    #[must_use]
    pub fn now() -> Self {
        Self {
            time: Utc::now(),
            uniquifier: 0,
        }
    }

    /// Smallest stamp strictly greater than `last`, as close as possible to `candidate`.
    /// Once both the clock and the uniquifier are exhausted, `last` is repeated.
    #[must_use]
    pub fn after(last: Self, candidate: DateTime<Utc>) -> Self {
        if candidate > last.time {
            return Self {
                time: candidate,
                uniquifier: 0,
            };
        }
        if last.uniquifier < u8::MAX {
            return Self {
                time: last.time,
                uniquifier: last.uniquifier + 1,
            };
        }
        // At the end of the representable range the uniquifier stays saturated.
        last.time
            .checked_add_signed(TimeDelta::microseconds(1))
            .map_or(last, |time| Self {
                time,
                uniquifier: 0,
            })
    }
}

impl fmt::Display for LogTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%Y-%m-%d %H:%M:%S%.6f"))?;
        if self.uniquifier > 0 {
            write!(f, "({})", self.uniquifier)?;
        }
        Ok(())
    }
}
