//! Two-axis filters: one threshold for groups, one for lines.

use crate::level::{Level, LevelFilter};
use std::fmt;
use std::str::FromStr;

/// Immutable `(group, line)` threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterSet {
    pub group: LevelFilter,
    pub line: LevelFilter,
}

impl FilterSet {
    /// No opinion on either axis.
    pub const UNDEFINED: Self = Self::new(LevelFilter::Undefined, LevelFilter::Undefined);
    /// Most verbose setting: everything is captured.
    pub const VERBOSE: Self = Self::new(LevelFilter::Trace, LevelFilter::Trace);
    /// Every group, but only warnings and above for lines.
    pub const MONITOR: Self = Self::new(LevelFilter::Trace, LevelFilter::Warn);
    pub const TERSE: Self = Self::new(LevelFilter::Info, LevelFilter::Error);
    pub const RELEASE: Self = Self::new(LevelFilter::Error, LevelFilter::Error);
    /// Suppresses everything and wins every combination.
    pub const OFF: Self = Self::new(LevelFilter::Off, LevelFilter::Off);
    /// Cache sentinel, distinct from [`Self::UNDEFINED`].
    pub const INVALID: Self = Self::new(LevelFilter::Invalid, LevelFilter::Invalid);

    #[must_use]
    pub const fn new(group: LevelFilter, line: LevelFilter) -> Self {
        Self { group, line }
    }

    /// Same threshold on both axes.
    #[must_use]
    pub const fn uniform(filter: LevelFilter) -> Self {
        Self::new(filter, filter)
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self.group, LevelFilter::Invalid) && !matches!(self.line, LevelFilter::Invalid)
    }

    #[must_use]
    pub const fn is_undefined(self) -> bool {
        matches!(self.group, LevelFilter::Undefined) && matches!(self.line, LevelFilter::Undefined)
    }

    /// Combines two filters axis by axis.
    ///
    /// An `Undefined` axis defers to the other side, `Off` always wins,
    /// otherwise the more verbose threshold is kept.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self::new(
            combine_axis(self.group, other.group),
            combine_axis(self.line, other.line),
        )
    }

    /// Like [`Self::combine`] but only `None` means "no opinion": an
    /// `Undefined` axis takes part in the comparison as the lowest threshold.
    ///
    /// Used when a derived context inherits its parent's default filter.
    #[must_use]
    pub fn combine_none_only(self, other: Self) -> Self {
        Self::new(
            combine_axis_none_only(self.group, other.group),
            combine_axis_none_only(self.line, other.line),
        )
    }

    /// Whether `self`, as one input of the `aggregate` combination, may have
    /// determined its value. A client whose old filter cannot have contributed
    /// and whose new filter changes nothing spares the monitor a full resync.
    #[must_use]
    pub fn may_contribute_to(self, aggregate: Self) -> bool {
        axis_contributes(self.group, aggregate.group) || axis_contributes(self.line, aggregate.line)
    }

    /// Group axis check. `Undefined` is resolved against `fallback`.
    #[must_use]
    pub fn accepts_group(self, level: Level, fallback: Self) -> bool {
        resolve(self.group, fallback.group).accepts(level)
    }

    /// Line axis check. `Undefined` is resolved against `fallback`.
    #[must_use]
    pub fn accepts_line(self, level: Level, fallback: Self) -> bool {
        resolve(self.line, fallback.line).accepts(level)
    }

    /// Packs both axes into one word so filters can live in atomics.
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        ((self.group.to_bits() as u16) << 8) | self.line.to_bits() as u16
    }

    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self::new(
            LevelFilter::from_bits((bits >> 8) as u8),
            LevelFilter::from_bits((bits & 0xff) as u8),
        )
    }
}

fn combine_axis(a: LevelFilter, b: LevelFilter) -> LevelFilter {
    debug_assert!(a != LevelFilter::Invalid && b != LevelFilter::Invalid);
    match (a, b) {
        (LevelFilter::Undefined, other) | (other, LevelFilter::Undefined) => other,
        (LevelFilter::Off, _) | (_, LevelFilter::Off) => LevelFilter::Off,
        (a, b) => a.min(b),
    }
}

fn axis_contributes(value: LevelFilter, aggregate: LevelFilter) -> bool {
    value != LevelFilter::Undefined
        && (value == aggregate || combine_axis(aggregate, value) != aggregate)
}

fn combine_axis_none_only(a: LevelFilter, b: LevelFilter) -> LevelFilter {
    match (a, b) {
        (LevelFilter::None, other) | (other, LevelFilter::None) => other,
        (LevelFilter::Off, _) | (_, LevelFilter::Off) => LevelFilter::Off,
        (a, b) => a.min(b),
    }
}

const fn resolve(filter: LevelFilter, fallback: LevelFilter) -> LevelFilter {
    match filter {
        LevelFilter::Undefined => fallback,
        other => other,
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::UNDEFINED => "undefined",
            Self::VERBOSE => "verbose",
            Self::MONITOR => "monitor",
            Self::TERSE => "terse",
            Self::RELEASE => "release",
            Self::OFF => "off",
            Self::INVALID => "invalid",
            _ => return write!(f, "{{{},{}}}", self.group, self.line),
        };
        f.write_str(name)
    }
}

impl FromStr for FilterSet {
    type Err = crate::Error;

    /// Accepts preset names, a single level applied to both axes, or `{group,line}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let preset = match text.to_lowercase().as_str() {
            "undefined" => Some(Self::UNDEFINED),
            "verbose" | "debug" => Some(Self::VERBOSE),
            "monitor" => Some(Self::MONITOR),
            "terse" => Some(Self::TERSE),
            "release" => Some(Self::RELEASE),
            "off" => Some(Self::OFF),
            _ => None,
        };
        if let Some(filter) = preset {
            return Ok(filter);
        }

        if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            let (group, line) = inner
                .split_once(',')
                .ok_or_else(|| crate::Error::InvalidFilter(s.to_string()))?;
            let group = group
                .parse::<LevelFilter>()
                .map_err(|_| crate::Error::InvalidFilter(s.to_string()))?;
            let line = line
                .parse::<LevelFilter>()
                .map_err(|_| crate::Error::InvalidFilter(s.to_string()))?;
            return Ok(Self::new(group, line));
        }

        text.parse::<LevelFilter>()
            .map(Self::uniform)
            .map_err(|_| crate::Error::InvalidFilter(s.to_string()))
    }
}
