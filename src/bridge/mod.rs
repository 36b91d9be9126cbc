//! Forwarding of one monitor's activity into another.
//!
//! Every monitor exposes a [`BridgeTarget`]. A [`BridgeRelay`] registered
//! as a bound client on a source monitor replays the source's lines, groups
//! and (optionally) topic and tags onto that target using the [`wire`] types.

mod relay;
mod target;
pub mod wire;

pub use relay::{BridgeRelay, PREMATURE_CLOSE_TEXT};
pub use target::BridgeTarget;
pub use wire::{WireConclusion, WireLine};

use serde::Deserialize;

/// Per-relay behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayOptions {
    /// Also drop lines the source never filtered when the target would reject them.
    /// Saves cross-boundary traffic at the cost of the "unfiltered is always
    /// delivered" guarantee.
    pub apply_target_filter: bool,
    /// Copy the target's topic and auto tags onto the source when attached.
    pub pull_topic_and_tags: bool,
    /// Mirror the source's topic and auto tag changes onto the target.
    pub push_topic_and_tags: bool,
}

impl RelayOptions {
    /// Sets [`Self::apply_target_filter`].
    #[must_use]
    pub const fn apply_target_filter(mut self, apply: bool) -> Self {
        self.apply_target_filter = apply;
        self
    }

    /// Sets [`Self::pull_topic_and_tags`].
    #[must_use]
    pub const fn pull_topic_and_tags(mut self, pull: bool) -> Self {
        self.pull_topic_and_tags = pull;
        self
    }

    /// Sets [`Self::push_topic_and_tags`].
    #[must_use]
    pub const fn push_topic_and_tags(mut self, push: bool) -> Self {
        self.push_topic_and_tags = push;
        self
    }
}
