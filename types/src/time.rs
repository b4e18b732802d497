//! Timestamp type used throughout the protocol.
//!
//! Timestamps are Unix epoch seconds (UTC). Maintenance scheduling is
//! wall-clock based, so all interval arithmetic happens in whole seconds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    /// The far future — used for "never activates" hardfork slots.
    pub const NEVER: Self = Self(u64::MAX);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    /// Zero if the clock regressed.
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn saturating_sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Advance by whole multiples of `interval_secs` until strictly after
    /// `now`. Shared by the maintenance clock and dividend payout scheduling:
    /// a slot that fell behind by several intervals skips straight past all
    /// missed slots.
    pub fn advance_past(&self, interval_secs: u64, now: Timestamp) -> Self {
        let interval = interval_secs.max(1);
        if self.0 > now.0 {
            return *self;
        }
        let behind = now.0 - self.0;
        let steps = behind / interval + 1;
        Self(self.0.saturating_add(steps.saturating_mul(interval)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
