//! Hardfork schedule — named, chronologically ordered activation predicates.
//!
//! Every behavior change in the maintenance engine is gated by a named
//! hardfork rather than an inline timestamp comparison. Both the old and the
//! new rule stay in the code as separate functions; call sites select one
//! through [`HardforkSchedule::activated`], which keeps each historical rule
//! testable in isolation.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Named protocol upgrades, in mainnet activation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hardfork {
    /// Dividend-bearing assets begin distributing.
    Dividend,
    /// GPOS vote-weight decay replaces liquid-balance voting.
    Gpos,
    /// Role-account authorities switch from stake-weighted keys to
    /// one-account-one-vote.
    WeightedAuthority,
    /// SON roles, SON budget and SON payouts activate.
    Son,
    /// SON pay weight shift computed per SON instead of from the total.
    Son2,
}

/// Activation times for every [`Hardfork`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HardforkSchedule {
    pub dividend: Timestamp,
    pub gpos: Timestamp,
    pub weighted_authority: Timestamp,
    pub son: Timestamp,
    pub son2: Timestamp,
}

impl HardforkSchedule {
    /// The canonical mainnet schedule.
    pub fn mainnet() -> Self {
        Self {
            dividend: Timestamp::new(1_546_300_800),
            gpos: Timestamp::new(1_579_104_000),
            weighted_authority: Timestamp::new(1_605_398_400),
            son: Timestamp::new(1_621_209_600),
            son2: Timestamp::new(1_646_956_800),
        }
    }

    /// Everything active from genesis. Test configurations only.
    pub fn all_active() -> Self {
        Self {
            dividend: Timestamp::EPOCH,
            gpos: Timestamp::EPOCH,
            weighted_authority: Timestamp::EPOCH,
            son: Timestamp::EPOCH,
            son2: Timestamp::EPOCH,
        }
    }

    /// Nothing ever activates. Test configurations only.
    pub fn none_active() -> Self {
        Self {
            dividend: Timestamp::NEVER,
            gpos: Timestamp::NEVER,
            weighted_authority: Timestamp::NEVER,
            son: Timestamp::NEVER,
            son2: Timestamp::NEVER,
        }
    }

    pub fn activation(&self, fork: Hardfork) -> Timestamp {
        match fork {
            Hardfork::Dividend => self.dividend,
            Hardfork::Gpos => self.gpos,
            Hardfork::WeightedAuthority => self.weighted_authority,
            Hardfork::Son => self.son,
            Hardfork::Son2 => self.son2,
        }
    }

    /// Whether `fork` is active at `head_time`.
    pub fn activated(&self, fork: Hardfork, head_time: Timestamp) -> bool {
        head_time >= self.activation(fork)
    }
}

impl Default for HardforkSchedule {
    fn default() -> Self {
        Self::mainnet()
    }
}
