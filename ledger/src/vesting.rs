//! Vesting balances.

use estuary_types::{AccountId, Shares, Timestamp, VestingBalanceId};
use serde::{Deserialize, Serialize};

use crate::asset::AssetAmount;

/// What a vesting balance is for. The maintenance engine reads GPOS-kind
/// balances for vote weight; SON-kind balances gate SON registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingKind {
    #[default]
    Normal,
    Son,
    Gpos,
}

/// Release policy for a vesting balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingPolicy {
    /// Linear release after a cliff.
    Linear {
        begin_timestamp: Timestamp,
        vesting_cliff_secs: u64,
        vesting_duration_secs: u64,
        begin_balance: Shares,
    },
    /// Never releases on its own; withdrawal requires an explicit operation
    /// outside this engine.
    Dormant,
}

/// A balance subject to a release policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalance {
    pub id: VestingBalanceId,
    pub owner: AccountId,
    pub balance: AssetAmount,
    pub policy: VestingPolicy,
    pub kind: VestingKind,
}

impl VestingBalance {
    pub fn new(id: VestingBalanceId, owner: AccountId, balance: AssetAmount, kind: VestingKind) -> Self {
        Self {
            id,
            owner,
            balance,
            policy: VestingPolicy::Dormant,
            kind,
        }
    }
}
