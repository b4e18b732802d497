//! Accounts and their voting state.

use crate::authority::Authority;
use estuary_types::{AccountId, Shares, Timestamp, VestingBalanceId, VoteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Continuously maintained per-account counters the maintenance engine
/// consumes. Mutated by transaction evaluators between passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatistics {
    /// Core shares locked in open orders. Counts toward legacy voting stake.
    pub core_in_orders: Shares,

    /// When this account (or its proxy target, at tally time) last changed
    /// its vote set. Feeds GPOS vote-weight decay.
    pub last_vote_time: Timestamp,
}

/// An account on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,

    /// Voting proxy. `None` votes with its own opinion; `Some` delegates the
    /// whole vote set and desired counts to the target account.
    pub voting_account: Option<AccountId>,

    /// Every vote id this account approves of.
    pub votes: BTreeSet<VoteId>,

    /// Desired sizes of the elected sets, as voted by this account.
    pub num_witness: u16,
    pub num_committee: u16,
    pub num_son: u16,

    /// Fee-cashback vesting balance, if one has been created.
    pub cashback_vesting: Option<VestingBalanceId>,

    pub active: Authority,
    pub statistics: AccountStatistics,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            voting_account: None,
            votes: BTreeSet::new(),
            num_witness: 0,
            num_committee: 0,
            num_son: 0,
            cashback_vesting: None,
            active: Authority::null(),
            statistics: AccountStatistics::default(),
        }
    }
}
