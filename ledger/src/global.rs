//! The two global-properties singletons and the chain's special accounts.

use estuary_types::{
    AccountId, ChainParameters, CommitteeMemberId, Shares, SonId, Timestamp, WitnessId,
};
use serde::{Deserialize, Serialize};

/// Role account whose active authority mirrors the elected witness set.
pub const WITNESS_ACCOUNT: AccountId = AccountId::new(1);
/// Role account whose active authority mirrors the elected committee.
pub const COMMITTEE_ACCOUNT: AccountId = AccountId::new(0);
/// Role account whose active authority mirrors the elected SON set.
pub const SON_ACCOUNT: AccountId = AccountId::new(2);
/// Sink for the network's share of fee splits.
pub const NETWORK_ACCOUNT: AccountId = AccountId::new(3);

/// Committee-settable parameters plus the current elected sets. Mutated only
/// at maintenance-interval boundaries (or by committee proposal outside this
/// engine).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalProperties {
    pub parameters: ChainParameters,
    pub active_witnesses: Vec<WitnessId>,
    pub active_committee_members: Vec<CommitteeMemberId>,
    pub active_sons: Vec<SonId>,
}

impl GlobalProperties {
    pub fn new(parameters: ChainParameters) -> Self {
        Self {
            parameters,
            active_witnesses: Vec::new(),
            active_committee_members: Vec::new(),
            active_sons: Vec::new(),
        }
    }
}

impl Default for GlobalProperties {
    fn default() -> Self {
        Self::new(ChainParameters::default())
    }
}

/// Mutable chain-head metadata. Exactly one instance; rewritten every pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_time: Timestamp,

    /// Maintenance runs when a block's timestamp crosses this.
    pub next_maintenance_time: Timestamp,

    /// When the budget was last computed; epoch before the first budget.
    pub last_budget_time: Timestamp,

    /// Witness pay available for the coming interval.
    pub witness_budget: Shares,

    /// SON pay pool; replaced each pass, drained at payout rounds.
    pub son_budget: Shares,

    pub last_son_payout_time: Timestamp,

    pub accounts_registered_this_interval: u32,

    /// Scheduler seed, refreshed after each election.
    pub random_seed: u64,
}
