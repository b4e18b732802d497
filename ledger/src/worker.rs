//! Proposal-funded workers.

use estuary_types::{AccountId, Shares, Timestamp, VestingBalanceId, VoteId, WorkerId};
use serde::{Deserialize, Serialize};

/// What a worker does with its pay. Each kind performs its own side effect
/// at dispatch time but honors the same "amount paid" contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPayout {
    /// Pay returns straight to the reserve.
    Refund,
    /// Pay is destroyed.
    Burn,
    /// Pay accrues into a vesting balance owned by the worker account.
    Vesting { balance: VestingBalanceId },
}

/// A worker proposal with a daily pay drawn from the worker budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub worker_account: AccountId,
    pub work_begin_date: Timestamp,
    pub work_end_date: Timestamp,
    pub daily_pay: Shares,
    pub name: String,

    /// The "for" vote id stakeholder vote sets refer to.
    pub vote_for: VoteId,

    /// Approving stake tallied at the last maintenance pass.
    pub total_votes_for: Shares,

    pub payout: WorkerPayout,
}

impl Worker {
    /// Active while head time is inside `[work_begin_date, work_end_date)`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.work_begin_date <= now && now < self.work_end_date
    }
}
