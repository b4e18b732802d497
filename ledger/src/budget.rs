//! Immutable per-interval budget snapshots.

use estuary_types::{BudgetRecordId, Shares, Timestamp};
use serde::{Deserialize, Serialize};

/// Every input and output of one interval's budget computation. Appended to
/// an append-only log at each maintenance pass; never modified afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub id: BudgetRecordId,
    pub time: Timestamp,

    pub time_since_last_budget_secs: u64,

    /// Reserve available at the start of the interval (including the two
    /// re-folded inputs below).
    pub from_initial_reserve: Shares,

    /// Fees accumulated since the previous pass, folded into the reserve.
    pub from_accumulated_fees: Shares,

    /// Witness budget left unspent in the previous interval.
    pub from_unused_witness_budget: Shares,

    /// Witness pay the interval asked for before the reserve cap.
    pub requested_witness_budget: Shares,

    /// Total issuable this interval after the emission formula.
    pub total_budget: Shares,

    pub witness_budget: Shares,
    pub worker_budget: Shares,
    pub son_budget: Shares,

    /// Worker budget that found no worker to pay; evaporates.
    pub leftover_worker_funds: Shares,

    /// SON budget left when the payout round closed.
    pub leftover_son_funds: Shares,

    /// Net mint (positive) or burn (negative) applied to the core supply.
    pub supply_delta: Shares,
}

impl BudgetRecord {
    /// The conservation identity every record must satisfy.
    pub fn supply_delta_identity(&self) -> Shares {
        self.witness_budget
            .saturating_add(self.worker_budget)
            .saturating_add(self.son_budget)
            .saturating_sub(self.leftover_worker_funds)
            .saturating_sub(self.from_accumulated_fees)
            .saturating_sub(self.from_unused_witness_budget)
            .saturating_sub(self.leftover_son_funds)
    }
}
