//! Parameter-governance candidates.

use estuary_types::{AccountId, CommitteeMemberId, Shares, VoteId};
use serde::{Deserialize, Serialize};

/// A committee-member candidacy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub id: CommitteeMemberId,
    pub committee_member_account: AccountId,

    /// The vote id stakeholder vote sets refer to.
    pub vote_id: VoteId,

    /// Stake tallied for this candidate at the last maintenance pass.
    pub total_votes: Shares,
}

impl CommitteeMember {
    pub fn new(id: CommitteeMemberId, committee_member_account: AccountId, vote_id: VoteId) -> Self {
        Self {
            id,
            committee_member_account,
            vote_id,
            total_votes: Shares::ZERO,
        }
    }
}
