//! Block-producer candidates.

use estuary_types::{AccountId, PublicKey, Shares, VoteId, WitnessId};
use serde::{Deserialize, Serialize};

/// A witness candidacy. One per registered block producer; election each
/// maintenance interval decides which of these are in the active set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub id: WitnessId,
    pub witness_account: AccountId,
    pub signing_key: PublicKey,

    /// The vote id stakeholder vote sets refer to.
    pub vote_id: VoteId,

    /// Stake tallied for this candidate at the last maintenance pass.
    pub total_votes: Shares,

    pub total_missed: u64,
}

impl Witness {
    pub fn new(id: WitnessId, witness_account: AccountId, vote_id: VoteId) -> Self {
        Self {
            id,
            witness_account,
            signing_key: PublicKey::default(),
            vote_id,
            total_votes: Shares::ZERO,
            total_missed: 0,
        }
    }
}
