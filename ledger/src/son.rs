//! Sidechain-operator nodes (SONs) and their bookkeeping.

use estuary_types::{AccountId, PublicKey, Shares, SonId, SonWalletId, Timestamp, VestingBalanceId, VoteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sidechains a SON can operate on. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sidechain {
    Bitcoin,
    Ethereum,
    Hive,
}

impl Sidechain {
    pub const ALL: [Sidechain; 3] = [Sidechain::Bitcoin, Sidechain::Ethereum, Sidechain::Hive];
}

/// Lifecycle status of a SON.
///
/// `InMaintenance` is an operator-requested pause; election churn never
/// overwrites it, so a SON that leaves and re-enters the active set keeps
/// its maintenance window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SonStatus {
    #[default]
    Inactive,
    Active,
    InMaintenance,
    Deregistered,
}

/// A SON candidacy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Son {
    pub id: SonId,
    pub son_account: AccountId,
    pub signing_key: PublicKey,

    /// Registration deposit; a SON-kind vesting balance.
    pub deposit: VestingBalanceId,

    /// Per-sidechain addresses this SON signs with. Election requires an
    /// entry for every sidechain.
    pub sidechain_public_keys: BTreeMap<Sidechain, String>,

    /// The vote id stakeholder vote sets refer to.
    pub vote_id: VoteId,

    /// Stake tallied for this candidate at the last maintenance pass.
    pub total_votes: Shares,

    pub status: SonStatus,
}

impl Son {
    pub fn new(id: SonId, son_account: AccountId, deposit: VestingBalanceId, vote_id: VoteId) -> Self {
        Self {
            id,
            son_account,
            signing_key: PublicKey::default(),
            deposit,
            sidechain_public_keys: BTreeMap::new(),
            vote_id,
            total_votes: Shares::ZERO,
            status: SonStatus::Inactive,
        }
    }

    /// Eligible for election: keys configured for every sidechain and not
    /// deregistered.
    pub fn electable(&self) -> bool {
        self.status != SonStatus::Deregistered
            && Sidechain::ALL
                .iter()
                .all(|chain| self.sidechain_public_keys.contains_key(chain))
    }
}

/// Per-SON counters, mutated continuously between maintenance passes by
/// heartbeat and sidechain-operation evaluators, consumed and reset by the
/// SON payment engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonStatistics {
    pub owner: SonId,

    /// Transactions signed per sidechain since the last payout round.
    pub txs_signed: BTreeMap<Sidechain, u64>,

    pub total_downtime_secs: u64,
    pub current_interval_downtime_secs: u64,
    pub last_active: Timestamp,
}

impl SonStatistics {
    pub fn new(owner: SonId) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    /// Total signed transactions across all sidechains.
    pub fn total_txs_signed(&self) -> u64 {
        self.txs_signed.values().sum()
    }

    pub fn reset_txs_signed(&mut self) {
        self.txs_signed.clear();
    }
}

/// One generation of the SON multisig wallet. A new record is created when
/// the elected SON set changes; the previous record is expired, never
/// deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonWallet {
    pub id: SonWalletId,
    pub valid_from: Timestamp,

    /// `None` while this is the open (current) wallet generation.
    pub expires: Option<Timestamp>,

    pub sons: Vec<SonId>,
}
