//! Fundamental types for the Estuary protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: share amounts, timestamps, typed object identifiers, vote
//! identifiers, chain parameters, and the hardfork schedule.

pub mod amount;
pub mod hardfork;
pub mod ids;
pub mod params;
pub mod time;
pub mod vote;

pub use amount::{Shares, MAX_CORE_SUPPLY};
pub use hardfork::{Hardfork, HardforkSchedule};
pub use ids::{
    AccountId, AssetId, BudgetRecordId, CommitteeMemberId, PublicKey, SonId, SonWalletId,
    VestingBalanceId, WitnessId, WorkerId,
};
pub use params::{ChainParameters, CYCLE_RATE_BITS};
pub use time::Timestamp;
pub use vote::{ParseVoteIdError, VoteId, VoteKind};
