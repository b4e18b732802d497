//! Typed object identifiers.
//!
//! Every ledger object is addressed by a plain `u64` instance number wrapped
//! in a per-type newtype, so an `AccountId` can never be confused with a
//! `WitnessId` at a call site. Ordering follows the instance number, which
//! is also the creation order — election tie-breaks rely on this.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const fn new(instance: u64) -> Self {
                Self(instance)
            }

            pub const fn instance(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

object_id!(
    /// An account on the ledger.
    AccountId
);
object_id!(
    /// An asset (the core asset is instance 0).
    AssetId
);
object_id!(
    /// A block-producer candidate.
    WitnessId
);
object_id!(
    /// A parameter-governance candidate.
    CommitteeMemberId
);
object_id!(
    /// A sidechain-operator-node candidate.
    SonId
);
object_id!(
    /// A proposal-funded worker.
    WorkerId
);
object_id!(
    /// A vesting balance.
    VestingBalanceId
);
object_id!(
    /// One immutable budget snapshot.
    BudgetRecordId
);
object_id!(
    /// A SON multisig wallet-recreation record.
    SonWalletId
);

impl AssetId {
    /// The core asset of the chain.
    pub const CORE: Self = Self(0);
}

/// An opaque signing key token used in authority maps.
///
/// Real key handling (parsing, signature verification) lives outside this
/// workspace; here keys only need to be ordered, hashable and serializable.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub String);

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
