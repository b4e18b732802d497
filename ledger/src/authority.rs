//! Collective multi-signature authorities.

use estuary_types::{AccountId, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A weighted multi-signature authority. Satisfied when the weights of the
/// signing accounts/keys reach `weight_threshold`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: BTreeMap<AccountId, u16>,
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    /// An authority satisfiable by nobody. Role accounts start out like this
    /// until the first election populates them.
    pub fn null() -> Self {
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::new(),
        }
    }

    /// Sum of all member weights.
    pub fn total_weight(&self) -> u64 {
        let accounts: u64 = self.account_auths.values().map(|w| u64::from(*w)).sum();
        let keys: u64 = self.key_auths.values().map(|w| u64::from(*w)).sum();
        accounts + keys
    }
}
