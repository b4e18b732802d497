use estuary_types::{AccountId, AssetId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{kind} {instance} not found")]
    ObjectNotFound { kind: &'static str, instance: u64 },

    #[error("account {account} balance in asset {asset} would go negative: {have} < {need}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        have: i64,
        need: i64,
    },

    #[error("asset {0} has no fee pool entry for this conversion")]
    InsufficientFeePool(AssetId),

    #[error("account {account} is not authorized to hold asset {asset}")]
    UnauthorizedAsset { account: AccountId, asset: AssetId },

    #[error("price with zero {0} amount")]
    ZeroPrice(&'static str),

    #[error("amount in asset {0} matches neither side of the price")]
    PriceAssetMismatch(AssetId),

    #[error("share amount overflow")]
    Overflow,
}

impl LedgerError {
    pub fn not_found(kind: &'static str, instance: u64) -> Self {
        Self::ObjectNotFound { kind, instance }
    }
}
