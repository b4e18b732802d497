//! Virtual operations — synthetic, non-submitted operations the maintenance
//! engine appends to the block's operation history so transaction-history
//! queries can show what the pass did.

use crate::asset::AssetAmount;
use estuary_types::{AccountId, AssetId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualOperation {
    /// One fee-bucket accumulator's share landing on an account.
    FbaDistribute {
        account: AccountId,
        fba_id: u8,
        amount: AssetAmount,
    },

    /// One holder's dividend payout across every payout asset, flushed in a
    /// single grouped operation.
    AssetDividendDistribution {
        dividend_asset: AssetId,
        account: AccountId,
        amounts: Vec<AssetAmount>,
    },
}
