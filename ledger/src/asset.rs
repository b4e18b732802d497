//! Assets, dividend configuration, and fee-bucket accumulators.

use crate::error::LedgerError;
use estuary_types::{AccountId, AssetId, Shares, Timestamp};
use estuary_utils::mul_div_floor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An amount of a specific asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub amount: Shares,
    pub asset: AssetId,
}

impl AssetAmount {
    pub fn new(amount: Shares, asset: AssetId) -> Self {
        Self { amount, asset }
    }

    pub fn core(amount: Shares) -> Self {
        Self {
            amount,
            asset: AssetId::CORE,
        }
    }
}

/// An exchange rate between two assets, expressed as the ratio
/// `base.amount : quote.amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: AssetAmount,
    pub quote: AssetAmount,
}

impl Price {
    /// The identity price of an asset against itself.
    pub fn unit(asset: AssetId) -> Self {
        Self {
            base: AssetAmount::new(Shares::new(1), asset),
            quote: AssetAmount::new(Shares::new(1), asset),
        }
    }

    /// Convert `amount` across this price, truncating. The amount's asset
    /// must be one side of the price.
    pub fn convert(&self, amount: AssetAmount) -> Result<AssetAmount, LedgerError> {
        let (from, to) = if amount.asset == self.base.asset {
            (&self.base, &self.quote)
        } else if amount.asset == self.quote.asset {
            (&self.quote, &self.base)
        } else {
            return Err(LedgerError::PriceAssetMismatch(amount.asset));
        };
        if from.amount.is_zero() {
            return Err(LedgerError::ZeroPrice("denominator"));
        }
        let converted = mul_div_floor(
            amount.amount.to_u128(),
            to.amount.to_u128(),
            from.amount.to_u128(),
        );
        let converted = Shares::try_from_u128(converted).ok_or(LedgerError::Overflow)?;
        Ok(AssetAmount::new(converted, to.asset))
    }
}

/// Issuer-settable asset options the maintenance engine reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptions {
    /// Rate at which the network converts this asset to/from core when
    /// charging fees from the fee pool.
    pub core_exchange_rate: Price,

    /// If nonempty, only these accounts may hold the asset.
    pub whitelist_authorities: BTreeSet<AccountId>,

    /// Accounts barred from holding the asset.
    pub blacklist_authorities: BTreeSet<AccountId>,

    /// Assets the buyback account is allowed to keep holding. Anything else
    /// it receives is sold off at each maintenance pass.
    pub buyback_markets: BTreeSet<AssetId>,
}

impl AssetOptions {
    pub fn new(asset: AssetId) -> Self {
        // Par against core by default; the core asset itself prices at
        // identity.
        let core_exchange_rate = if asset == AssetId::CORE {
            Price::unit(asset)
        } else {
            Price {
                base: AssetAmount::core(Shares::new(1)),
                quote: AssetAmount::new(Shares::new(1), asset),
            }
        };
        Self {
            core_exchange_rate,
            whitelist_authorities: BTreeSet::new(),
            blacklist_authorities: BTreeSet::new(),
            buyback_markets: BTreeSet::new(),
        }
    }

    /// Whether `account` may hold the asset these options belong to.
    pub fn is_authorized(&self, account: AccountId) -> bool {
        if self.blacklist_authorities.contains(&account) {
            return false;
        }
        self.whitelist_authorities.is_empty() || self.whitelist_authorities.contains(&account)
    }
}

/// Supply-side counters for one asset. Split from [`Asset`] because these
/// change with every fee and issuance while the asset definition is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDynamicData {
    pub current_supply: Shares,

    /// Fees collected in this asset since the last maintenance pass.
    pub accumulated_fees: Shares,

    /// Core shares set aside by the issuer to pay fees on behalf of holders.
    pub fee_pool: Shares,
}

/// Dividend parameters for a dividend-bearing asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendOptions {
    /// Seconds between payouts of scheduled (pending) credits.
    pub payout_interval_secs: Option<u64>,

    /// Floor on each distribution, in hundredths of a percent of the fee:
    /// a distribution is skipped unless
    /// `delta >= fee * 10_000 / minimum_fee_percentage`.
    pub minimum_fee_percentage: u64,

    /// Seconds between distribution computations. `None` distributes at
    /// every maintenance pass.
    pub minimum_distribution_interval_secs: Option<u64>,
}

/// Dividend bookkeeping for one dividend-bearing asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDividendData {
    /// The dividend-bearing asset this record belongs to.
    pub asset: AssetId,

    pub options: DividendOptions,

    /// Account whose balances fund distributions. Deposits to this account
    /// between passes become the next distribution delta.
    pub dividend_distribution_account: AccountId,

    /// When pending credits next flush to real balances.
    pub next_payout_time: Option<Timestamp>,

    /// When the next distribution computation may run.
    pub last_scheduled_distribution_time: Option<Timestamp>,

    pub last_distribution_time: Option<Timestamp>,
    pub last_payout_time: Option<Timestamp>,
}

/// An asset on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub symbol: String,
    pub issuer: AccountId,
    pub options: AssetOptions,
    pub dynamic: AssetDynamicData,

    /// Present only on dividend-bearing assets.
    pub dividend_data: Option<AssetDividendData>,

    /// Present only on buyback-configured assets.
    pub buyback_account: Option<AccountId>,
}

impl Asset {
    pub fn new(id: AssetId, symbol: impl Into<String>, issuer: AccountId) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            issuer,
            options: AssetOptions::new(id),
            dynamic: AssetDynamicData::default(),
            dividend_data: None,
            buyback_account: None,
        }
    }
}

/// A fee-bucket accumulator: a fixed-purpose balance collecting a subset of
/// transaction fees for proportional distribution at maintenance time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FbaAccumulator {
    /// Asset whose buyback account and issuer receive the split. `None`
    /// means unconfigured; the whole pool is burned instead.
    pub designated_asset: Option<AssetId>,

    pub accumulated_fee_pool: Shares,

    /// Split percentages; must sum to exactly 100.
    pub network_pct: u8,
    pub buyback_pct: u8,
    pub issuer_pct: u8,
}

impl FbaAccumulator {
    pub fn new(designated_asset: Option<AssetId>) -> Self {
        Self {
            designated_asset,
            accumulated_fee_pool: Shares::ZERO,
            network_pct: 20,
            buyback_pct: 60,
            issuer_pct: 20,
        }
    }

    pub fn split_is_valid(&self) -> bool {
        u32::from(self.network_pct) + u32::from(self.buyback_pct) + u32::from(self.issuer_pct)
            == 100
    }
}
