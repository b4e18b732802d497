//! Fee-bucket settlement and buyback liquidity probes.

use estuary_ledger::{AssetAmount, EventBus, LedgerStore, VirtualOperation};
use estuary_types::{AccountId, AssetId, Shares};
use estuary_utils::mul_div_floor;
use tracing::{debug, warn};

use crate::error::MaintenanceError;

/// Splits fee-bucket accumulators among network / buyback / issuer and
/// drives the buyback accounts' market probes.
pub struct FbaBuybackSettlement;

impl FbaBuybackSettlement {
    /// Settle every fee bucket with a nonzero pool.
    ///
    /// A bucket whose designated asset is unconfigured burns its whole pool
    /// — logged, not fatal. A split that does not sum to 100% is a
    /// consensus invariant violation.
    pub fn distribute_fba_balances(
        &self,
        store: &mut LedgerStore,
        bus: &mut EventBus,
    ) -> Result<(), MaintenanceError> {
        let buckets: Vec<(u8, estuary_ledger::FbaAccumulator)> = store
            .fba_accumulators()
            .map(|(id, fba)| (id, fba.clone()))
            .collect();

        for (fba_id, fba) in buckets {
            let pool = fba.accumulated_fee_pool;
            if !pool.is_positive() {
                continue;
            }
            if !fba.split_is_valid() {
                return Err(MaintenanceError::invariant(format!(
                    "fee bucket {fba_id} split does not sum to 100%"
                )));
            }

            let designated = fba
                .designated_asset
                .and_then(|id| store.get_asset(id).ok())
                .filter(|asset| asset.buyback_account.is_some())
                .cloned();
            let Some(asset) = designated else {
                warn!(fba_id, %pool, "fee bucket has no configured asset, burning pool");
                store.modify_asset(AssetId::CORE, |core| {
                    core.dynamic.current_supply = core.dynamic.current_supply.saturating_sub(pool);
                })?;
                store.modify_fba_accumulator(fba_id, |f| {
                    f.accumulated_fee_pool = Shares::ZERO;
                })?;
                continue;
            };

            let buyback_share = Shares::try_from_u128(mul_div_floor(
                pool.to_u128(),
                u128::from(fba.buyback_pct),
                100,
            ))
            .unwrap_or(Shares::ZERO);
            let issuer_share = Shares::try_from_u128(mul_div_floor(
                pool.to_u128(),
                u128::from(fba.issuer_pct),
                100,
            ))
            .unwrap_or(Shares::ZERO);
            // Rounding dust rides along with the network's cut.
            let network_share = pool - buyback_share - issuer_share;

            store.modify_asset(AssetId::CORE, |core| {
                core.dynamic.accumulated_fees =
                    core.dynamic.accumulated_fees.saturating_add(network_share);
            })?;

            let credit =
                |store: &mut LedgerStore,
                 bus: &mut EventBus,
                 account: AccountId,
                 amount: Shares|
                 -> Result<(), MaintenanceError> {
                    if !amount.is_positive() {
                        return Ok(());
                    }
                    store.adjust_balance(account, AssetId::CORE, amount)?;
                    let op = VirtualOperation::FbaDistribute {
                        account,
                        fba_id,
                        amount: AssetAmount::core(amount),
                    };
                    store.push_virtual_op(op.clone());
                    bus.queue(op);
                    Ok(())
                };
            if let Some(buyback_account) = asset.buyback_account {
                credit(store, bus, buyback_account, buyback_share)?;
            }
            credit(store, bus, asset.issuer, issuer_share)?;

            store.modify_fba_accumulator(fba_id, |f| {
                f.accumulated_fee_pool = Shares::ZERO;
            })?;
            debug!(
                fba_id, %pool, %network_share, %buyback_share, %issuer_share,
                "fee bucket settled"
            );
        }
        Ok(())
    }

    /// For every buyback-configured asset, sell the buyback account's
    /// disallowed holdings through immediately-canceled limit orders. The
    /// order only probes resting liquidity; whatever does not fill on
    /// contact is refunded. Per-asset failures are caught and skipped.
    pub fn create_buyback_orders(&self, store: &mut LedgerStore) -> Result<(), MaintenanceError> {
        let buyback_assets: Vec<(AssetId, AccountId, std::collections::BTreeSet<AssetId>)> = store
            .assets()
            .filter_map(|a| {
                a.buyback_account
                    .map(|account| (a.id, account, a.options.buyback_markets.clone()))
            })
            .collect();

        for (asset_id, account, allowed) in buyback_assets {
            let holdings: Vec<(AssetId, Shares)> = store.balances_of(account).collect();
            for (held, amount) in holdings {
                if held == asset_id || allowed.contains(&held) || !amount.is_positive() {
                    continue;
                }
                match store.place_limit_order(account, AssetAmount::new(amount, held), asset_id) {
                    Ok(placed) => {
                        if let Some(order_id) = placed.order_id {
                            store.cancel_limit_order(order_id)?;
                        }
                        if placed.sold.is_positive() {
                            debug!(
                                %asset_id, %held, sold = %placed.sold, received = %placed.received,
                                "buyback swap filled"
                            );
                        }
                    }
                    Err(err) => {
                        warn!(%asset_id, %held, %err, "buyback order skipped");
                    }
                }
            }
        }
        Ok(())
    }
}
