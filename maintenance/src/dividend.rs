//! Dividend distribution scheduling and payout flushing.
//!
//! Each dividend-bearing asset designates a distribution account. Deposits
//! into that account between passes become the next distribution delta,
//! which is credited pro rata to holders as *pending* payouts; at the
//! asset's payout interval the pending credits flush to real balances and
//! one grouped virtual operation per holder lands in the history.
//!
//! Failures here are per-asset or per-holder: a skipped asset logs and the
//! loop moves on. Only consensus-invariant violations propagate.

use estuary_ledger::{AssetAmount, EventBus, LedgerStore, VirtualOperation};
use estuary_types::{
    AccountId, AssetId, Hardfork, HardforkSchedule, Shares, Timestamp,
};
use estuary_utils::mul_div_floor;
use tracing::{debug, info, warn};

use crate::error::MaintenanceError;
use crate::gpos::vesting_factor;

/// Computes distribution deltas, schedules pro-rata pending credits, and
/// flushes due payouts.
pub struct DividendDistributionEngine;

impl DividendDistributionEngine {
    pub fn process_dividend_assets(
        &self,
        store: &mut LedgerStore,
        now: Timestamp,
        schedule: &HardforkSchedule,
        bus: &mut EventBus,
    ) -> Result<(), MaintenanceError> {
        if !schedule.activated(Hardfork::Dividend, now) {
            return Ok(());
        }
        let dividend_assets: Vec<AssetId> = store
            .assets()
            .filter(|a| a.dividend_data.is_some())
            .map(|a| a.id)
            .collect();

        for asset_id in dividend_assets {
            if let Err(err) = self.distribute_asset(store, asset_id, now, schedule) {
                match err {
                    MaintenanceError::InvariantViolation(_) => return Err(err),
                    err => warn!(asset = %asset_id, %err, "dividend distribution skipped"),
                }
            }
            if let Err(err) = self.flush_pending(store, asset_id, now, bus) {
                match err {
                    MaintenanceError::InvariantViolation(_) => return Err(err),
                    err => warn!(asset = %asset_id, %err, "dividend payout skipped"),
                }
            }
        }
        Ok(())
    }

    /// Compute the per-payout-asset delta of the distribution account since
    /// the last pass and schedule pro-rata pending credits (positive delta)
    /// or claw back outstanding ones (negative delta).
    fn distribute_asset(
        &self,
        store: &mut LedgerStore,
        asset_id: AssetId,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        let asset = store.get_asset(asset_id)?.clone();
        let Some(div) = asset.dividend_data.clone() else {
            return Ok(());
        };

        if let (Some(interval), Some(last)) = (
            div.options.minimum_distribution_interval_secs,
            div.last_distribution_time,
        ) {
            if now < last.saturating_add_secs(interval) {
                return Ok(());
            }
        }

        // Merge-walk the two payout-asset-sorted sequences: the
        // distribution account's live balances against the recorded
        // balances as of the previous pass.
        let current: Vec<(AssetId, Shares)> = store
            .balances_of(div.dividend_distribution_account)
            .collect();
        let previous: Vec<(AssetId, Shares)> = store.distributed_totals_for(asset_id);
        let mut deltas: Vec<(AssetId, Shares, Shares)> = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < current.len() || j < previous.len() {
            match (current.get(i), previous.get(j)) {
                (Some((ca, cb)), Some((pa, pb))) if ca == pa => {
                    deltas.push((*ca, *cb, *pb));
                    i += 1;
                    j += 1;
                }
                (Some((ca, cb)), Some((pa, _))) if ca < pa => {
                    deltas.push((*ca, *cb, Shares::ZERO));
                    i += 1;
                }
                (Some(_), Some((pa, pb))) => {
                    deltas.push((*pa, Shares::ZERO, *pb));
                    j += 1;
                }
                (Some((ca, cb)), None) => {
                    deltas.push((*ca, *cb, Shares::ZERO));
                    i += 1;
                }
                (None, Some((pa, pb))) => {
                    deltas.push((*pa, Shares::ZERO, *pb));
                    j += 1;
                }
                (None, None) => break,
            }
        }

        let mut distributed_any = false;
        for (payout_asset, current_balance, previous_balance) in deltas {
            let delta = current_balance - previous_balance;
            if delta.is_positive() {
                self.distribute_positive_delta(
                    store,
                    &asset,
                    div.dividend_distribution_account,
                    payout_asset,
                    delta,
                    now,
                    schedule,
                )?;
                distributed_any = true;
            } else if delta.is_negative() {
                self.claw_back(store, asset_id, payout_asset, -delta, previous_balance);
                store.set_distributed_total(asset_id, payout_asset, current_balance);
            }
        }

        if distributed_any {
            store.modify_asset(asset_id, |a| {
                if let Some(div) = a.dividend_data.as_mut() {
                    div.last_distribution_time = Some(now);
                    div.last_scheduled_distribution_time = Some(now);
                }
            })?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn distribute_positive_delta(
        &self,
        store: &mut LedgerStore,
        asset: &estuary_ledger::Asset,
        distribution_account: AccountId,
        payout_asset: AssetId,
        delta: Shares,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        let params = store.global().parameters.clone();
        let holders: Vec<(AccountId, Shares)> = store
            .holders_of(asset.id)
            .into_iter()
            .filter(|(holder, _)| *holder != distribution_account)
            .collect();
        if holders.is_empty() {
            return Ok(());
        }
        let total_balance: u128 = holders.iter().map(|(_, b)| b.to_u128()).sum();
        if total_balance == 0 {
            return Ok(());
        }

        // Per-holder base fee, converted into the payout asset. The gate
        // below intentionally compares the raw delta, not delta minus fee.
        let fee_core = Shares::try_from_u128(
            params.dividend_distribution_base_fee.to_u128() * holders.len() as u128,
        )
        .ok_or(estuary_ledger::LedgerError::Overflow)?;
        let fee_in_payout = if payout_asset == AssetId::CORE {
            fee_core
        } else {
            let payout = store.get_asset(payout_asset)?;
            if payout.dynamic.fee_pool < fee_core {
                return Err(estuary_ledger::LedgerError::InsufficientFeePool(payout_asset).into());
            }
            payout
                .options
                .core_exchange_rate
                .convert(AssetAmount::core(fee_core))?
                .amount
        };

        let minimum_shares_to_distribute = Shares::try_from_u128(mul_div_floor(
            fee_in_payout.to_u128(),
            10_000,
            u128::from(asset.dividend_data.as_ref().map(|d| d.options.minimum_fee_percentage).unwrap_or(0)),
        ))
        .unwrap_or(Shares::ZERO);
        if delta < minimum_shares_to_distribute {
            return Err(MaintenanceError::BelowDistributionMinimum {
                payout_asset,
                delta,
                minimum: minimum_shares_to_distribute,
            });
        }

        // Fee first: out of the distribution account, into the fee pots.
        store.adjust_balance(distribution_account, payout_asset, -fee_in_payout)?;
        if payout_asset == AssetId::CORE {
            store.modify_asset(AssetId::CORE, |core| {
                core.dynamic.accumulated_fees =
                    core.dynamic.accumulated_fees.saturating_add(fee_in_payout);
            })?;
        } else {
            store.modify_asset(payout_asset, |payout| {
                payout.dynamic.fee_pool = payout.dynamic.fee_pool.saturating_sub(fee_core);
                payout.dynamic.accumulated_fees =
                    payout.dynamic.accumulated_fees.saturating_add(fee_in_payout);
            })?;
            store.modify_asset(AssetId::CORE, |core| {
                core.dynamic.accumulated_fees =
                    core.dynamic.accumulated_fees.saturating_add(fee_core);
            })?;
        }

        // Record the post-fee balance now: the holder loop below only
        // creates pending credits, it never moves the account again, and an
        // early return here must not leave a phantom delta for the next
        // pass.
        let balance_after_fee = store.get_balance(distribution_account, payout_asset);
        store.set_distributed_total(asset.id, payout_asset, balance_after_fee);

        let distributable = delta - fee_in_payout;
        if !distributable.is_positive() {
            return Ok(());
        }

        // Core-asset dividends decay with the holder's GPOS vesting factor;
        // what decay eats goes to the fallback account instead of the
        // holder. Preserved as found — other payout assets never decay.
        let gpos_decay =
            payout_asset == AssetId::CORE && schedule.activated(Hardfork::Gpos, now);

        let mut scheduled_total = Shares::ZERO;
        for (holder, balance) in holders {
            let share = Shares::try_from_u128(mul_div_floor(
                distributable.to_u128(),
                balance.to_u128(),
                total_balance,
            ))
            .unwrap_or(Shares::ZERO);
            if share.is_zero() {
                continue;
            }
            let credited = if gpos_decay {
                let factor = vesting_factor(
                    store.get_account(holder)?.statistics.last_vote_time,
                    now,
                    &params,
                );
                Shares::try_from_u128(factor.apply(share.to_u128())).unwrap_or(Shares::ZERO)
            } else {
                share
            };
            let lost_to_decay = share - credited;
            if credited.is_positive() {
                store.adjust_pending_dividend(asset.id, holder, payout_asset, credited);
            }
            if lost_to_decay.is_positive() {
                store.adjust_pending_dividend(
                    asset.id,
                    params.dividend_decay_fallback_account,
                    payout_asset,
                    lost_to_decay,
                );
            }
            scheduled_total = scheduled_total.saturating_add(share);
        }
        // Rounding dust (distributable - scheduled_total) stays with the
        // distribution account.

        info!(
            asset = %asset.id, %payout_asset, %delta, scheduled = %scheduled_total,
            "dividend distribution scheduled"
        );
        Ok(())
    }

    /// An override transfer pulled funds back out of the distribution
    /// account: shrink every outstanding pending credit by the same ratio,
    /// never below zero.
    fn claw_back(
        &self,
        store: &mut LedgerStore,
        holder_asset: AssetId,
        payout_asset: AssetId,
        shortfall: Shares,
        previous_balance: Shares,
    ) {
        if !previous_balance.is_positive() {
            return;
        }
        let pending: Vec<(AccountId, AssetId, Shares)> = store
            .pending_dividends_for(holder_asset)
            .into_iter()
            .filter(|(_, payout, _)| *payout == payout_asset)
            .collect();
        for (holder, payout, amount) in pending {
            let reduction = Shares::try_from_u128(mul_div_floor(
                amount.to_u128(),
                shortfall.to_u128(),
                previous_balance.to_u128(),
            ))
            .unwrap_or(Shares::ZERO)
            .min(amount);
            if reduction.is_positive() {
                store.adjust_pending_dividend(holder_asset, holder, payout, -reduction);
            }
        }
        debug!(%holder_asset, %payout_asset, %shortfall, "pending dividends clawed back");
    }

    /// Flush all pending credits for an asset once its payout time has
    /// arrived. Pending records are walked holder-major, so each holder
    /// gets one grouped virtual operation covering every payout asset.
    fn flush_pending(
        &self,
        store: &mut LedgerStore,
        asset_id: AssetId,
        now: Timestamp,
        bus: &mut EventBus,
    ) -> Result<(), MaintenanceError> {
        let asset = store.get_asset(asset_id)?.clone();
        let Some(div) = asset.dividend_data.clone() else {
            return Ok(());
        };
        let Some(interval) = div.options.payout_interval_secs else {
            return Ok(());
        };
        let Some(next_payout) = div.next_payout_time else {
            // First pass for this asset: anchor the payout clock.
            let first = now.advance_past(interval, now);
            store.modify_asset(asset_id, |a| {
                if let Some(div) = a.dividend_data.as_mut() {
                    div.next_payout_time = Some(first);
                }
            })?;
            return Ok(());
        };
        if now < next_payout {
            return Ok(());
        }

        let pending = store.pending_dividends_for(asset_id);
        let mut current_holder: Option<AccountId> = None;
        let mut amounts: Vec<AssetAmount> = Vec::new();
        let flush_group =
            |store: &mut LedgerStore,
             bus: &mut EventBus,
             holder: AccountId,
             amounts: &mut Vec<AssetAmount>| {
                if amounts.is_empty() {
                    return;
                }
                let op = VirtualOperation::AssetDividendDistribution {
                    dividend_asset: asset_id,
                    account: holder,
                    amounts: std::mem::take(amounts),
                };
                store.push_virtual_op(op.clone());
                bus.queue(op);
            };

        for (holder, payout_asset, amount) in pending {
            if current_holder != Some(holder) {
                if let Some(previous) = current_holder {
                    flush_group(store, bus, previous, &mut amounts);
                }
                current_holder = Some(holder);
            }
            // A holder barred from the payout asset keeps its pending
            // credit until it becomes eligible.
            if !store.is_authorized(holder, payout_asset) {
                warn!(%holder, %payout_asset, "dividend payout skipped: holder not authorized");
                continue;
            }
            store.adjust_balance(div.dividend_distribution_account, payout_asset, -amount)?;
            store.adjust_balance(holder, payout_asset, amount)?;
            store.adjust_pending_dividend(asset_id, holder, payout_asset, -amount);
            let remaining = store
                .distributed_total(asset_id, payout_asset)
                .saturating_sub(amount);
            store.set_distributed_total(asset_id, payout_asset, remaining);
            amounts.push(AssetAmount::new(amount, payout_asset));
        }
        if let Some(holder) = current_holder {
            flush_group(store, bus, holder, &mut amounts);
        }

        let next = next_payout.advance_past(interval, now);
        store.modify_asset(asset_id, |a| {
            if let Some(div) = a.dividend_data.as_mut() {
                div.next_payout_time = Some(next);
                div.last_payout_time = Some(now);
            }
        })?;
        Ok(())
    }
}
