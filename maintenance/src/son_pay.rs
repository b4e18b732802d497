//! SON payout rounds.
//!
//! The SON pool accumulated by the budget allocator is split among active
//! SONs proportional to how many sidechain transactions each signed, with
//! each SON's share weighted by its compressed vote tally.

use estuary_ledger::LedgerStore;
use estuary_types::{AssetId, Hardfork, HardforkSchedule, Shares, SonId, Timestamp};
use estuary_utils::mul_div_floor;
use tracing::{debug, info};

use crate::error::MaintenanceError;

/// Compress a vote count into a 16-bit weight by right-shifting `shift`
/// bits, flooring at 1 so an elected SON never weighs nothing.
fn compressed_weight(votes: u64, shift: u32) -> u64 {
    ((votes >> shift) as u16).max(1).into()
}

/// Shift needed to fit `value` into 16 bits.
fn shift_to_fit(value: u64) -> u32 {
    let mut shift = 0;
    while (value >> shift) > u64::from(u16::MAX) {
        shift += 1;
    }
    shift
}

/// Splits the SON pay pool among active SONs by signed-transaction counts.
pub struct SonPaymentEngine;

impl SonPaymentEngine {
    /// Run a payout round if one is due. SONs that signed nothing in the
    /// period are skipped entirely; that is normal input, not an error.
    pub fn pay_sons(
        &self,
        store: &mut LedgerStore,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<Shares, MaintenanceError> {
        let params = store.global().parameters.clone();
        let dpo = store.dynamic();
        let son_budget = dpo.son_budget;
        if !son_budget.is_positive() {
            return Ok(Shares::ZERO);
        }
        if dpo.last_son_payout_time.elapsed_since(now) < params.son_pay_time_secs {
            return Ok(Shares::ZERO);
        }

        let active: Vec<SonId> = store.global().active_sons.clone();

        // Vote-weight compression. Before the SON2 hardfork the shift is
        // derived from the sum of every elected SON's votes; afterwards each
        // SON's own vote count picks its shift.
        let votes: Vec<(SonId, u64)> = active
            .iter()
            .map(|id| {
                let son = store.get_son(*id)?;
                Ok((*id, u64::try_from(son.total_votes.raw()).unwrap_or(0)))
            })
            .collect::<Result<_, MaintenanceError>>()?;

        let total_shift = shift_to_fit(votes.iter().map(|(_, v)| *v).sum());
        let weight_of = |votes_i: u64| -> u64 {
            if schedule.activated(Hardfork::Son2, now) {
                compressed_weight(votes_i, shift_to_fit(votes_i))
            } else {
                compressed_weight(votes_i, total_shift)
            }
        };

        let mut weighted: Vec<(SonId, u128)> = Vec::with_capacity(votes.len());
        let mut weighted_total_signed: u128 = 0;
        for (id, votes_i) in &votes {
            let signed = store.get_son_statistics(*id)?.total_txs_signed();
            if signed == 0 {
                continue;
            }
            let contribution = u128::from(signed) * u128::from(weight_of(*votes_i));
            weighted.push((*id, contribution));
            weighted_total_signed += contribution;
        }

        let mut total_paid = Shares::ZERO;
        if weighted_total_signed > 0 {
            for (id, contribution) in weighted {
                let pay = mul_div_floor(contribution, son_budget.to_u128(), weighted_total_signed);
                let pay = Shares::try_from_u128(pay).unwrap_or(Shares::ZERO);
                if pay.is_zero() {
                    continue;
                }
                let son_account = store.get_son(id)?.son_account;
                store.adjust_balance(son_account, AssetId::CORE, pay)?;
                store.modify_son_statistics(id, |stats| stats.reset_txs_signed())?;
                total_paid = total_paid.saturating_add(pay);
                debug!(son = %id, paid = %pay, "SON paid");
            }
        }

        store.modify_dynamic(|d| {
            d.son_budget = d.son_budget.saturating_sub(total_paid);
            d.last_son_payout_time = now;
        });
        if total_paid.is_positive() {
            info!(%total_paid, "SON payout round complete");
        }
        Ok(total_paid)
    }
}
