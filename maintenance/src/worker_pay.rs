//! Worker pay dispatch.

use estuary_ledger::{LedgerStore, Worker, WorkerPayout};
use estuary_types::{AssetId, Shares, Timestamp, WorkerId};
use estuary_utils::mul_div_floor;
use tracing::debug;

use crate::error::MaintenanceError;

const SECONDS_PER_DAY: u64 = 86_400;

/// Pays active, voted-for workers in priority order until the worker pool
/// runs dry.
pub struct WorkerPayDispatcher;

impl WorkerPayDispatcher {
    /// Walk the active workers by `(approving stake desc, id asc)`, paying
    /// each its daily pay prorated by `elapsed_secs`, capped by what is
    /// left of `budget`. Returns the unspent remainder, which the budget
    /// allocator lets evaporate back into the reserve.
    pub fn pay_workers(
        &self,
        store: &mut LedgerStore,
        budget: Shares,
        elapsed_secs: u64,
        now: Timestamp,
    ) -> Result<Shares, MaintenanceError> {
        let mut active: Vec<(u64, WorkerId)> = store
            .workers()
            .filter(|w| w.is_active(now) && w.total_votes_for.is_positive())
            .map(|w| {
                let stake = u64::try_from(w.total_votes_for.raw()).unwrap_or(0);
                (stake, w.id)
            })
            .collect();
        active.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut remaining = budget;
        for (_, id) in active {
            if remaining.is_zero() {
                break;
            }
            let worker = store.get_worker(id)?.clone();
            let requested = mul_div_floor(
                worker.daily_pay.to_u128(),
                u128::from(elapsed_secs),
                u128::from(SECONDS_PER_DAY),
            );
            let requested = Shares::try_from_u128(requested).unwrap_or(remaining);
            let actual = requested.min(remaining);
            if actual.is_zero() {
                continue;
            }
            self.dispatch(store, &worker, actual)?;
            remaining -= actual;
            debug!(worker = %id, paid = %actual, "worker paid");
        }
        Ok(remaining)
    }

    /// Hand `amount` to one worker through its payout kind. Every kind
    /// honors the same contract: `amount` has been drawn from the worker
    /// pool and the kind decides where it lands.
    fn dispatch(
        &self,
        store: &mut LedgerStore,
        worker: &Worker,
        amount: Shares,
    ) -> Result<(), MaintenanceError> {
        match &worker.payout {
            // Refund returns the shares to the reserve; Burn destroys them.
            // Either way the supply drops by the amount paid, the
            // difference is only how wallets present the worker.
            WorkerPayout::Refund | WorkerPayout::Burn => {
                store.modify_asset(AssetId::CORE, |core| {
                    core.dynamic.current_supply =
                        core.dynamic.current_supply.saturating_sub(amount);
                })?;
            }
            WorkerPayout::Vesting { balance } => {
                store.modify_vesting_balance(*balance, |vb| {
                    vb.balance.amount = vb.balance.amount.saturating_add(amount);
                })?;
            }
        }
        Ok(())
    }
}
