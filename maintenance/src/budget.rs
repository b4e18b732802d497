//! Per-interval issuance budget.
//!
//! The allocator runs in two steps: [`BudgetAllocator::plan`] computes the
//! interval's issuable budget and its apportionment without touching state;
//! after the worker dispatcher has drawn from the worker pool,
//! [`BudgetAllocator::commit`] verifies the conservation identity, applies
//! the supply delta, and appends the immutable [`BudgetRecord`].

use estuary_ledger::{BudgetRecord, LedgerStore};
use estuary_types::{
    AssetId, BudgetRecordId, Hardfork, HardforkSchedule, Shares, Timestamp, CYCLE_RATE_BITS,
    MAX_CORE_SUPPLY,
};
use estuary_utils::{mul_div_ceil, mul_div_floor};
use tracing::{debug, info};

use crate::error::MaintenanceError;

const SECONDS_PER_DAY: u64 = 86_400;

/// A computed but not yet committed budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetPlan {
    pub now: Timestamp,
    pub time_since_last_budget_secs: u64,
    pub time_to_maintenance_secs: u64,

    pub from_initial_reserve: Shares,
    pub from_accumulated_fees: Shares,
    pub from_unused_witness_budget: Shares,
    pub leftover_son_funds: Shares,

    pub requested_witness_budget: Shares,
    pub total_budget: Shares,
    pub witness_budget: Shares,
    pub son_budget: Shares,
    pub worker_budget: Shares,
}

/// Computes the interval's total issuable budget and apportions it into the
/// witness, SON, and worker pools.
pub struct BudgetAllocator;

impl BudgetAllocator {
    /// Compute this interval's budget from current state. Read-only.
    ///
    /// `now` is head-block time; `next_maintenance_time` must already have
    /// been advanced past it, so a nonpositive time-to-maintenance here is a
    /// consensus invariant violation.
    pub fn plan(
        &self,
        store: &LedgerStore,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<BudgetPlan, MaintenanceError> {
        let params = store.global().parameters.clone();
        let dpo = store.dynamic();
        let core = store.get_asset(AssetId::CORE)?;

        let time_to_maint = dpo.next_maintenance_time.as_secs().saturating_sub(now.as_secs());
        if time_to_maint == 0 {
            return Err(MaintenanceError::invariant(
                "time to next maintenance must be positive when budgeting",
            ));
        }

        // 0 on the very first budget or if the clock regressed.
        let dt = if dpo.last_budget_time == Timestamp::EPOCH {
            0
        } else {
            dpo.last_budget_time.elapsed_since(now)
        };

        // Fees and the unspent witness/SON budgets are treated as already
        // reserved at interval start even though they have not yet been
        // folded into the reserve.
        let reserve = MAX_CORE_SUPPLY.saturating_sub(core.dynamic.current_supply);
        let from_accumulated_fees = core.dynamic.accumulated_fees;
        let from_unused_witness_budget = dpo.witness_budget;
        let leftover_son_funds = dpo.son_budget;
        let available = reserve
            .checked_add(from_accumulated_fees)
            .and_then(|v| v.checked_add(from_unused_witness_budget))
            .and_then(|v| v.checked_add(leftover_son_funds))
            .ok_or_else(|| MaintenanceError::invariant("reserve accounting overflow"))?;

        // Emission this interval, 128-bit fixed point, capped by the
        // reserve itself.
        let emitted = mul_div_ceil(
            available.to_u128(),
            u128::from(dt) * u128::from(params.core_reserve_cycle_rate),
            1u128 << CYCLE_RATE_BITS,
        )
        .min(available.to_u128());
        let total_budget =
            Shares::try_from_u128(emitted).ok_or(MaintenanceError::Ledger(
                estuary_ledger::LedgerError::Overflow,
            ))?;

        let mut remaining = total_budget;

        let blocks_to_maint =
            time_to_maint.div_ceil(u64::from(params.block_interval_secs.max(1)));
        let requested_witness_budget = Shares::try_from_u128(
            params.witness_pay_per_block.to_u128() * u128::from(blocks_to_maint),
        )
        .unwrap_or(MAX_CORE_SUPPLY);
        let witness_budget = requested_witness_budget.min(remaining);
        remaining -= witness_budget;

        let son_budget = if schedule.activated(Hardfork::Son, now) {
            let granted = params.son_pay_max.min(remaining);
            remaining -= granted;
            granted
        } else {
            Shares::ZERO
        };

        let worker_budget = Shares::try_from_u128(mul_div_floor(
            params.worker_budget_per_day.to_u128(),
            u128::from(time_to_maint),
            u128::from(SECONDS_PER_DAY),
        ))
        .unwrap_or(MAX_CORE_SUPPLY)
        .min(remaining);

        debug!(
            %total_budget,
            %witness_budget,
            %son_budget,
            %worker_budget,
            dt,
            "budget planned"
        );

        Ok(BudgetPlan {
            now,
            time_since_last_budget_secs: dt,
            time_to_maintenance_secs: time_to_maint,
            from_initial_reserve: available,
            from_accumulated_fees,
            from_unused_witness_budget,
            leftover_son_funds,
            requested_witness_budget,
            total_budget,
            witness_budget,
            son_budget,
            worker_budget,
        })
    }

    /// Apply a planned budget: verify the conservation identity, adjust the
    /// core supply, zero the folded-in fees, replace the witness and SON
    /// pools, and append the budget record.
    pub fn commit(
        &self,
        store: &mut LedgerStore,
        plan: &BudgetPlan,
        leftover_worker_funds: Shares,
    ) -> Result<BudgetRecordId, MaintenanceError> {
        let record = BudgetRecord {
            id: BudgetRecordId::new(0), // assigned by the store on append
            time: plan.now,
            time_since_last_budget_secs: plan.time_since_last_budget_secs,
            from_initial_reserve: plan.from_initial_reserve,
            from_accumulated_fees: plan.from_accumulated_fees,
            from_unused_witness_budget: plan.from_unused_witness_budget,
            requested_witness_budget: plan.requested_witness_budget,
            total_budget: plan.total_budget,
            witness_budget: plan.witness_budget,
            worker_budget: plan.worker_budget,
            son_budget: plan.son_budget,
            leftover_worker_funds,
            leftover_son_funds: plan.leftover_son_funds,
            supply_delta: Shares::ZERO,
        };

        // Two derivations of the supply delta must agree: the
        // spent-minus-refolded accounting here, and the record's own
        // identity. Widened to i128 so no intermediate can saturate.
        let spent = i128::from(plan.witness_budget.raw())
            + i128::from(plan.son_budget.raw())
            + i128::from(plan.worker_budget.raw())
            - i128::from(leftover_worker_funds.raw());
        let refolded = i128::from(plan.from_accumulated_fees.raw())
            + i128::from(plan.from_unused_witness_budget.raw())
            + i128::from(plan.leftover_son_funds.raw());
        let supply_delta = i64::try_from(spent - refolded)
            .map(Shares::new)
            .map_err(|_| MaintenanceError::invariant("supply delta out of range"))?;
        let record = BudgetRecord {
            supply_delta,
            ..record
        };
        if record.supply_delta_identity() != supply_delta {
            return Err(MaintenanceError::invariant(format!(
                "budget supply delta mismatch: {} != {}",
                record.supply_delta_identity(),
                supply_delta
            )));
        }

        store.modify_asset(AssetId::CORE, |core| {
            core.dynamic.current_supply = core.dynamic.current_supply.saturating_add(supply_delta);
            core.dynamic.accumulated_fees = Shares::ZERO;
        })?;
        store.modify_dynamic(|d| {
            d.witness_budget = plan.witness_budget;
            d.son_budget = plan.son_budget;
            d.last_budget_time = plan.now;
        });
        let id = store.append_budget_record(record);
        info!(%supply_delta, total = %plan.total_budget, "budget committed");
        Ok(id)
    }
}
