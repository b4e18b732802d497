//! The maintenance orchestrator.
//!
//! Runs inline while the block crossing `next_maintenance_time` is being
//! applied, before any other operation in that block. The pass is
//! single-threaded and synchronous: no I/O, no blocking, no interleaved
//! mutation. Subscriber notifications are queued on the event bus during
//! the pass and only delivered after every mutation has committed.

use estuary_ledger::{EventBus, LedgerStore};
use estuary_types::{HardforkSchedule, Timestamp};
use tracing::{info, instrument};

use crate::budget::BudgetAllocator;
use crate::dividend::DividendDistributionEngine;
use crate::elector::GovernanceElector;
use crate::error::MaintenanceError;
use crate::fba::FbaBuybackSettlement;
use crate::son_pay::SonPaymentEngine;
use crate::tally::{TallyArena, VoteTallyEngine};
use crate::worker_pay::WorkerPayDispatcher;

/// Owns the per-pass scratch arena, the hardfork schedule, and the event
/// bus, and sequences the maintenance components.
pub struct MaintenanceEngine {
    schedule: HardforkSchedule,
    arena: TallyArena,
    bus: EventBus,
    tally: VoteTallyEngine,
    elector: GovernanceElector,
    budget: BudgetAllocator,
    workers: WorkerPayDispatcher,
    sons: SonPaymentEngine,
    dividends: DividendDistributionEngine,
    fba: FbaBuybackSettlement,
}

impl MaintenanceEngine {
    pub fn new(schedule: HardforkSchedule) -> Self {
        Self {
            schedule,
            arena: TallyArena::new(),
            bus: EventBus::new(),
            tally: VoteTallyEngine,
            elector: GovernanceElector,
            budget: BudgetAllocator,
            workers: WorkerPayDispatcher,
            sons: SonPaymentEngine,
            dividends: DividendDistributionEngine,
            fba: FbaBuybackSettlement,
        }
    }

    /// Subscribe to post-commit maintenance events.
    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Invoked once per applied block. A no-op returning `Ok(false)` until
    /// the block timestamp crosses `next_maintenance_time`; then the whole
    /// pass runs to completion (or the error aborts block application —
    /// invariant violations must never be swallowed by the caller).
    #[instrument(skip(self, store), fields(block_time = %block_time))]
    pub fn perform_chain_maintenance(
        &mut self,
        store: &mut LedgerStore,
        block_time: Timestamp,
    ) -> Result<bool, MaintenanceError> {
        if store.dynamic().next_maintenance_time > block_time {
            return Ok(false);
        }
        info!("maintenance pass started");
        match self.run_pass(store, block_time) {
            Ok(()) => {
                // Deferred, fire-and-forget delivery; nothing here feeds
                // back into the next pass.
                self.bus.flush();
                info!("maintenance pass complete");
                Ok(true)
            }
            Err(err) => {
                self.bus.discard_queued();
                Err(err)
            }
        }
    }

    fn run_pass(
        &mut self,
        store: &mut LedgerStore,
        now: Timestamp,
    ) -> Result<(), MaintenanceError> {
        store.modify_dynamic(|d| d.head_block_time = now);
        let params = store.global().parameters.clone();

        {
            // The scope guard zeroes the arena on every exit path,
            // including the `?` below.
            let mut scope = self.arena.begin_pass(
                store.next_available_vote_instance(),
                params.max_witness_count,
                params.max_committee_member_count,
                params.max_son_count,
            );
            self.tally.tally(store, &mut scope, now, &self.schedule);
            self.elector
                .update_elected_sets(store, &scope, now, &self.schedule)?;
        }

        store.modify_dynamic(|d| {
            d.accounts_registered_this_interval = 0;
            d.next_maintenance_time = d
                .next_maintenance_time
                .advance_past(params.maintenance_interval_secs, now);
        });

        let plan = self.budget.plan(store, now, &self.schedule)?;
        let leftover_worker_funds = self.workers.pay_workers(
            store,
            plan.worker_budget,
            plan.time_since_last_budget_secs,
            now,
        )?;
        self.budget.commit(store, &plan, leftover_worker_funds)?;

        self.sons.pay_sons(store, now, &self.schedule)?;
        self.dividends
            .process_dividend_assets(store, now, &self.schedule, &mut self.bus)?;
        self.fba.distribute_fba_balances(store, &mut self.bus)?;
        self.fba.create_buyback_orders(store)?;
        Ok(())
    }
}
