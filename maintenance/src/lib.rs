//! Periodic chain-maintenance engine.
//!
//! Once per maintenance interval every validating node runs the same batch
//! procedure over its ledger state: tally stakeholder votes, re-elect the
//! witness / committee / SON sets, compute the interval's issuance budget,
//! pay workers and SONs, schedule dividend payouts, and settle fee-bucket
//! accumulators. All nodes must derive the identical result from identical
//! prior state, so everything in this crate is deterministic integer math
//! over the id-ordered object store.
//!
//! [`MaintenanceEngine::perform_chain_maintenance`] is the single entry
//! point, invoked once per applied block and a no-op until the block
//! timestamp crosses `next_maintenance_time`.

pub mod budget;
pub mod dividend;
pub mod elector;
pub mod engine;
pub mod error;
pub mod fba;
pub mod gpos;
pub mod son_pay;
pub mod tally;
pub mod worker_pay;

pub use budget::{BudgetAllocator, BudgetPlan};
pub use dividend::DividendDistributionEngine;
pub use elector::GovernanceElector;
pub use engine::MaintenanceEngine;
pub use error::MaintenanceError;
pub use fba::FbaBuybackSettlement;
pub use gpos::{vesting_factor, VestingFactor};
pub use son_pay::SonPaymentEngine;
pub use tally::{CountHistogram, TallyArena, VoteTallyBuffer, VoteTallyEngine};
pub use worker_pay::WorkerPayDispatcher;
