//! Chain parameters — every committee-settable value the maintenance engine
//! reads.
//!
//! These live inside `GlobalProperties` and change only through committee
//! proposals, never inside the maintenance pass itself.

use crate::amount::Shares;
use crate::ids::AccountId;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Bit width of the reserve emission rate denominator: the per-second
/// emission fraction is `core_reserve_cycle_rate / 2^CYCLE_RATE_BITS`.
pub const CYCLE_RATE_BITS: u32 = 32;

/// Committee-settable parameters stored by every node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainParameters {
    // ── Scheduling ───────────────────────────────────────────────────────
    /// Target seconds between blocks.
    pub block_interval_secs: u8,

    /// Seconds between maintenance passes.
    pub maintenance_interval_secs: u64,

    /// Block slots skipped immediately after a maintenance pass.
    pub maintenance_skip_slots: u8,

    // ── Governance sizes ─────────────────────────────────────────────────
    /// Floor on the elected witness set size.
    pub min_witness_count: u16,

    /// Hard cap on the elected witness set size.
    pub max_witness_count: u16,

    pub min_committee_member_count: u16,
    pub max_committee_member_count: u16,

    pub min_son_count: u16,
    pub max_son_count: u16,

    /// Minimum SONs in the new active set before a multisig wallet
    /// recreation record is created.
    pub son_wallet_recreation_min_count: u16,

    // ── Pay ──────────────────────────────────────────────────────────────
    /// Witness pay per produced block (funds the witness budget request).
    pub witness_pay_per_block: Shares,

    /// Worker budget accrual per day.
    pub worker_budget_per_day: Shares,

    /// Cap on the SON budget granted per interval.
    pub son_pay_max: Shares,

    /// Seconds between SON payout rounds.
    pub son_pay_time_secs: u64,

    /// Downtime after which a SON is deactivated (consumed by heartbeat
    /// evaluators; carried here because it is committee-settable).
    pub son_deactivate_downtime_secs: u64,

    // ── Issuance ─────────────────────────────────────────────────────────
    /// Numerator of the per-second reserve emission fraction
    /// (over `2^CYCLE_RATE_BITS`).
    pub core_reserve_cycle_rate: u64,

    // ── GPOS ─────────────────────────────────────────────────────────────
    /// Length of one full GPOS vesting period.
    pub gpos_period_secs: u64,

    /// Length of one GPOS subperiod; `gpos_period_secs` must be a whole
    /// multiple of this.
    pub gpos_subperiod_secs: u64,

    /// When the first GPOS period begins.
    pub gpos_period_start: Timestamp,

    /// Lock-in period for GPOS vesting balances.
    pub gpos_vesting_lockin_period_secs: u64,

    // ── Dividends ────────────────────────────────────────────────────────
    /// Per-holder base fee charged against each dividend distribution.
    pub dividend_distribution_base_fee: Shares,

    /// Account receiving dividend shares lost to GPOS vote decay.
    pub dividend_decay_fallback_account: AccountId,
}

impl ChainParameters {
    /// GPOS subperiods per period. Parameters with a zero subperiod are
    /// treated as a single-subperiod configuration.
    pub fn gpos_subperiod_count(&self) -> u64 {
        if self.gpos_subperiod_secs == 0 {
            1
        } else {
            (self.gpos_period_secs / self.gpos_subperiod_secs).max(1)
        }
    }

    /// Mainnet defaults — the intended configuration for the live network.
    pub fn mainnet_defaults() -> Self {
        Self {
            block_interval_secs: 3,
            maintenance_interval_secs: 3600,
            maintenance_skip_slots: 3,

            min_witness_count: 11,
            max_witness_count: 1001,
            min_committee_member_count: 11,
            max_committee_member_count: 1001,
            min_son_count: 5,
            max_son_count: 15,
            son_wallet_recreation_min_count: 5,

            witness_pay_per_block: Shares::new(100_000),
            worker_budget_per_day: Shares::new(50_000_000),
            son_pay_max: Shares::new(20_000_000),
            son_pay_time_secs: 86_400,
            son_deactivate_downtime_secs: 12 * 3600,

            // ~5%/year of the remaining reserve: 0.05 / 31_557_600 × 2^32 ≈ 7.
            core_reserve_cycle_rate: 7,

            gpos_period_secs: 180 * 86_400,
            gpos_subperiod_secs: 30 * 86_400,
            gpos_period_start: Timestamp::new(1_579_104_000),
            gpos_vesting_lockin_period_secs: 180 * 86_400,

            dividend_distribution_base_fee: Shares::new(100),
            dividend_decay_fallback_account: AccountId::new(4),
        }
    }
}

/// Default is the mainnet configuration.
impl Default for ChainParameters {
    fn default() -> Self {
        Self::mainnet_defaults()
    }
}
