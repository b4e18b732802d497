//! Stake-weighted vote tallying and the per-pass scratch buffers.
//!
//! The tally buffers are owned by the orchestrator's call frame, sized to
//! the vote registry at the start of each pass, and zeroed again when the
//! pass scope ends — on every exit path, including errors — so no stake can
//! leak into the next pass.

use std::ops::{Deref, DerefMut};

use estuary_ledger::account::Account;
use estuary_ledger::LedgerStore;
use estuary_types::{AssetId, Hardfork, HardforkSchedule, Timestamp};
use tracing::debug;

use crate::gpos::{in_bootstrap_window, vesting_factor};

/// Scratch mapping from vote-identifier instance to accumulated stake.
#[derive(Debug, Default)]
pub struct VoteTallyBuffer {
    entries: Vec<u64>,
}

impl VoteTallyBuffer {
    /// Add stake to a vote instance. Out-of-range instances are silently
    /// ignored — they refer to candidates registered after the buffer was
    /// sized, which cannot be elected this pass anyway.
    pub fn add(&mut self, instance: u32, stake: u64) {
        if let Some(entry) = self.entries.get_mut(instance as usize) {
            *entry = entry.saturating_add(stake);
        }
    }

    pub fn get(&self, instance: u32) -> u64 {
        self.entries.get(instance as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reset(&mut self, len: usize) {
        self.entries.clear();
        self.entries.resize(len, 0);
    }

    fn zero(&mut self) {
        self.entries.clear();
    }
}

/// Histogram of stake by desired committee size. Bucket `i` holds the stake
/// of accounts that asked for `2·i + 1` seats (bucket 0 collects
/// abstainers).
#[derive(Debug, Default)]
pub struct CountHistogram {
    buckets: Vec<u64>,
    max_count: u16,
}

impl CountHistogram {
    /// Add stake for an account desiring `desired` seats, clipped to the
    /// configured maximum.
    pub fn add(&mut self, desired: u16, stake: u64) {
        if self.buckets.is_empty() {
            return;
        }
        let desired = desired.min(self.max_count);
        let bucket = usize::from(desired / 2).min(self.buckets.len() - 1);
        self.buckets[bucket] = self.buckets[bucket].saturating_add(stake);
    }

    pub fn bucket(&self, index: usize) -> u64 {
        self.buckets.get(index).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn reset(&mut self, max_count: u16) {
        self.max_count = max_count;
        self.buckets.clear();
        self.buckets.resize(usize::from(max_count / 2) + 1, 0);
    }

    fn zero(&mut self) {
        self.buckets.clear();
        self.max_count = 0;
    }
}

/// All per-pass scratch state: the tally buffer, the three desired-count
/// histograms, and the total voting stake accumulator.
#[derive(Debug, Default)]
pub struct TallyArena {
    pub votes: VoteTallyBuffer,
    pub witness_histogram: CountHistogram,
    pub committee_histogram: CountHistogram,
    pub son_histogram: CountHistogram,
    pub total_voting_stake: u64,
}

impl TallyArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pass scope: size every buffer for the current registry and
    /// return a guard that zeroes the arena when dropped, regardless of how
    /// the pass exits.
    pub fn begin_pass(
        &mut self,
        vote_instances: u32,
        max_witness_count: u16,
        max_committee_count: u16,
        max_son_count: u16,
    ) -> TallyScope<'_> {
        self.votes.reset(vote_instances as usize);
        self.witness_histogram.reset(max_witness_count);
        self.committee_histogram.reset(max_committee_count);
        self.son_histogram.reset(max_son_count);
        self.total_voting_stake = 0;
        TallyScope { arena: self }
    }

    fn zero(&mut self) {
        self.votes.zero();
        self.witness_histogram.zero();
        self.committee_histogram.zero();
        self.son_histogram.zero();
        self.total_voting_stake = 0;
    }
}

/// Scope-exit guard over a [`TallyArena`]. Dropping it clears the buffers.
pub struct TallyScope<'a> {
    arena: &'a mut TallyArena,
}

impl Deref for TallyScope<'_> {
    type Target = TallyArena;
    fn deref(&self) -> &TallyArena {
        self.arena
    }
}

impl DerefMut for TallyScope<'_> {
    fn deref_mut(&mut self) -> &mut TallyArena {
        self.arena
    }
}

impl Drop for TallyScope<'_> {
    fn drop(&mut self) {
        self.arena.zero();
    }
}

/// Scans every stake-holding account and accumulates stake into the arena.
pub struct VoteTallyEngine;

impl VoteTallyEngine {
    /// Run the tally scan. Read-only over the store; all output lands in
    /// `arena`.
    pub fn tally(
        &self,
        store: &LedgerStore,
        arena: &mut TallyArena,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) {
        let params = store.global().parameters.clone();
        let gpos_weighted = schedule.activated(Hardfork::Gpos, now)
            && !in_bootstrap_window(schedule, &params, now);

        let mut accounts_tallied = 0u64;
        for account in store.accounts() {
            // Resolve the opinion account; a proxy pointing at a missing
            // account falls back to voting for itself.
            let opinion = account
                .voting_account
                .and_then(|proxy| store.get_account(proxy).ok())
                .unwrap_or(account);

            let stake = if gpos_weighted {
                let factor =
                    vesting_factor(opinion.statistics.last_vote_time, now, &params);
                let vested: u128 = self.gpos_stake(store, account);
                factor.apply(vested)
            } else {
                self.legacy_stake(store, account)
            };
            if stake == 0 {
                continue;
            }
            let stake = u64::try_from(stake).unwrap_or(u64::MAX);
            accounts_tallied += 1;

            for vote in &opinion.votes {
                arena.votes.add(vote.instance, stake);
            }
            arena
                .witness_histogram
                .add(opinion.num_witness.min(params.max_witness_count), stake);
            arena.committee_histogram.add(
                opinion.num_committee.min(params.max_committee_member_count),
                stake,
            );
            arena
                .son_histogram
                .add(opinion.num_son.min(params.max_son_count), stake);
            arena.total_voting_stake = arena.total_voting_stake.saturating_add(stake);
        }
        debug!(
            accounts_tallied,
            total_voting_stake = arena.total_voting_stake,
            "vote tally complete"
        );
    }

    /// GPOS stake: the sum of GPOS-kind core vesting balances the account
    /// owns (decay is applied by the caller).
    fn gpos_stake(&self, store: &LedgerStore, account: &Account) -> u128 {
        store
            .vesting_balances_of(account.id)
            .filter(|vb| vb.kind == estuary_ledger::VestingKind::Gpos)
            .filter(|vb| vb.balance.asset == AssetId::CORE)
            .map(|vb| vb.balance.amount.to_u128())
            .sum()
    }

    /// Legacy stake: liquid core balance, core locked in orders, the
    /// cashback vesting balance, and any GPOS balances at full weight.
    fn legacy_stake(&self, store: &LedgerStore, account: &Account) -> u128 {
        let liquid = store.get_balance(account.id, AssetId::CORE).to_u128();
        let in_orders = account.statistics.core_in_orders.to_u128();
        let cashback = account
            .cashback_vesting
            .and_then(|id| store.get_vesting_balance(id).ok())
            .filter(|vb| vb.balance.asset == AssetId::CORE)
            .map(|vb| vb.balance.amount.to_u128())
            .unwrap_or(0);
        liquid + in_orders + cashback + self.gpos_stake(store, account)
    }
}
