//! Governance election: consume the vote tally, select the active
//! witness / committee / SON sets, and rebuild the role-account
//! authorities.

use std::collections::BTreeSet;

use estuary_ledger::{
    Authority, LedgerStore, SonStatus, COMMITTEE_ACCOUNT, SON_ACCOUNT, WITNESS_ACCOUNT,
};
use estuary_types::{
    AccountId, Hardfork, HardforkSchedule, Shares, SonId, Timestamp, WitnessId,
};
use tracing::{debug, info};

use crate::error::MaintenanceError;
use crate::tally::{CountHistogram, TallyArena};

/// How an authority's passing threshold is derived from its total weight.
#[derive(Clone, Copy, Debug)]
enum Threshold {
    /// Half the weight plus one — witnesses and committee.
    Half,
    /// Two thirds of the weight plus one — SONs.
    TwoThirds,
}

impl Threshold {
    fn of(self, total_weight: u64) -> u32 {
        let t = match self {
            Threshold::Half => total_weight / 2 + 1,
            Threshold::TwoThirds => total_weight * 2 / 3 + 1,
        };
        u32::try_from(t).unwrap_or(u32::MAX)
    }
}

/// Weighted vote-counting finisher: accumulates `(account, tallied stake)`
/// pairs and emits an authority whose weights are the stakes right-shifted
/// to fit 16 bits (minimum weight 1).
#[derive(Default)]
struct VoteCounter {
    entries: Vec<(AccountId, u64)>,
}

impl VoteCounter {
    fn add(&mut self, account: AccountId, votes: u64) {
        self.entries.push((account, votes));
    }

    fn finish(self, threshold: Threshold) -> Authority {
        let max_votes = self.entries.iter().map(|(_, v)| *v).max().unwrap_or(0);
        let mut shift = 0u32;
        while (max_votes >> shift) > u64::from(u16::MAX) {
            shift += 1;
        }
        let mut authority = Authority::null();
        let mut total = 0u64;
        for (account, votes) in self.entries {
            let weight = ((votes >> shift) as u16).max(1);
            total += u64::from(weight);
            authority.account_auths.insert(account, weight);
        }
        authority.weight_threshold = threshold.of(total);
        authority
    }
}

/// One-account-one-vote authority, used before the weighted-authority
/// hardfork.
fn equal_weight_authority(
    accounts: impl Iterator<Item = AccountId>,
    threshold: Threshold,
) -> Authority {
    let mut authority = Authority::null();
    let mut total = 0u64;
    for account in accounts {
        authority.account_auths.insert(account, 1);
        total += 1;
    }
    authority.weight_threshold = threshold.of(total);
    authority
}

/// Smallest histogram bucket index such that the cumulative stake from
/// bucket 1 upward first exceeds half the non-abstaining stake. The
/// preferred set size is `2 · index + 1`.
fn preferred_bucket(histogram: &CountHistogram, total_voting_stake: u64) -> usize {
    let stake_target = total_voting_stake.saturating_sub(histogram.bucket(0)) / 2;
    let mut stake_tally = 0u64;
    let mut index = 0usize;
    if stake_target > 0 && histogram.len() > 0 {
        while index < histogram.len() - 1 && stake_tally <= stake_target {
            index += 1;
            stake_tally = stake_tally.saturating_add(histogram.bucket(index));
        }
    }
    index
}

/// Partial-sort `candidates` by `(stake desc, id asc)` and keep the top
/// `take`.
fn rank_and_take<I: Copy + Ord>(mut candidates: Vec<(u64, I)>, take: usize) -> Vec<(u64, I)> {
    let cmp =
        |a: &(u64, I), b: &(u64, I)| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1));
    if take == 0 {
        return Vec::new();
    }
    if candidates.len() > take {
        candidates.select_nth_unstable_by(take - 1, cmp);
        candidates.truncate(take);
    }
    candidates.sort_unstable_by(cmp);
    candidates
}

/// Consumes the tally buffers and rewrites the elected sets, their
/// candidate vote totals, the role-account authorities, and the scheduler
/// seed.
pub struct GovernanceElector;

impl GovernanceElector {
    pub fn update_elected_sets(
        &self,
        store: &mut LedgerStore,
        arena: &TallyArena,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        self.update_witnesses(store, arena, now, schedule)?;
        self.update_committee(store, arena, now, schedule)?;
        if schedule.activated(Hardfork::Son, now) {
            self.update_sons(store, arena, now, schedule)?;
        }
        self.refresh_scheduler_seed(store, now);
        Ok(())
    }

    fn update_witnesses(
        &self,
        store: &mut LedgerStore,
        arena: &TallyArena,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        let min_count = usize::from(store.global().parameters.min_witness_count);

        let candidates: Vec<(u64, WitnessId)> = store
            .witnesses()
            .map(|w| (arena.votes.get(w.vote_id.instance), w.id))
            .collect();
        for (stake, id) in &candidates {
            let stake = Shares::new(i64::try_from(*stake).unwrap_or(i64::MAX));
            store.modify_witness(*id, |w| w.total_votes = stake)?;
        }

        let bucket = preferred_bucket(&arena.witness_histogram, arena.total_voting_stake);
        let target = (bucket * 2 + 1).max(min_count).min(candidates.len());
        let elected = rank_and_take(candidates, target);

        let mut counter = VoteCounter::default();
        let mut accounts = Vec::with_capacity(elected.len());
        for (stake, id) in &elected {
            let account = store.get_witness(*id)?.witness_account;
            counter.add(account, *stake);
            accounts.push(account);
        }
        let authority = if schedule.activated(Hardfork::WeightedAuthority, now) {
            counter.finish(Threshold::Half)
        } else {
            equal_weight_authority(accounts.into_iter(), Threshold::Half)
        };
        store.modify_account(WITNESS_ACCOUNT, |a| a.active = authority)?;

        let active: Vec<WitnessId> = elected.iter().map(|(_, id)| *id).collect();
        debug!(count = active.len(), "witness set elected");
        store.modify_global(|g| g.active_witnesses = active);
        Ok(())
    }

    fn update_committee(
        &self,
        store: &mut LedgerStore,
        arena: &TallyArena,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        let min_count = usize::from(store.global().parameters.min_committee_member_count);

        let candidates: Vec<(u64, estuary_types::CommitteeMemberId)> = store
            .committee_members()
            .map(|m| (arena.votes.get(m.vote_id.instance), m.id))
            .collect();
        for (stake, id) in &candidates {
            let stake = Shares::new(i64::try_from(*stake).unwrap_or(i64::MAX));
            store.modify_committee_member(*id, |m| m.total_votes = stake)?;
        }

        let bucket = preferred_bucket(&arena.committee_histogram, arena.total_voting_stake);
        let target = (bucket * 2 + 1).max(min_count).min(candidates.len());
        let elected = rank_and_take(candidates, target);

        let mut counter = VoteCounter::default();
        let mut accounts = Vec::with_capacity(elected.len());
        for (stake, id) in &elected {
            let account = store.get_committee_member(*id)?.committee_member_account;
            counter.add(account, *stake);
            accounts.push(account);
        }
        let authority = if schedule.activated(Hardfork::WeightedAuthority, now) {
            counter.finish(Threshold::Half)
        } else {
            equal_weight_authority(accounts.into_iter(), Threshold::Half)
        };
        store.modify_account(COMMITTEE_ACCOUNT, |a| a.active = authority)?;

        let active: Vec<estuary_types::CommitteeMemberId> =
            elected.iter().map(|(_, id)| *id).collect();
        debug!(count = active.len(), "committee set elected");
        store.modify_global(|g| g.active_committee_members = active);
        Ok(())
    }

    fn update_sons(
        &self,
        store: &mut LedgerStore,
        arena: &TallyArena,
        now: Timestamp,
        schedule: &HardforkSchedule,
    ) -> Result<(), MaintenanceError> {
        let params = store.global().parameters.clone();
        let min_count = usize::from(params.min_son_count);

        // Refresh vote totals on every candidate, electable or not.
        let all: Vec<(u64, SonId)> = store
            .sons()
            .map(|s| (arena.votes.get(s.vote_id.instance), s.id))
            .collect();
        for (stake, id) in &all {
            let stake = Shares::new(i64::try_from(*stake).unwrap_or(i64::MAX));
            store.modify_son(*id, |s| s.total_votes = stake)?;
        }

        // Only SONs with complete sidechain config and a live registration
        // may stand.
        let candidates: Vec<(u64, SonId)> = store
            .sons()
            .filter(|s| s.electable())
            .map(|s| (arena.votes.get(s.vote_id.instance), s.id))
            .collect();

        let bucket = preferred_bucket(&arena.son_histogram, arena.total_voting_stake);
        let target = (bucket * 2 + 1).max(min_count).min(candidates.len());
        let elected = rank_and_take(candidates, target);

        let mut counter = VoteCounter::default();
        let mut accounts = Vec::with_capacity(elected.len());
        for (stake, id) in &elected {
            let account = store.get_son(*id)?.son_account;
            counter.add(account, *stake);
            accounts.push(account);
        }
        let authority = if schedule.activated(Hardfork::WeightedAuthority, now) {
            counter.finish(Threshold::TwoThirds)
        } else {
            equal_weight_authority(accounts.into_iter(), Threshold::TwoThirds)
        };
        store.modify_account(SON_ACCOUNT, |a| a.active = authority)?;

        let next: Vec<SonId> = elected.iter().map(|(_, id)| *id).collect();
        let previous = store.global().active_sons.clone();
        let prev_set: BTreeSet<SonId> = previous.iter().copied().collect();
        let next_set: BTreeSet<SonId> = next.iter().copied().collect();

        if prev_set != next_set {
            // Departures go inactive, arrivals go active; an
            // operator-requested maintenance window survives both.
            for id in prev_set.difference(&next_set) {
                store.modify_son(*id, |s| {
                    if s.status == SonStatus::Active {
                        s.status = SonStatus::Inactive;
                    }
                })?;
            }
            for id in next_set.difference(&prev_set) {
                store.modify_son(*id, |s| {
                    if s.status == SonStatus::Inactive {
                        s.status = SonStatus::Active;
                    }
                })?;
            }

            if next.len() >= usize::from(params.son_wallet_recreation_min_count) {
                if let Some(current) = store.current_son_wallet() {
                    let id = current.id;
                    store.modify_son_wallet(id, |w| w.expires = Some(now))?;
                }
                store.create_son_wallet(now, next.clone());
                info!(count = next.len(), "SON set changed, wallet recreation scheduled");
            }
        }

        store.modify_global(|g| g.active_sons = next);
        Ok(())
    }

    /// Deterministic scheduler-seed refresh: an FNV-1a fold of head time and
    /// the elected id sets.
    fn refresh_scheduler_seed(&self, store: &mut LedgerStore, now: Timestamp) {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
        let mut seed = FNV_OFFSET;
        let mut fold = |value: u64| {
            for byte in value.to_le_bytes() {
                seed ^= u64::from(byte);
                seed = seed.wrapping_mul(FNV_PRIME);
            }
        };
        fold(now.as_secs());
        let global = store.global();
        let witnesses: Vec<u64> = global.active_witnesses.iter().map(|w| w.instance()).collect();
        let committee: Vec<u64> = global
            .active_committee_members
            .iter()
            .map(|m| m.instance())
            .collect();
        let sons: Vec<u64> = global.active_sons.iter().map(|s| s.instance()).collect();
        witnesses.into_iter().for_each(&mut fold);
        committee.into_iter().for_each(&mut fold);
        sons.into_iter().for_each(&mut fold);
        store.modify_dynamic(|d| d.random_seed = seed);
    }
}
