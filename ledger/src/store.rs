//! The in-memory transactional object store.
//!
//! Every collection is a `BTreeMap` keyed by object id, so iteration order
//! is the id order on every node — the maintenance pass depends on this for
//! determinism. Mutation goes through `modify_*` closures; callers never
//! hold a mutable alias across two calls to the same object.

use std::collections::BTreeMap;

use estuary_types::{
    AccountId, AssetId, BudgetRecordId, ChainParameters, CommitteeMemberId, Shares, SonId,
    SonWalletId, Timestamp, VestingBalanceId, VoteId, VoteKind, WitnessId, WorkerId,
};

use crate::account::Account;
use crate::asset::{Asset, AssetAmount, FbaAccumulator};
use crate::budget::BudgetRecord;
use crate::committee::CommitteeMember;
use crate::error::LedgerError;
use crate::global::{
    DynamicGlobalProperties, GlobalProperties, COMMITTEE_ACCOUNT, NETWORK_ACCOUNT, SON_ACCOUNT,
    WITNESS_ACCOUNT,
};
use crate::ops::VirtualOperation;
use crate::son::{Son, SonStatistics, SonWallet};
use crate::vesting::{VestingBalance, VestingKind};
use crate::witness::Witness;
use crate::worker::{Worker, WorkerPayout};

/// A resting exchange offer: gives up to `for_sale`, asks `receive` in
/// proportion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimitOrder {
    pub id: u64,
    pub seller: AccountId,
    pub for_sale: AssetAmount,
    pub receive: AssetAmount,
}

/// Outcome of placing a limit order: what matched immediately and the id of
/// the resting remainder, if any survived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: Option<u64>,
    pub sold: Shares,
    pub received: Shares,
}

/// The whole ledger object store.
pub struct LedgerStore {
    accounts: BTreeMap<AccountId, Account>,
    witnesses: BTreeMap<WitnessId, Witness>,
    committee_members: BTreeMap<CommitteeMemberId, CommitteeMember>,
    sons: BTreeMap<SonId, Son>,
    son_statistics: BTreeMap<SonId, SonStatistics>,
    son_wallets: BTreeMap<SonWalletId, SonWallet>,
    workers: BTreeMap<WorkerId, Worker>,
    assets: BTreeMap<AssetId, Asset>,
    vesting_balances: BTreeMap<VestingBalanceId, VestingBalance>,
    /// Secondary index: owner → vesting balance.
    vesting_by_owner: BTreeMap<(AccountId, VestingBalanceId), ()>,
    budget_records: BTreeMap<BudgetRecordId, BudgetRecord>,
    fba_accumulators: BTreeMap<u8, FbaAccumulator>,
    balances: BTreeMap<(AccountId, AssetId), Shares>,
    /// (holder asset, holder, payout asset) → unflushed dividend credit.
    pending_dividends: BTreeMap<(AssetId, AccountId, AssetId), Shares>,
    /// (holder asset, payout asset) → distribution-account balance as of the
    /// last pass.
    distributed_totals: BTreeMap<(AssetId, AssetId), Shares>,
    limit_orders: BTreeMap<u64, LimitOrder>,
    history: Vec<VirtualOperation>,

    global: GlobalProperties,
    dynamic: DynamicGlobalProperties,

    next_account: u64,
    next_witness: u64,
    next_committee_member: u64,
    next_son: u64,
    next_son_wallet: u64,
    next_worker: u64,
    next_asset: u64,
    next_vesting_balance: u64,
    next_budget_record: u64,
    next_order: u64,
    next_vote_instance: u32,
}

impl LedgerStore {
    /// A fresh store holding the special accounts, the core asset, and one
    /// unconfigured fee-bucket accumulator.
    pub fn new(parameters: ChainParameters) -> Self {
        let mut store = Self {
            accounts: BTreeMap::new(),
            witnesses: BTreeMap::new(),
            committee_members: BTreeMap::new(),
            sons: BTreeMap::new(),
            son_statistics: BTreeMap::new(),
            son_wallets: BTreeMap::new(),
            workers: BTreeMap::new(),
            assets: BTreeMap::new(),
            vesting_balances: BTreeMap::new(),
            vesting_by_owner: BTreeMap::new(),
            budget_records: BTreeMap::new(),
            fba_accumulators: BTreeMap::new(),
            balances: BTreeMap::new(),
            pending_dividends: BTreeMap::new(),
            distributed_totals: BTreeMap::new(),
            limit_orders: BTreeMap::new(),
            history: Vec::new(),
            global: GlobalProperties::new(parameters),
            dynamic: DynamicGlobalProperties::default(),
            next_account: 0,
            next_witness: 0,
            next_committee_member: 0,
            next_son: 0,
            next_son_wallet: 0,
            next_worker: 0,
            next_asset: 0,
            next_vesting_balance: 0,
            next_budget_record: 0,
            next_order: 0,
            next_vote_instance: 0,
        };
        let fallback = store.global.parameters.dividend_decay_fallback_account;
        for (id, name) in [
            (COMMITTEE_ACCOUNT, "committee-account"),
            (WITNESS_ACCOUNT, "witness-account"),
            (SON_ACCOUNT, "son-account"),
            (NETWORK_ACCOUNT, "network-account"),
            (fallback, "dividend-fallback-account"),
        ] {
            store.accounts.insert(id, Account::new(id, name));
            store.next_account = store.next_account.max(id.instance() + 1);
        }
        let core = Asset::new(AssetId::CORE, "CORE", COMMITTEE_ACCOUNT);
        store.assets.insert(AssetId::CORE, core);
        store.next_asset = 1;
        store.fba_accumulators.insert(0, FbaAccumulator::new(None));
        store
    }

    // ── Globals ──────────────────────────────────────────────────────────

    pub fn global(&self) -> &GlobalProperties {
        &self.global
    }

    pub fn dynamic(&self) -> &DynamicGlobalProperties {
        &self.dynamic
    }

    pub fn modify_global(&mut self, f: impl FnOnce(&mut GlobalProperties)) {
        f(&mut self.global);
    }

    pub fn modify_dynamic(&mut self, f: impl FnOnce(&mut DynamicGlobalProperties)) {
        f(&mut self.dynamic);
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub fn create_account(&mut self, name: impl Into<String>) -> AccountId {
        let id = AccountId::new(self.next_account);
        self.next_account += 1;
        self.accounts.insert(id, Account::new(id, name));
        self.dynamic.accounts_registered_this_interval += 1;
        id
    }

    pub fn get_account(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("account", id.instance()))
    }

    pub fn modify_account(
        &mut self,
        id: AccountId,
        f: impl FnOnce(&mut Account),
    ) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("account", id.instance()))?;
        f(account);
        Ok(())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    // ── Witnesses / committee ────────────────────────────────────────────

    pub fn create_witness(&mut self, witness_account: AccountId) -> WitnessId {
        let id = WitnessId::new(self.next_witness);
        self.next_witness += 1;
        let vote_id = self.allocate_vote_id(VoteKind::Witness);
        self.witnesses
            .insert(id, Witness::new(id, witness_account, vote_id));
        id
    }

    pub fn get_witness(&self, id: WitnessId) -> Result<&Witness, LedgerError> {
        self.witnesses
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("witness", id.instance()))
    }

    pub fn modify_witness(
        &mut self,
        id: WitnessId,
        f: impl FnOnce(&mut Witness),
    ) -> Result<(), LedgerError> {
        let witness = self
            .witnesses
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("witness", id.instance()))?;
        f(witness);
        Ok(())
    }

    pub fn witnesses(&self) -> impl Iterator<Item = &Witness> {
        self.witnesses.values()
    }

    pub fn create_committee_member(&mut self, account: AccountId) -> CommitteeMemberId {
        let id = CommitteeMemberId::new(self.next_committee_member);
        self.next_committee_member += 1;
        let vote_id = self.allocate_vote_id(VoteKind::Committee);
        self.committee_members
            .insert(id, CommitteeMember::new(id, account, vote_id));
        id
    }

    pub fn get_committee_member(
        &self,
        id: CommitteeMemberId,
    ) -> Result<&CommitteeMember, LedgerError> {
        self.committee_members
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("committee member", id.instance()))
    }

    pub fn modify_committee_member(
        &mut self,
        id: CommitteeMemberId,
        f: impl FnOnce(&mut CommitteeMember),
    ) -> Result<(), LedgerError> {
        let member = self
            .committee_members
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("committee member", id.instance()))?;
        f(member);
        Ok(())
    }

    pub fn committee_members(&self) -> impl Iterator<Item = &CommitteeMember> {
        self.committee_members.values()
    }

    // ── SONs ─────────────────────────────────────────────────────────────

    pub fn create_son(&mut self, son_account: AccountId, deposit: VestingBalanceId) -> SonId {
        let id = SonId::new(self.next_son);
        self.next_son += 1;
        let vote_id = self.allocate_vote_id(VoteKind::Son);
        self.sons.insert(id, Son::new(id, son_account, deposit, vote_id));
        self.son_statistics.insert(id, SonStatistics::new(id));
        id
    }

    pub fn get_son(&self, id: SonId) -> Result<&Son, LedgerError> {
        self.sons
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("son", id.instance()))
    }

    pub fn modify_son(&mut self, id: SonId, f: impl FnOnce(&mut Son)) -> Result<(), LedgerError> {
        let son = self
            .sons
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("son", id.instance()))?;
        f(son);
        Ok(())
    }

    pub fn sons(&self) -> impl Iterator<Item = &Son> {
        self.sons.values()
    }

    pub fn get_son_statistics(&self, id: SonId) -> Result<&SonStatistics, LedgerError> {
        self.son_statistics
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("son statistics", id.instance()))
    }

    pub fn modify_son_statistics(
        &mut self,
        id: SonId,
        f: impl FnOnce(&mut SonStatistics),
    ) -> Result<(), LedgerError> {
        let stats = self
            .son_statistics
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("son statistics", id.instance()))?;
        f(stats);
        Ok(())
    }

    pub fn create_son_wallet(&mut self, valid_from: Timestamp, sons: Vec<SonId>) -> SonWalletId {
        let id = SonWalletId::new(self.next_son_wallet);
        self.next_son_wallet += 1;
        self.son_wallets.insert(
            id,
            SonWallet {
                id,
                valid_from,
                expires: None,
                sons,
            },
        );
        id
    }

    pub fn modify_son_wallet(
        &mut self,
        id: SonWalletId,
        f: impl FnOnce(&mut SonWallet),
    ) -> Result<(), LedgerError> {
        let wallet = self
            .son_wallets
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("son wallet", id.instance()))?;
        f(wallet);
        Ok(())
    }

    pub fn son_wallets(&self) -> impl Iterator<Item = &SonWallet> {
        self.son_wallets.values()
    }

    /// The open (unexpired) wallet generation, if any.
    pub fn current_son_wallet(&self) -> Option<&SonWallet> {
        self.son_wallets.values().rev().find(|w| w.expires.is_none())
    }

    // ── Workers ──────────────────────────────────────────────────────────

    pub fn create_worker(
        &mut self,
        worker_account: AccountId,
        work_begin_date: Timestamp,
        work_end_date: Timestamp,
        daily_pay: Shares,
        payout: WorkerPayout,
    ) -> WorkerId {
        let id = WorkerId::new(self.next_worker);
        self.next_worker += 1;
        let vote_for = self.allocate_vote_id(VoteKind::Worker);
        self.workers.insert(
            id,
            Worker {
                id,
                worker_account,
                work_begin_date,
                work_end_date,
                daily_pay,
                name: String::new(),
                vote_for,
                total_votes_for: Shares::ZERO,
                payout,
            },
        );
        id
    }

    pub fn get_worker(&self, id: WorkerId) -> Result<&Worker, LedgerError> {
        self.workers
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("worker", id.instance()))
    }

    pub fn modify_worker(
        &mut self,
        id: WorkerId,
        f: impl FnOnce(&mut Worker),
    ) -> Result<(), LedgerError> {
        let worker = self
            .workers
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("worker", id.instance()))?;
        f(worker);
        Ok(())
    }

    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    // ── Assets ───────────────────────────────────────────────────────────

    pub fn create_asset(&mut self, symbol: impl Into<String>, issuer: AccountId) -> AssetId {
        let id = AssetId::new(self.next_asset);
        self.next_asset += 1;
        self.assets.insert(id, Asset::new(id, symbol, issuer));
        id
    }

    pub fn get_asset(&self, id: AssetId) -> Result<&Asset, LedgerError> {
        self.assets
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("asset", id.instance()))
    }

    pub fn modify_asset(
        &mut self,
        id: AssetId,
        f: impl FnOnce(&mut Asset),
    ) -> Result<(), LedgerError> {
        let asset = self
            .assets
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("asset", id.instance()))?;
        f(asset);
        Ok(())
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Whether `account` may hold `asset` under its white/blacklists.
    pub fn is_authorized(&self, account: AccountId, asset: AssetId) -> bool {
        self.assets
            .get(&asset)
            .map(|a| a.options.is_authorized(account))
            .unwrap_or(false)
    }

    // ── Vesting balances ─────────────────────────────────────────────────

    pub fn create_vesting_balance(
        &mut self,
        owner: AccountId,
        balance: AssetAmount,
        kind: VestingKind,
    ) -> VestingBalanceId {
        let id = VestingBalanceId::new(self.next_vesting_balance);
        self.next_vesting_balance += 1;
        self.vesting_balances
            .insert(id, VestingBalance::new(id, owner, balance, kind));
        self.vesting_by_owner.insert((owner, id), ());
        id
    }

    pub fn get_vesting_balance(&self, id: VestingBalanceId) -> Result<&VestingBalance, LedgerError> {
        self.vesting_balances
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("vesting balance", id.instance()))
    }

    pub fn modify_vesting_balance(
        &mut self,
        id: VestingBalanceId,
        f: impl FnOnce(&mut VestingBalance),
    ) -> Result<(), LedgerError> {
        let vb = self
            .vesting_balances
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("vesting balance", id.instance()))?;
        f(vb);
        Ok(())
    }

    /// All vesting balances owned by `owner`, in id order.
    pub fn vesting_balances_of(
        &self,
        owner: AccountId,
    ) -> impl Iterator<Item = &VestingBalance> + '_ {
        self.vesting_by_owner
            .range((owner, VestingBalanceId::new(0))..=(owner, VestingBalanceId::new(u64::MAX)))
            .filter_map(|((_, id), ())| self.vesting_balances.get(id))
    }

    // ── Balances ─────────────────────────────────────────────────────────

    pub fn get_balance(&self, account: AccountId, asset: AssetId) -> Shares {
        self.balances
            .get(&(account, asset))
            .copied()
            .unwrap_or(Shares::ZERO)
    }

    /// Apply a signed delta to a balance. Fails without mutating if the
    /// result would be negative.
    pub fn adjust_balance(
        &mut self,
        account: AccountId,
        asset: AssetId,
        delta: Shares,
    ) -> Result<(), LedgerError> {
        let entry = self.balances.entry((account, asset)).or_insert(Shares::ZERO);
        let updated = entry.checked_add(delta).ok_or(LedgerError::Overflow)?;
        if updated.is_negative() {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                have: entry.raw(),
                need: -delta.raw(),
            });
        }
        *entry = updated;
        Ok(())
    }

    /// All of one account's balances, in asset-id order.
    pub fn balances_of(&self, account: AccountId) -> impl Iterator<Item = (AssetId, Shares)> + '_ {
        self.balances
            .range((account, AssetId::new(0))..=(account, AssetId::new(u64::MAX)))
            .map(|((_, asset), amount)| (*asset, *amount))
    }

    /// Every account holding a nonzero balance of `asset`, in account-id
    /// order.
    pub fn holders_of(&self, asset: AssetId) -> Vec<(AccountId, Shares)> {
        self.balances
            .iter()
            .filter(|((_, a), amount)| *a == asset && !amount.is_zero())
            .map(|((account, _), amount)| (*account, *amount))
            .collect()
    }

    // ── Dividend bookkeeping ─────────────────────────────────────────────

    pub fn pending_dividend(
        &self,
        holder_asset: AssetId,
        holder: AccountId,
        payout_asset: AssetId,
    ) -> Shares {
        self.pending_dividends
            .get(&(holder_asset, holder, payout_asset))
            .copied()
            .unwrap_or(Shares::ZERO)
    }

    /// Add `delta` to a pending dividend credit, creating the record on
    /// first touch and dropping it when it reaches zero.
    pub fn adjust_pending_dividend(
        &mut self,
        holder_asset: AssetId,
        holder: AccountId,
        payout_asset: AssetId,
        delta: Shares,
    ) {
        let key = (holder_asset, holder, payout_asset);
        let entry = self.pending_dividends.entry(key).or_insert(Shares::ZERO);
        *entry = entry.saturating_add(delta).max(Shares::ZERO);
        if entry.is_zero() {
            self.pending_dividends.remove(&key);
        }
    }

    /// All pending credits for one dividend-bearing asset, grouped by holder
    /// (holder-major, payout-asset-minor order).
    pub fn pending_dividends_for(
        &self,
        holder_asset: AssetId,
    ) -> Vec<(AccountId, AssetId, Shares)> {
        self.pending_dividends
            .range(
                (holder_asset, AccountId::new(0), AssetId::new(0))
                    ..=(holder_asset, AccountId::new(u64::MAX), AssetId::new(u64::MAX)),
            )
            .map(|((_, holder, payout), amount)| (*holder, *payout, *amount))
            .collect()
    }

    pub fn distributed_total(&self, holder_asset: AssetId, payout_asset: AssetId) -> Shares {
        self.distributed_totals
            .get(&(holder_asset, payout_asset))
            .copied()
            .unwrap_or(Shares::ZERO)
    }

    pub fn set_distributed_total(
        &mut self,
        holder_asset: AssetId,
        payout_asset: AssetId,
        balance: Shares,
    ) {
        self.distributed_totals
            .insert((holder_asset, payout_asset), balance);
    }

    /// Recorded distribution-account balances for one dividend asset, in
    /// payout-asset order. One side of the dividend delta merge-walk.
    pub fn distributed_totals_for(&self, holder_asset: AssetId) -> Vec<(AssetId, Shares)> {
        self.distributed_totals
            .range((holder_asset, AssetId::new(0))..=(holder_asset, AssetId::new(u64::MAX)))
            .map(|((_, payout), amount)| (*payout, *amount))
            .collect()
    }

    // ── FBA accumulators ─────────────────────────────────────────────────

    pub fn fba_accumulators(&self) -> impl Iterator<Item = (u8, &FbaAccumulator)> {
        self.fba_accumulators.iter().map(|(id, fba)| (*id, fba))
    }

    pub fn insert_fba_accumulator(&mut self, id: u8, fba: FbaAccumulator) {
        self.fba_accumulators.insert(id, fba);
    }

    pub fn modify_fba_accumulator(
        &mut self,
        id: u8,
        f: impl FnOnce(&mut FbaAccumulator),
    ) -> Result<(), LedgerError> {
        let fba = self
            .fba_accumulators
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("fba accumulator", u64::from(id)))?;
        f(fba);
        Ok(())
    }

    // ── Budget records ───────────────────────────────────────────────────

    pub fn append_budget_record(&mut self, mut record: BudgetRecord) -> BudgetRecordId {
        let id = BudgetRecordId::new(self.next_budget_record);
        self.next_budget_record += 1;
        record.id = id;
        self.budget_records.insert(id, record);
        id
    }

    pub fn budget_records(&self) -> impl Iterator<Item = &BudgetRecord> {
        self.budget_records.values()
    }

    // ── Limit orders ─────────────────────────────────────────────────────

    /// Place an order selling `for_sale` for `receive_asset`, matching
    /// immediately against resting orders at their offered ratios. The
    /// unfilled remainder rests on the book under the returned order id.
    pub fn place_limit_order(
        &mut self,
        seller: AccountId,
        for_sale: AssetAmount,
        receive_asset: AssetId,
    ) -> Result<PlacedOrder, LedgerError> {
        if !self.is_authorized(seller, receive_asset) {
            return Err(LedgerError::UnauthorizedAsset {
                account: seller,
                asset: receive_asset,
            });
        }
        self.adjust_balance(seller, for_sale.asset, -for_sale.amount)?;

        let mut remaining = for_sale.amount;
        let mut received = Shares::ZERO;
        let maker_ids: Vec<u64> = self
            .limit_orders
            .iter()
            .filter(|(_, o)| o.for_sale.asset == receive_asset && o.receive.asset == for_sale.asset)
            .map(|(id, _)| *id)
            .collect();

        for maker_id in maker_ids {
            if remaining.is_zero() {
                break;
            }
            let Some(maker) = self.limit_orders.get(&maker_id).cloned() else {
                continue;
            };
            // How much of our sale the maker can absorb, and what it gives
            // back at its offered ratio.
            let take = remaining.min(maker.receive.amount);
            if take.is_zero() {
                continue;
            }
            let give = estuary_utils::mul_div_floor(
                take.to_u128(),
                maker.for_sale.amount.to_u128(),
                maker.receive.amount.to_u128(),
            );
            let give = Shares::try_from_u128(give).ok_or(LedgerError::Overflow)?;

            self.adjust_balance(maker.seller, for_sale.asset, take)?;
            remaining = remaining.saturating_sub(take);
            received = received.saturating_add(give);

            let mut exhausted = false;
            if let Some(maker_entry) = self.limit_orders.get_mut(&maker_id) {
                maker_entry.for_sale.amount = maker_entry.for_sale.amount.saturating_sub(give);
                maker_entry.receive.amount = maker_entry.receive.amount.saturating_sub(take);
                exhausted =
                    maker_entry.for_sale.amount.is_zero() || maker_entry.receive.amount.is_zero();
            }
            if exhausted {
                self.limit_orders.remove(&maker_id);
            }
        }

        if !received.is_zero() {
            self.adjust_balance(seller, receive_asset, received)?;
        }

        let order_id = if remaining.is_zero() {
            None
        } else {
            let id = self.next_order;
            self.next_order += 1;
            self.limit_orders.insert(
                id,
                LimitOrder {
                    id,
                    seller,
                    for_sale: AssetAmount::new(remaining, for_sale.asset),
                    // Ask at par against the original ratio; the probe order
                    // is canceled right away, so the ask never matters.
                    receive: AssetAmount::new(remaining, receive_asset),
                },
            );
            Some(id)
        };

        Ok(PlacedOrder {
            order_id,
            sold: for_sale.amount.saturating_sub(remaining),
            received,
        })
    }

    /// Cancel a resting order and refund the unsold remainder.
    pub fn cancel_limit_order(&mut self, order_id: u64) -> Result<(), LedgerError> {
        let order = self
            .limit_orders
            .remove(&order_id)
            .ok_or_else(|| LedgerError::not_found("limit order", order_id))?;
        self.adjust_balance(order.seller, order.for_sale.asset, order.for_sale.amount)
    }

    /// Seed a resting order directly (test scaffolding for market probes).
    pub fn seed_limit_order(
        &mut self,
        seller: AccountId,
        for_sale: AssetAmount,
        receive: AssetAmount,
    ) -> Result<u64, LedgerError> {
        self.adjust_balance(seller, for_sale.asset, -for_sale.amount)?;
        let id = self.next_order;
        self.next_order += 1;
        self.limit_orders.insert(
            id,
            LimitOrder {
                id,
                seller,
                for_sale,
                receive,
            },
        );
        Ok(id)
    }

    pub fn limit_orders(&self) -> impl Iterator<Item = &LimitOrder> {
        self.limit_orders.values()
    }

    // ── Virtual operations ───────────────────────────────────────────────

    pub fn push_virtual_op(&mut self, op: VirtualOperation) {
        self.history.push(op);
    }

    pub fn history(&self) -> &[VirtualOperation] {
        &self.history
    }

    // ── Vote registry ────────────────────────────────────────────────────

    fn allocate_vote_id(&mut self, kind: VoteKind) -> VoteId {
        let id = VoteId::new(kind, self.next_vote_instance);
        self.next_vote_instance += 1;
        id
    }

    /// One past the highest vote instance ever allocated; the tally buffer
    /// is sized by this.
    pub fn next_available_vote_instance(&self) -> u32 {
        self.next_vote_instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estuary_types::ChainParameters;

    fn store() -> LedgerStore {
        LedgerStore::new(ChainParameters::mainnet_defaults())
    }

    #[test]
    fn adjust_balance_rejects_overdraft() {
        let mut s = store();
        let alice = s.create_account("alice");
        s.adjust_balance(alice, AssetId::CORE, Shares::new(100)).unwrap();
        let err = s
            .adjust_balance(alice, AssetId::CORE, Shares::new(-101))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(s.get_balance(alice, AssetId::CORE), Shares::new(100));
    }

    #[test]
    fn vote_instances_are_allocated_in_creation_order() {
        let mut s = store();
        let acct = s.create_account("acct");
        let w = s.create_witness(acct);
        let c = s.create_committee_member(acct);
        assert_eq!(s.get_witness(w).unwrap().vote_id.instance, 0);
        assert_eq!(s.get_committee_member(c).unwrap().vote_id.instance, 1);
        assert_eq!(s.next_available_vote_instance(), 2);
    }

    #[test]
    fn limit_order_matches_at_maker_ratio_and_cancel_refunds() {
        let mut s = store();
        let maker = s.create_account("maker");
        let taker = s.create_account("taker");
        let usd = s.create_asset("USD", maker);

        s.adjust_balance(maker, usd, Shares::new(300)).unwrap();
        s.adjust_balance(taker, AssetId::CORE, Shares::new(500)).unwrap();

        // Maker gives 300 USD for 200 CORE (1.5 USD per CORE).
        s.seed_limit_order(
            maker,
            AssetAmount::new(Shares::new(300), usd),
            AssetAmount::core(Shares::new(200)),
        )
        .unwrap();

        let placed = s
            .place_limit_order(taker, AssetAmount::core(Shares::new(500)), usd)
            .unwrap();
        assert_eq!(placed.sold, Shares::new(200));
        assert_eq!(placed.received, Shares::new(300));
        assert!(placed.order_id.is_some());

        // Taker got the USD; 300 CORE still escrowed in the resting rest.
        assert_eq!(s.get_balance(taker, usd), Shares::new(300));
        assert_eq!(s.get_balance(taker, AssetId::CORE), Shares::ZERO);

        s.cancel_limit_order(placed.order_id.unwrap()).unwrap();
        assert_eq!(s.get_balance(taker, AssetId::CORE), Shares::new(300));
    }

    #[test]
    fn pending_dividends_group_by_holder() {
        let mut s = store();
        let a = s.create_account("a");
        let b = s.create_account("b");
        let holder_asset = s.create_asset("DIV", a);
        let payout1 = s.create_asset("P1", a);
        let payout2 = s.create_asset("P2", a);

        s.adjust_pending_dividend(holder_asset, b, payout2, Shares::new(5));
        s.adjust_pending_dividend(holder_asset, a, payout1, Shares::new(3));
        s.adjust_pending_dividend(holder_asset, a, payout2, Shares::new(4));

        let pending = s.pending_dividends_for(holder_asset);
        assert_eq!(
            pending,
            vec![
                (a, payout1, Shares::new(3)),
                (a, payout2, Shares::new(4)),
                (b, payout2, Shares::new(5)),
            ]
        );
    }
}
