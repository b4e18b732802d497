//! Estuary ledger objects and the in-memory object store.
//!
//! Object definitions mirror what the rest of the node persists: accounts
//! and their voting state, elected-role candidates (witnesses, committee
//! members, SONs), workers, assets with dividend and buyback configuration,
//! vesting balances, budget records, and the two global-properties
//! singletons. [`store::LedgerStore`] provides the transactional
//! create / modify / remove / indexed-lookup primitives the maintenance
//! engine runs against; all collections iterate in id order so every pass is
//! deterministic across nodes.

pub mod account;
pub mod asset;
pub mod authority;
pub mod budget;
pub mod committee;
pub mod error;
pub mod events;
pub mod global;
pub mod ops;
pub mod son;
pub mod store;
pub mod vesting;
pub mod witness;
pub mod worker;

pub use account::{Account, AccountStatistics};
pub use asset::{
    Asset, AssetAmount, AssetDividendData, AssetDynamicData, AssetOptions, DividendOptions,
    FbaAccumulator, Price,
};
pub use authority::Authority;
pub use budget::BudgetRecord;
pub use committee::CommitteeMember;
pub use error::LedgerError;
pub use events::EventBus;
pub use global::{
    DynamicGlobalProperties, GlobalProperties, COMMITTEE_ACCOUNT, NETWORK_ACCOUNT, SON_ACCOUNT,
    WITNESS_ACCOUNT,
};
pub use ops::VirtualOperation;
pub use son::{Sidechain, Son, SonStatistics, SonStatus, SonWallet};
pub use store::{LedgerStore, LimitOrder, PlacedOrder};
pub use vesting::{VestingBalance, VestingKind, VestingPolicy};
pub use witness::Witness;
pub use worker::{Worker, WorkerPayout};
