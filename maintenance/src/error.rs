use estuary_ledger::LedgerError;
use estuary_types::{AssetId, Shares};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaintenanceError {
    /// A consensus invariant failed. Never caught locally — any discrepancy
    /// here is a potential chain fork and must abort block application.
    #[error("consensus invariant violated: {0}")]
    InvariantViolation(String),

    /// A dividend distribution whose delta does not cover the configured
    /// minimum. Recoverable; the asset is skipped for this interval.
    #[error("dividend delta {delta} in asset {payout_asset} below distribution minimum {minimum}")]
    BelowDistributionMinimum {
        payout_asset: AssetId,
        delta: Shares,
        minimum: Shares,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MaintenanceError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
