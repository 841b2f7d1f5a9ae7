//! Trait interfaces between the scoring engine and its data sources.
//!
//! - [`LedgerReader`]: read-only account activity (bytescore-rpc implements)
//! - [`PlatformHistory`]: lending-platform obligations (bytescore-rpc implements)
//!
//! Implementations report failures through their error types; the engine
//! decides what default each failed fetch contributes.

use async_trait::async_trait;

use crate::account::AccountId;
use crate::error::{HistoryError, LedgerError};
use crate::types::{Obligation, SignatureInfo, SignatureQuery, TransactionDetail};

/// Read-only view of an account's on-ledger activity.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Signature history for `account`, newest first.
    async fn signatures(
        &self,
        account: &AccountId,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;

    /// Confirmed transaction by signature. `None` if the ledger no longer
    /// has it.
    async fn transaction(&self, signature: &str) -> Result<Option<TransactionDetail>, LedgerError>;

    /// Mints of every token account owned by `account`, duplicates included.
    async fn token_mints(&self, account: &AccountId) -> Result<Vec<String>, LedgerError>;
}

/// Source of repayment history for fund-seeking accounts.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PlatformHistory: Send + Sync {
    /// Every obligation recorded for `account`. Empty if it never raised funds.
    async fn obligations(&self, account: &AccountId) -> Result<Vec<Obligation>, HistoryError>;
}
