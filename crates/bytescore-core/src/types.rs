//! Core data types: raw signals, score results, and ledger records.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawSignals
// ---------------------------------------------------------------------------

/// Immutable snapshot of the raw activity signals fetched for one account.
///
/// Serialized as the `metrics` object of a [`ScoreResult`], with the
/// transport field names used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSignals {
    /// Days since the account's earliest recorded activity.
    #[serde(rename = "walletAgeDays")]
    pub wallet_age_days: u64,
    /// Transactions observed in the recent window.
    #[serde(rename = "transactionCount")]
    pub tx_count: u64,
    /// Summed value-transfer magnitude, native units.
    #[serde(rename = "volumeSOL")]
    pub volume: f64,
    #[serde(rename = "uniqueTokens")]
    pub unique_token_types: u64,
    #[serde(rename = "contractInteractions")]
    pub contract_interactions: u64,
    /// Repaid / due across platform obligations, in `[0, 1]`.
    #[serde(rename = "repaymentRatio")]
    pub repayment_ratio: f64,
    /// Failed / total transactions in the inspected window, in `[0, 1]`.
    #[serde(rename = "failedTransactionRatio")]
    pub failed_tx_ratio: f64,
    /// Days since the most recent transaction.
    #[serde(rename = "inactiveDays")]
    pub inactive_days: u64,
}

impl RawSignals {
    /// All-zero snapshot with the given repayment ratio.
    pub fn zeroed(repayment_ratio: f64) -> Self {
        Self {
            wallet_age_days: 0,
            tx_count: 0,
            volume: 0.0,
            unique_token_types: 0,
            contract_interactions: 0,
            repayment_ratio,
            failed_tx_ratio: 0.0,
            inactive_days: 0,
        }
    }

    /// Returns `true` if none of the positive ledger signals saw activity.
    pub fn has_no_activity(&self) -> bool {
        self.wallet_age_days == 0
            && self.tx_count == 0
            && self.volume == 0.0
            && self.unique_token_types == 0
            && self.contract_interactions == 0
    }

    /// Returns `true` if the account shows no ledger activity and `repayment`
    /// holds no platform history, i.e. nothing distinguishes it from a
    /// brand-new account. Red-flag inputs are not consulted.
    pub fn is_dormant(&self, repayment: RepaymentEvidence) -> bool {
        self.has_no_activity() && !repayment.is_observed()
    }

    /// Check the ranges the composer relies on.
    ///
    /// Returns a description of the first violated bound.
    pub fn check_bounds(&self) -> Result<(), String> {
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("volume out of range: {}", self.volume));
        }
        if !(0.0..=1.0).contains(&self.repayment_ratio) {
            return Err(format!("repayment ratio out of range: {}", self.repayment_ratio));
        }
        if !(0.0..=1.0).contains(&self.failed_tx_ratio) {
            return Err(format!("failed tx ratio out of range: {}", self.failed_tx_ratio));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RepaymentEvidence
// ---------------------------------------------------------------------------

/// What the platform history says about an account's repayments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RepaymentEvidence {
    /// Obligations with something due were found; repaid / due in `[0, 1]`.
    Observed(f64),
    /// No obligations, or the history could not be read.
    #[default]
    Absent,
}

impl RepaymentEvidence {
    /// The observed ratio, or `neutral` when there is none.
    pub fn ratio_or(self, neutral: f64) -> f64 {
        match self {
            Self::Observed(ratio) => ratio,
            Self::Absent => neutral,
        }
    }

    pub fn is_observed(self) -> bool {
        matches!(self, Self::Observed(_))
    }
}

// ---------------------------------------------------------------------------
// ScoreBreakdown / ScoreResult
// ---------------------------------------------------------------------------

/// Per-signal point contributions, each rounded independently.
///
/// Because every field is rounded on its own, the positive entries minus
/// `red_flags` may differ from [`ScoreResult::score`] by a point or two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub wallet_age: u8,
    pub transaction_frequency: u8,
    pub volume: u8,
    pub diversity: u8,
    pub contract_usage: u8,
    pub repayment_history: u8,
    /// Subtracted penalty, at most 20.
    pub red_flags: u8,
}

impl ScoreBreakdown {
    /// Sum of the positive contributions.
    pub fn positive_total(&self) -> u32 {
        [
            self.wallet_age,
            self.transaction_frequency,
            self.volume,
            self.diversity,
            self.contract_usage,
            self.repayment_history,
        ]
        .iter()
        .map(|&v| u32::from(v))
        .sum()
    }
}

/// Final reputation score with its auditable breakdown and inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Overall score, `0..=100`.
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    pub metrics: RawSignals,
}

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

/// Parameters for a signature-history query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureQuery {
    /// Maximum number of signatures to return.
    pub limit: usize,
    /// Only return signatures older than this one.
    pub before: Option<String>,
}

impl SignatureQuery {
    /// Newest `limit` signatures.
    pub fn latest(limit: usize) -> Self {
        Self { limit, before: None }
    }

    /// Up to `limit` signatures older than `before`.
    pub fn before(limit: usize, before: impl Into<String>) -> Self {
        Self {
            limit,
            before: Some(before.into()),
        }
    }
}

/// One entry of an account's signature history (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Unix seconds, if the ledger recorded one.
    pub block_time: Option<i64>,
    /// Whether the transaction failed.
    pub failed: bool,
}

/// The parts of a confirmed transaction that scoring reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub block_time: Option<i64>,
    /// All account keys, static keys first then loaded addresses.
    pub account_keys: Vec<String>,
    /// Lamport balances before execution, indexed like `account_keys`.
    pub pre_balances: Vec<u64>,
    /// Lamport balances after execution, indexed like `account_keys`.
    pub post_balances: Vec<u64>,
    /// Program ids invoked by top-level instructions.
    pub program_ids: Vec<String>,
    pub failed: bool,
}

impl TransactionDetail {
    /// Absolute lamport delta for `account`, or `None` if the account is not
    /// part of this transaction or balances are missing.
    pub fn balance_delta(&self, account: &str) -> Option<u64> {
        let index = self.account_keys.iter().position(|k| k == account)?;
        let pre = *self.pre_balances.get(index)?;
        let post = *self.post_balances.get(index)?;
        Some(pre.abs_diff(post))
    }
}

/// One platform-tracked obligation of a fund-seeking account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    /// Bond account the obligation belongs to.
    pub bond: String,
    /// Principal plus interest owed, in lamports.
    pub due_lamports: u64,
    /// Amount repaid so far, in lamports.
    pub repaid_lamports: u64,
}
