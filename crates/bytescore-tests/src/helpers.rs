//! Shared fixtures: in-memory ledger and history, a fixed clock, and
//! known-valid account ids.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytescore_core::account::AccountId;
use bytescore_core::config::ScoringConfig;
use bytescore_core::constants::{LAMPORTS_PER_SOL, SECS_PER_DAY, SYSTEM_PROGRAM_ID};
use bytescore_core::error::{HistoryError, LedgerError};
use bytescore_core::traits::{LedgerReader, PlatformHistory};
use bytescore_core::types::{Obligation, SignatureInfo, SignatureQuery, TransactionDetail};
use bytescore_engine::ScoringEngine;

/// Fixed "now" for every fixture, unix seconds.
pub const NOW: i64 = 1_750_000_000;

/// Valid on-curve account ids.
pub const ALICE: &str = "6x5SYnLroiN7WYq8NQYU9KHcH4YjpBbwpUfVu3EB7ieH";
pub const BOB: &str = "FrSHWUWT9QBZHsC5fSxen1GXZWMCAZKf4qQNH6wazgRW";
pub const CAROL: &str = "DEhxhVkbxZMBesMycuwwyk9Yefx6XxNfDHaPXpDaHt3z";

/// A well-formed key that is off the curve (a program-derived address).
pub const OFF_CURVE: &str = "5rnJ7EdhDZQT4bcJKYdbeUVn94SzU5q8UNit5SSSogN8";

pub fn fixed_clock() -> i64 {
    NOW
}

/// Unix time `days` days before [`NOW`].
pub fn days_ago(days: i64) -> i64 {
    NOW - days * SECS_PER_DAY
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// Activity history of a single account.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    owner: String,
    /// Newest first.
    signatures: Vec<SignatureInfo>,
    transactions: HashMap<String, TransactionDetail>,
    mints: Vec<String>,
    unreachable: bool,
}

impl MemoryLedger {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            ..Self::default()
        }
    }

    /// A ledger whose every query fails.
    pub fn unreachable(owner: &str) -> Self {
        Self {
            unreachable: true,
            ..Self::new(owner)
        }
    }

    /// Add one transaction `days` days old moving `lamports` out of the
    /// owner's account through `programs` (plus the system program).
    pub fn record(mut self, days: i64, failed: bool, lamports: u64, programs: &[&str]) -> Self {
        let signature = format!("sig-{}", self.signatures.len());
        let block_time = days_ago(days);

        let mut program_ids = vec![SYSTEM_PROGRAM_ID.to_string()];
        program_ids.extend(programs.iter().map(|p| p.to_string()));
        let start = 1_000 * LAMPORTS_PER_SOL;
        self.transactions.insert(
            signature.clone(),
            TransactionDetail {
                block_time: Some(block_time),
                account_keys: vec![self.owner.clone(), "counterparty".into()],
                pre_balances: vec![start, 0],
                post_balances: vec![start.saturating_sub(lamports), lamports],
                program_ids,
                failed,
            },
        );
        self.signatures.push(SignatureInfo {
            signature,
            slot: u64::try_from(block_time).unwrap_or(0),
            block_time: Some(block_time),
            failed,
        });
        self.signatures
            .sort_by(|a, b| b.block_time.cmp(&a.block_time).then(b.slot.cmp(&a.slot)));
        self
    }

    /// Add `count` plain transfers, one per day starting `newest` days ago.
    pub fn daily(mut self, count: usize, newest: i64, lamports: u64) -> Self {
        for i in 0..count {
            self = self.record(newest + i as i64, false, lamports, &[]);
        }
        self
    }

    /// Token accounts held, by mint.
    pub fn holding(mut self, mints: &[&str]) -> Self {
        self.mints = mints.iter().map(|m| m.to_string()).collect();
        self
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.unreachable {
            Err(LedgerError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn signatures(
        &self,
        account: &AccountId,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        self.check()?;
        if account.as_str() != self.owner {
            return Ok(vec![]);
        }
        let start = match &query.before {
            Some(before) => match self.signatures.iter().position(|s| &s.signature == before) {
                Some(i) => i + 1,
                None => return Ok(vec![]),
            },
            None => 0,
        };
        Ok(self
            .signatures
            .iter()
            .skip(start)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn transaction(&self, signature: &str) -> Result<Option<TransactionDetail>, LedgerError> {
        self.check()?;
        Ok(self.transactions.get(signature).cloned())
    }

    async fn token_mints(&self, account: &AccountId) -> Result<Vec<String>, LedgerError> {
        self.check()?;
        if account.as_str() != self.owner {
            return Ok(vec![]);
        }
        Ok(self.mints.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryHistory
// ---------------------------------------------------------------------------

/// Fixed set of obligations, or a permanently failing source.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    obligations: Vec<Obligation>,
    broken: bool,
}

impl MemoryHistory {
    /// No platform history at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Add one obligation of `due` lamports with `repaid` paid back.
    pub fn with(mut self, due: u64, repaid: u64) -> Self {
        self.obligations.push(Obligation {
            bond: format!("bond-{}", self.obligations.len()),
            due_lamports: due,
            repaid_lamports: repaid,
        });
        self
    }
}

#[async_trait]
impl PlatformHistory for MemoryHistory {
    async fn obligations(&self, _account: &AccountId) -> Result<Vec<Obligation>, HistoryError> {
        if self.broken {
            return Err(HistoryError::Decode("account data truncated".into()));
        }
        Ok(self.obligations.clone())
    }
}

/// Engine over the given fixtures with default configuration and the fixed
/// clock.
pub fn engine(ledger: MemoryLedger, history: MemoryHistory) -> ScoringEngine {
    engine_with(ledger, history, ScoringConfig::new())
}

pub fn engine_with(ledger: MemoryLedger, history: MemoryHistory, config: ScoringConfig) -> ScoringEngine {
    match ScoringEngine::new(Arc::new(ledger), Arc::new(history), config) {
        Ok(engine) => engine.with_clock(fixed_clock),
        Err(e) => panic!("fixture config rejected: {e}"),
    }
}
