//! ByteBonds program accounts and the [`PlatformHistory`] built on them.
//!
//! Only the fixed-size prefix of each account is read:
//!
//! ```text
//! Bond       disc[8] freelancer[32] amount u64 duration u8 interest_rate u8 funded u64 status u8
//! Repayment  disc[8] bond[32] investor[32] amount u64 due_date i64 status u8
//! ```
//!
//! Integers are little-endian. The discriminator is the first eight bytes of
//! `sha256("account:<Name>")`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytescore_core::account::AccountId;
use bytescore_core::error::HistoryError;
use bytescore_core::traits::PlatformHistory;
use bytescore_core::types::Obligation;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::RpcClient;

pub const DISCRIMINATOR_LEN: usize = 8;
pub const BOND_PREFIX_LEN: usize = 59;
pub const REPAYMENT_PREFIX_LEN: usize = 89;

const BOND_FREELANCER_OFFSET: usize = 8;
const REPAYMENT_BOND_OFFSET: usize = 8;

/// Anchor account discriminator for `name`.
pub fn discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("account:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStatus {
    Open,
    Funded,
    Repaying,
    Completed,
}

impl BondStatus {
    fn from_tag(tag: u8) -> Result<Self, HistoryError> {
        match tag {
            0 => Ok(Self::Open),
            1 => Ok(Self::Funded),
            2 => Ok(Self::Repaying),
            3 => Ok(Self::Completed),
            other => Err(HistoryError::Decode(format!("unknown bond status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl RepaymentStatus {
    fn from_tag(tag: u8) -> Result<Self, HistoryError> {
        match tag {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Paid),
            2 => Ok(Self::Overdue),
            other => Err(HistoryError::Decode(format!("unknown repayment status {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondRecord {
    pub address: String,
    pub freelancer: [u8; 32],
    /// Principal, lamports.
    pub amount: u64,
    pub duration: u8,
    /// Percent of principal.
    pub interest_rate: u8,
    pub funded: u64,
    pub status: BondStatus,
}

impl BondRecord {
    /// Principal plus interest, computed as the program does.
    pub fn total_due(&self) -> u64 {
        let amount = u128::from(self.amount);
        let due = amount + amount * u128::from(self.interest_rate) / 100;
        u64::try_from(due).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentRecord {
    pub address: String,
    /// Base58 bond address.
    pub bond: String,
    pub investor: [u8; 32],
    pub amount: u64,
    pub due_date: i64,
    pub status: RepaymentStatus,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn check_header(data: &[u8], name: &str, len: usize) -> Result<(), HistoryError> {
    if data.len() < len {
        return Err(HistoryError::Decode(format!(
            "{name} account too short: {} bytes, need {len}",
            data.len()
        )));
    }
    if data[..DISCRIMINATOR_LEN] != discriminator(name) {
        return Err(HistoryError::Decode(format!("not a {name} account")));
    }
    Ok(())
}

fn key_at(data: &[u8], offset: usize) -> [u8; 32] {
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[offset..offset + 32]);
    key
}

fn u64_at(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn i64_at(data: &[u8], offset: usize) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    i64::from_le_bytes(buf)
}

/// Decode the prefix of a `Bond` account.
pub fn decode_bond(address: &str, data: &[u8]) -> Result<BondRecord, HistoryError> {
    check_header(data, "Bond", BOND_PREFIX_LEN)?;
    Ok(BondRecord {
        address: address.to_owned(),
        freelancer: key_at(data, 8),
        amount: u64_at(data, 40),
        duration: data[48],
        interest_rate: data[49],
        funded: u64_at(data, 50),
        status: BondStatus::from_tag(data[58])?,
    })
}

/// Decode the prefix of a `Repayment` account.
pub fn decode_repayment(address: &str, data: &[u8]) -> Result<RepaymentRecord, HistoryError> {
    check_header(data, "Repayment", REPAYMENT_PREFIX_LEN)?;
    Ok(RepaymentRecord {
        address: address.to_owned(),
        bond: bs58::encode(&data[8..40]).into_string(),
        investor: key_at(data, 40),
        amount: u64_at(data, 72),
        due_date: i64_at(data, 80),
        status: RepaymentStatus::from_tag(data[88])?,
    })
}

/// Derive obligations from a freelancer's bonds and their repayments.
///
/// Open bonds owe nothing yet. Completed bonds count as fully repaid; other
/// bonds are repaid by the sum of their paid repayment entries.
pub fn obligations_from(bonds: &[BondRecord], repayments: &[RepaymentRecord]) -> Vec<Obligation> {
    let mut paid: HashMap<&str, u64> = HashMap::new();
    for r in repayments.iter().filter(|r| r.status == RepaymentStatus::Paid) {
        let entry = paid.entry(r.bond.as_str()).or_default();
        *entry = entry.saturating_add(r.amount);
    }

    bonds
        .iter()
        .filter(|b| b.status != BondStatus::Open)
        .map(|b| {
            let due = b.total_due();
            let repaid = match b.status {
                BondStatus::Completed => due,
                _ => paid.get(b.address.as_str()).copied().unwrap_or(0),
            };
            Obligation {
                bond: b.address.clone(),
                due_lamports: due,
                repaid_lamports: repaid,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ProgramHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: EncodedAccount,
}

#[derive(Debug, Deserialize)]
struct EncodedAccount {
    /// `[data, encoding]`.
    data: (String, String),
}

/// `getProgramAccounts` parameters selecting one account type whose
/// 32-byte field at `offset` equals `key`.
pub fn program_accounts_params(program_id: &str, name: &str, offset: usize, key: &str, prefix_len: usize) -> Value {
    json!([
        program_id,
        {
            "encoding": "base58",
            "commitment": "confirmed",
            "dataSlice": { "offset": 0, "length": prefix_len },
            "filters": [
                { "memcmp": { "offset": 0, "bytes": bs58::encode(discriminator(name)).into_string() } },
                { "memcmp": { "offset": offset, "bytes": key } }
            ]
        }
    ])
}

/// Decode a `getProgramAccounts` result into `(address, bytes)` pairs.
pub fn parse_program_accounts(result: Value) -> Result<Vec<(String, Vec<u8>)>, HistoryError> {
    let accounts: Vec<KeyedAccount> =
        serde_json::from_value(result).map_err(|e| HistoryError::Decode(e.to_string()))?;
    accounts
        .into_iter()
        .map(|a| {
            let (data, encoding) = a.account.data;
            if encoding != "base58" {
                return Err(HistoryError::Decode(format!("unexpected encoding {encoding}")));
            }
            let bytes = bs58::decode(&data)
                .into_vec()
                .map_err(|e| HistoryError::Decode(e.to_string()))?;
            Ok((a.pubkey, bytes))
        })
        .collect()
}

/// Repayment history read from the ByteBonds program's accounts.
pub struct ProgramHistory {
    client: Arc<RpcClient>,
    program_id: String,
}

impl ProgramHistory {
    pub fn new(client: Arc<RpcClient>, program_id: impl Into<String>) -> Self {
        Self {
            client,
            program_id: program_id.into(),
        }
    }

    async fn fetch(
        &self,
        name: &str,
        offset: usize,
        key: &str,
        prefix_len: usize,
    ) -> Result<Vec<(String, Vec<u8>)>, HistoryError> {
        let params = program_accounts_params(&self.program_id, name, offset, key, prefix_len);
        let result: Value = self.client.call("getProgramAccounts", params).await?;
        parse_program_accounts(result)
    }

    async fn bonds_of(&self, account: &AccountId) -> Result<Vec<BondRecord>, HistoryError> {
        self.fetch("Bond", BOND_FREELANCER_OFFSET, account.as_str(), BOND_PREFIX_LEN)
            .await?
            .into_iter()
            .map(|(address, data)| decode_bond(&address, &data))
            .collect()
    }

    async fn repayments_of(&self, bond: &str) -> Result<Vec<RepaymentRecord>, HistoryError> {
        self.fetch("Repayment", REPAYMENT_BOND_OFFSET, bond, REPAYMENT_PREFIX_LEN)
            .await?
            .into_iter()
            .map(|(address, data)| decode_repayment(&address, &data))
            .collect()
    }
}

#[async_trait]
impl PlatformHistory for ProgramHistory {
    async fn obligations(&self, account: &AccountId) -> Result<Vec<Obligation>, HistoryError> {
        let bonds = self.bonds_of(account).await?;

        // Only bonds still being repaid need their repayment entries.
        let in_progress = bonds
            .iter()
            .filter(|b| matches!(b.status, BondStatus::Funded | BondStatus::Repaying));
        let repayments: Vec<RepaymentRecord> = try_join_all(in_progress.map(|b| self.repayments_of(&b.address)))
            .await?
            .into_iter()
            .flatten()
            .collect();

        debug!(%account, bonds = bonds.len(), repayments = repayments.len(), "history: bytebonds accounts loaded");
        Ok(obligations_from(&bonds, &repayments))
    }
}
