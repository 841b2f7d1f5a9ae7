//! [`LedgerReader`] over a Solana-compatible JSON-RPC endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use bytescore_core::account::AccountId;
use bytescore_core::constants::{TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};
use bytescore_core::error::LedgerError;
use bytescore_core::traits::LedgerReader;
use bytescore_core::types::{SignatureInfo, SignatureQuery, TransactionDetail};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::RpcClient;

/// Largest page `getSignaturesForAddress` accepts.
pub const MAX_SIGNATURE_PAGE: usize = 1000;

const COMMITMENT: &str = "confirmed";

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignature {
    signature: String,
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    meta: Option<RpcMeta>,
    transaction: RpcTxBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMeta {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    pre_balances: Vec<u64>,
    #[serde(default)]
    post_balances: Vec<u64>,
    #[serde(default)]
    loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Debug, Default, Deserialize)]
struct LoadedAddresses {
    #[serde(default)]
    writable: Vec<String>,
    #[serde(default)]
    readonly: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RpcTxBody {
    message: RpcMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMessage {
    account_keys: Vec<String>,
    #[serde(default)]
    instructions: Vec<RpcInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcInstruction {
    program_id_index: usize,
}

#[derive(Debug, Deserialize)]
struct TokenAccounts {
    value: Vec<TokenAccount>,
}

#[derive(Debug, Deserialize)]
struct TokenAccount {
    account: Value,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a `getSignaturesForAddress` result.
pub fn parse_signatures(result: Value) -> Result<Vec<SignatureInfo>, LedgerError> {
    let raw: Vec<RpcSignature> =
        serde_json::from_value(result).map_err(|e| LedgerError::Malformed(e.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|s| SignatureInfo {
            signature: s.signature,
            slot: s.slot,
            block_time: s.block_time,
            failed: s.err.is_some_and(|e| !e.is_null()),
        })
        .collect())
}

/// Parse a `getTransaction` result in `json` encoding.
///
/// Account keys are the static keys followed by loaded writable and readonly
/// addresses, the order instruction indices refer to.
pub fn parse_transaction(result: Value) -> Result<Option<TransactionDetail>, LedgerError> {
    if result.is_null() {
        return Ok(None);
    }
    let tx: RpcTransaction =
        serde_json::from_value(result).map_err(|e| LedgerError::Malformed(e.to_string()))?;

    let mut account_keys = tx.transaction.message.account_keys;
    let (pre_balances, post_balances, failed) = match tx.meta {
        Some(meta) => {
            let loaded = meta.loaded_addresses.unwrap_or_default();
            account_keys.extend(loaded.writable);
            account_keys.extend(loaded.readonly);
            let failed = meta.err.is_some_and(|e| !e.is_null());
            (meta.pre_balances, meta.post_balances, failed)
        }
        None => (Vec::new(), Vec::new(), false),
    };

    let mut program_ids = Vec::new();
    for ix in &tx.transaction.message.instructions {
        let key = account_keys.get(ix.program_id_index).ok_or_else(|| {
            LedgerError::Malformed(format!("program index {} out of range", ix.program_id_index))
        })?;
        program_ids.push(key.clone());
    }

    Ok(Some(TransactionDetail {
        block_time: tx.block_time,
        account_keys,
        pre_balances,
        post_balances,
        program_ids,
        failed,
    }))
}

/// Parse a `getTokenAccountsByOwner` result in `jsonParsed` encoding into
/// its mint addresses.
pub fn parse_token_mints(result: Value) -> Result<Vec<String>, LedgerError> {
    let accounts: TokenAccounts =
        serde_json::from_value(result).map_err(|e| LedgerError::Malformed(e.to_string()))?;
    accounts
        .value
        .iter()
        .map(|a| {
            a.account
                .pointer("/data/parsed/info/mint")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| LedgerError::Malformed("token account without mint".into()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RpcLedger
// ---------------------------------------------------------------------------

/// Reads account activity through JSON-RPC.
pub struct RpcLedger {
    client: Arc<RpcClient>,
}

impl RpcLedger {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    async fn mints_for_program(&self, owner: &AccountId, program: &str) -> Result<Vec<String>, LedgerError> {
        let result: Value = self
            .client
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.as_str(),
                    { "programId": program },
                    { "encoding": "jsonParsed", "commitment": COMMITMENT }
                ]),
            )
            .await?;
        parse_token_mints(result)
    }
}

/// Request options for one signature page.
pub fn signature_options(query: &SignatureQuery) -> Value {
    let mut opts = json!({
        "limit": query.limit.min(MAX_SIGNATURE_PAGE),
        "commitment": COMMITMENT,
    });
    if let Some(before) = &query.before {
        opts["before"] = json!(before);
    }
    opts
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn signatures(
        &self,
        account: &AccountId,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let result: Value = self
            .client
            .call(
                "getSignaturesForAddress",
                json!([account.as_str(), signature_options(&query)]),
            )
            .await?;
        parse_signatures(result)
    }

    async fn transaction(&self, signature: &str) -> Result<Option<TransactionDetail>, LedgerError> {
        let result: Value = self
            .client
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "json",
                        "commitment": COMMITMENT,
                        "maxSupportedTransactionVersion": 0
                    }
                ]),
            )
            .await?;
        parse_transaction(result)
    }

    async fn token_mints(&self, account: &AccountId) -> Result<Vec<String>, LedgerError> {
        let (legacy, extended) = futures::try_join!(
            self.mints_for_program(account, TOKEN_PROGRAM_ID),
            self.mints_for_program(account, TOKEN_2022_PROGRAM_ID),
        )?;
        Ok(legacy.into_iter().chain(extended).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_mark_failures() {
        let result = json!([
            {"signature": "s1", "slot": 12, "err": null, "blockTime": 1_700_000_000, "confirmationStatus": "finalized"},
            {"signature": "s2", "slot": 11, "err": {"InstructionError": [0, "Custom"]}, "blockTime": null},
            {"signature": "s3", "slot": 10}
        ]);
        let sigs = parse_signatures(result).unwrap();

        assert_eq!(sigs.len(), 3);
        assert!(!sigs[0].failed);
        assert_eq!(sigs[0].block_time, Some(1_700_000_000));
        assert!(sigs[1].failed);
        assert_eq!(sigs[1].block_time, None);
        assert!(!sigs[2].failed);
    }

    #[test]
    fn signature_options_include_cursor() {
        let opts = signature_options(&SignatureQuery::before(5000, "abc"));
        assert_eq!(opts["limit"], 1000);
        assert_eq!(opts["before"], "abc");
        assert_eq!(opts["commitment"], "confirmed");
        assert!(signature_options(&SignatureQuery::latest(20)).get("before").is_none());
    }

    #[test]
    fn transaction_resolves_loaded_program_ids() {
        let result = json!({
            "slot": 99,
            "blockTime": 1_700_000_500,
            "meta": {
                "err": null,
                "fee": 5000,
                "preBalances": [2_000_000_000u64, 0, 1, 1],
                "postBalances": [1_499_995_000u64, 500_000_000, 1, 1],
                "loadedAddresses": {"writable": [], "readonly": ["LutProgram"]}
            },
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "accountKeys": ["owner", "dest", "11111111111111111111111111111111"],
                    "instructions": [
                        {"programIdIndex": 2, "accounts": [0, 1], "data": "3Bxs"},
                        {"programIdIndex": 3, "accounts": [], "data": ""}
                    ]
                }
            }
        });
        let tx = parse_transaction(result).unwrap().unwrap();

        assert_eq!(tx.account_keys.len(), 4);
        assert_eq!(tx.program_ids, vec!["11111111111111111111111111111111", "LutProgram"]);
        assert_eq!(tx.balance_delta("owner"), Some(500_005_000));
        assert!(!tx.failed);
    }

    #[test]
    fn missing_transaction_is_none() {
        assert_eq!(parse_transaction(Value::Null).unwrap(), None);
    }

    #[test]
    fn out_of_range_program_index_is_malformed() {
        let result = json!({
            "meta": null,
            "transaction": {"message": {"accountKeys": ["a"], "instructions": [{"programIdIndex": 4}]}}
        });
        assert!(matches!(parse_transaction(result), Err(LedgerError::Malformed(_))));
    }

    #[test]
    fn token_mints_from_parsed_accounts() {
        let result = json!({
            "context": {"slot": 1},
            "value": [
                {"pubkey": "ta1", "account": {"data": {"program": "spl-token", "parsed": {"info": {"mint": "MintA", "tokenAmount": {"amount": "1"}}}}}},
                {"pubkey": "ta2", "account": {"data": {"program": "spl-token", "parsed": {"info": {"mint": "MintB", "tokenAmount": {"amount": "0"}}}}}}
            ]
        });
        assert_eq!(parse_token_mints(result).unwrap(), vec!["MintA", "MintB"]);
    }

    #[test]
    fn token_account_without_mint_is_malformed() {
        let result = json!({"value": [{"account": {"data": ["AAAA", "base64"]}}]});
        assert!(parse_token_mints(result).is_err());
    }
}
