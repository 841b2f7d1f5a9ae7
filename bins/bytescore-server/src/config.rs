//! Server configuration loaded from environment variables.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use bytescore_core::account::AccountId;
use bytescore_core::constants::{BYTEBONDS_PROGRAM_ID, DEFAULT_FETCH_TIMEOUT_MS};

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8090";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Ledger JSON-RPC endpoint.
    pub rpc_url: String,
    /// ByteBonds program id.
    pub program_id: String,
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Deadline for each signal fetch.
    pub fetch_timeout: Duration,
    /// Deadline for each JSON-RPC request.
    pub rpc_timeout: Duration,
    /// `text` or `json`.
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `get`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = get("BYTESCORE_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let program_id =
            get("BYTESCORE_PROGRAM_ID").unwrap_or_else(|| BYTEBONDS_PROGRAM_ID.to_string());
        AccountId::parse(&program_id).context("BYTESCORE_PROGRAM_ID is not a valid account id")?;

        let bind_addr = get("BYTESCORE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let fetch_timeout_ms: u64 = get("BYTESCORE_FETCH_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_FETCH_TIMEOUT_MS.to_string())
            .parse()
            .context("BYTESCORE_FETCH_TIMEOUT_MS must be a positive integer")?;

        let rpc_timeout_ms: u64 = get("BYTESCORE_RPC_TIMEOUT_MS")
            .unwrap_or_else(|| "10000".to_string())
            .parse()
            .context("BYTESCORE_RPC_TIMEOUT_MS must be a positive integer")?;

        if fetch_timeout_ms == 0 || rpc_timeout_ms == 0 {
            bail!("timeouts must be greater than zero");
        }

        let log_format = get("BYTESCORE_LOG_FORMAT").unwrap_or_else(|| "text".to_string());
        if log_format != "text" && log_format != "json" {
            bail!("BYTESCORE_LOG_FORMAT must be `text` or `json`, got `{log_format}`");
        }

        Ok(Config {
            rpc_url,
            program_id,
            bind_addr,
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            rpc_timeout: Duration::from_millis(rpc_timeout_ms),
            log_format,
        })
    }
}
