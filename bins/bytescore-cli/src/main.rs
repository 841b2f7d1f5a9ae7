//! bytescore: one-shot reputation scoring from the command line.
//!
//! Prints the score as JSON on stdout; logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bytescore_core::account::AccountId;
use bytescore_core::config::ScoringConfig;
use bytescore_core::constants::{BYTEBONDS_PROGRAM_ID, DEFAULT_FETCH_TIMEOUT_MS};
use bytescore_engine::ScoringEngine;
use bytescore_rpc::{ProgramHistory, RpcClient, RpcLedger};
use clap::{Args, Parser, Subcommand};

/// ByteScore command-line interface.
#[derive(Parser, Debug)]
#[command(name = "bytescore")]
#[command(version, about = "Reputation scores for ByteBonds accounts.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the reputation score of an account.
    Score(ScoreArgs),
    /// Check whether an account id is well formed.
    Validate {
        /// Base58 account id.
        address: String,
    },
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Base58 account id.
    address: String,

    /// Ledger JSON-RPC endpoint.
    #[arg(long, default_value = "https://api.devnet.solana.com")]
    rpc_url: String,

    /// ByteBonds program id.
    #[arg(long, default_value = BYTEBONDS_PROGRAM_ID)]
    program_id: String,

    /// Deadline for each signal fetch, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,

    /// Fail instead of printing the fallback for an invalid account id.
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score(args) => score(args).await,
        Commands::Validate { address } => validate(&address),
    }
}

/// Score one account and print the result.
async fn score(args: ScoreArgs) -> Result<()> {
    if args.timeout_ms == 0 {
        bail!("--timeout-ms must be greater than zero");
    }
    AccountId::parse(&args.program_id).context("--program-id is not a valid account id")?;

    let timeout = Duration::from_millis(args.timeout_ms);
    let client = Arc::new(RpcClient::new(&args.rpc_url, timeout).context("failed to build RPC client")?);
    let ledger = Arc::new(RpcLedger::new(Arc::clone(&client)));
    let history = Arc::new(ProgramHistory::new(client, args.program_id));
    let engine = ScoringEngine::new(ledger, history, ScoringConfig::new().with_fetch_timeout(timeout))
        .context("invalid scoring configuration")?;

    let result = if args.strict {
        engine
            .try_compute(&args.address)
            .await
            .with_context(|| format!("cannot score {}", args.address))?
    } else {
        engine.compute_reputation_score(&args.address).await
    };

    let out = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{out}");
    Ok(())
}

fn validate(address: &str) -> Result<()> {
    match AccountId::parse(address) {
        Ok(id) => {
            println!("{id}: valid");
            Ok(())
        }
        Err(e) => bail!("{address}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_defaults() {
        let cli = Cli::try_parse_from(["bytescore", "score", "8TY7cVY8xke4wqdigNHUAfJv7vPyUXLAePQCPMKdym65"]).unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(args.program_id, BYTEBONDS_PROGRAM_ID);
        assert_eq!(args.timeout_ms, 10_000);
        assert!(!args.pretty);
        assert!(!args.strict);
    }

    #[test]
    fn score_flags() {
        let cli = Cli::try_parse_from([
            "bytescore",
            "score",
            "addr",
            "--rpc-url",
            "http://localhost:8899",
            "--timeout-ms",
            "500",
            "--pretty",
        ])
        .unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.rpc_url, "http://localhost:8899");
        assert_eq!(args.timeout_ms, 500);
        assert!(args.pretty);
    }

    #[test]
    fn score_requires_address() {
        assert!(Cli::try_parse_from(["bytescore", "score"]).is_err());
    }

    #[test]
    fn validate_accepts_on_curve_key() {
        assert!(validate("8TY7cVY8xke4wqdigNHUAfJv7vPyUXLAePQCPMKdym65").is_ok());
        assert!(validate("Coh3CDvDByv2MuFwRoehvf5UFXdjPicY3H8sEkTgYUDH").is_err());
    }
}
