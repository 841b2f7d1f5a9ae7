//! Error types for ByteScore.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("empty account id")] Empty,
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid length: {0} bytes, expected 32")] InvalidLength(usize),
    #[error("account id is not on the ed25519 curve")] OffCurve,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transport: {0}")] Transport(String),
    #[error("rpc error {code}: {message}")] Rpc { code: i64, message: String },
    #[error("malformed response: {0}")] Malformed(String),
    #[error("timeout")] Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error("account decode: {0}")] Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid weight {name}: {value}")] InvalidWeight { name: &'static str, value: f64 },
    #[error("weights sum to {0}, must not exceed 1.0")] WeightSumTooLarge(f64),
    #[error("invalid cap {name}: {value}")] InvalidCap { name: &'static str, value: f64 },
    #[error("invalid red-flag setting {name}: {value}")] InvalidRedFlag { name: &'static str, value: f64 },
    #[error("invalid sampling setting {name}: {value}")] InvalidSampling { name: &'static str, value: usize },
    #[error("invalid neutral repayment ratio: {0}")] InvalidNeutralRatio(f64),
    #[error("invalid fallback score: {0}")] InvalidFallbackScore(u8),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error(transparent)] InvalidIdentifier(#[from] AccountIdError),
    #[error("computation defect: {0}")] ComputationDefect(String),
}
