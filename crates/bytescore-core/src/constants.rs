//! Scoring constants. Volumes are in native units (1 SOL = 10^9 lamports)
//! unless a name says lamports.

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Base ledger system program, excluded from contract-usage counts.
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

/// SPL Token program.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 program.
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// ByteBonds on-chain program (bonds, investments, repayments).
pub const BYTEBONDS_PROGRAM_ID: &str = "9Dv2v4Lhcndjv5Mtq3A3m5xZi5JwQkUg3qh9MKT5nqpP";

/// Seconds in one day.
pub const SECS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Weights (sum to 0.95)
// ---------------------------------------------------------------------------

pub const WALLET_AGE_WEIGHT: f64 = 0.15;
pub const TX_FREQUENCY_WEIGHT: f64 = 0.20;
pub const VOLUME_WEIGHT: f64 = 0.20;
pub const DIVERSITY_WEIGHT: f64 = 0.10;
pub const CONTRACT_USAGE_WEIGHT: f64 = 0.10;
pub const REPAYMENT_WEIGHT: f64 = 0.20;

// ---------------------------------------------------------------------------
// Normalization caps
// ---------------------------------------------------------------------------

pub const MAX_WALLET_AGE_DAYS: f64 = 365.0;
pub const MAX_TX_COUNT: f64 = 1000.0;
pub const MAX_VOLUME_SOL: f64 = 1000.0;
pub const MAX_TOKEN_TYPES: f64 = 10.0;
pub const MAX_CONTRACT_INTERACTIONS: f64 = 100.0;
pub const MAX_REPAYMENT_RATIO: f64 = 1.0;

// ---------------------------------------------------------------------------
// Red flags
// ---------------------------------------------------------------------------

/// Failed-transaction ratio above which the failure penalty applies.
pub const FAILED_TX_THRESHOLD: f64 = 0.30;
/// Days of inactivity above which the inactivity penalty applies.
pub const INACTIVE_DAYS_THRESHOLD: f64 = 30.0;
/// Inactivity at which the inactivity penalty saturates.
pub const INACTIVE_DAYS_SATURATION: f64 = 90.0;
/// Transaction count below which the low-activity penalty applies.
pub const LOW_ACTIVITY_TX_COUNT: f64 = 5.0;

pub const FAILED_TX_MAX_PENALTY: f64 = 10.0;
pub const INACTIVITY_MAX_PENALTY: f64 = 10.0;
pub const LOW_ACTIVITY_MAX_PENALTY: f64 = 5.0;
/// Upper bound on the summed red-flag penalty.
pub const MAX_RED_FLAG_PENALTY: f64 = 20.0;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Repayment ratio for accounts with no platform obligations.
pub const NEUTRAL_REPAYMENT_RATIO: f64 = 0.5;

/// Inactivity assumed when the last activity cannot be observed.
pub const DEFAULT_INACTIVE_DAYS: u64 = 182;

/// Score returned by the fallback provider.
pub const NEUTRAL_SCORE: u8 = 50;

// ---------------------------------------------------------------------------
// Sampling windows
// ---------------------------------------------------------------------------

pub const TX_WINDOW: usize = 100;
pub const VOLUME_SAMPLE: usize = 10;
pub const CONTRACT_WINDOW: usize = 20;
pub const CONTRACT_SAMPLE: usize = 5;
pub const RED_FLAG_WINDOW: usize = 20;
pub const HISTORY_PAGE_SIZE: usize = 1000;
pub const HISTORY_MAX_PAGES: usize = 10;

/// Per-fetch timeout in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
