//! Scoring configuration.
//!
//! [`ScoringConfig`] is an immutable value handed to the scoring engine at
//! construction. Its [`Default`] reproduces the production constants in
//! [`crate::constants`]; tests and alternate deployments build their own.

use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;
use crate::types::ScoreBreakdown;

/// Per-signal weights applied to normalized subscores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub wallet_age: f64,
    pub tx_frequency: f64,
    pub volume: f64,
    pub diversity: f64,
    pub contract_usage: f64,
    pub repayment_history: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            wallet_age: WALLET_AGE_WEIGHT,
            tx_frequency: TX_FREQUENCY_WEIGHT,
            volume: VOLUME_WEIGHT,
            diversity: DIVERSITY_WEIGHT,
            contract_usage: CONTRACT_USAGE_WEIGHT,
            repayment_history: REPAYMENT_WEIGHT,
        }
    }
}

impl SignalWeights {
    pub fn total(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("wallet_age", self.wallet_age),
            ("tx_frequency", self.tx_frequency),
            ("volume", self.volume),
            ("diversity", self.diversity),
            ("contract_usage", self.contract_usage),
            ("repayment_history", self.repayment_history),
        ]
    }
}

/// Normalization caps: a raw signal at or above its cap scores full marks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalCaps {
    pub wallet_age_days: f64,
    pub tx_count: f64,
    pub volume: f64,
    pub unique_token_types: f64,
    pub contract_interactions: f64,
    pub repayment_ratio: f64,
}

impl Default for SignalCaps {
    fn default() -> Self {
        Self {
            wallet_age_days: MAX_WALLET_AGE_DAYS,
            tx_count: MAX_TX_COUNT,
            volume: MAX_VOLUME_SOL,
            unique_token_types: MAX_TOKEN_TYPES,
            contract_interactions: MAX_CONTRACT_INTERACTIONS,
            repayment_ratio: MAX_REPAYMENT_RATIO,
        }
    }
}

/// Thresholds and point values for the red-flag penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedFlagConfig {
    pub failed_ratio_threshold: f64,
    pub failed_ratio_max_points: f64,
    pub inactive_days_threshold: f64,
    pub inactive_days_saturation: f64,
    pub inactivity_max_points: f64,
    pub low_activity_tx_count: f64,
    pub low_activity_max_points: f64,
    pub max_penalty: f64,
}

impl Default for RedFlagConfig {
    fn default() -> Self {
        Self {
            failed_ratio_threshold: FAILED_TX_THRESHOLD,
            failed_ratio_max_points: FAILED_TX_MAX_PENALTY,
            inactive_days_threshold: INACTIVE_DAYS_THRESHOLD,
            inactive_days_saturation: INACTIVE_DAYS_SATURATION,
            inactivity_max_points: INACTIVITY_MAX_PENALTY,
            low_activity_tx_count: LOW_ACTIVITY_TX_COUNT,
            low_activity_max_points: LOW_ACTIVITY_MAX_PENALTY,
            max_penalty: MAX_RED_FLAG_PENALTY,
        }
    }
}

/// How much ledger history each fetcher inspects, and how long it may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Signatures counted for transaction frequency.
    pub tx_window: usize,
    /// Transactions fetched for volume (prefix of `tx_window`).
    pub volume_sample: usize,
    /// Signatures listed for contract usage.
    pub contract_window: usize,
    /// Transactions inspected for program ids (prefix of `contract_window`).
    pub contract_sample: usize,
    /// Signatures inspected for failure ratio and inactivity.
    pub red_flag_window: usize,
    /// Page size when walking history back to the oldest signature.
    pub history_page_size: usize,
    /// Upper bound on pages walked for wallet age.
    pub history_max_pages: usize,
    /// Inactivity reported when the last activity is unobservable.
    pub default_inactive_days: u64,
    /// Deadline applied to each signal fetch independently.
    pub fetch_timeout: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tx_window: TX_WINDOW,
            volume_sample: VOLUME_SAMPLE,
            contract_window: CONTRACT_WINDOW,
            contract_sample: CONTRACT_SAMPLE,
            red_flag_window: RED_FLAG_WINDOW,
            history_page_size: HISTORY_PAGE_SIZE,
            history_max_pages: HISTORY_MAX_PAGES,
            default_inactive_days: DEFAULT_INACTIVE_DAYS,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }
}

/// The fixed result returned for invalid identifiers, dormant accounts, and
/// computation defects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackProfile {
    pub score: u8,
    pub breakdown: ScoreBreakdown,
}

impl Default for FallbackProfile {
    fn default() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            breakdown: ScoreBreakdown {
                wallet_age: 0,
                transaction_frequency: 10,
                volume: 10,
                diversity: 5,
                contract_usage: 5,
                repayment_history: 10,
                red_flags: 0,
            },
        }
    }
}

/// Complete, immutable scoring configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: SignalWeights,
    pub caps: SignalCaps,
    pub red_flags: RedFlagConfig,
    pub sampling: SamplingConfig,
    pub fallback: FallbackProfile,
    /// Repayment ratio for accounts without platform obligations, and for
    /// failed history lookups.
    pub neutral_repayment_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            caps: SignalCaps::default(),
            red_flags: RedFlagConfig::default(),
            sampling: SamplingConfig::default(),
            fallback: FallbackProfile::default(),
            neutral_repayment_ratio: NEUTRAL_REPAYMENT_RATIO,
        }
    }
}

impl ScoringConfig {
    /// Production defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with a different per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.sampling.fetch_timeout = timeout;
        self
    }

    /// Reject configurations that would break the score invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights.named() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let total = self.weights.total();
        // Tolerate float noise from summing decimal literals.
        if total > 1.0 + 1e-9 {
            return Err(ConfigError::WeightSumTooLarge(total));
        }

        let caps = [
            ("wallet_age_days", self.caps.wallet_age_days),
            ("tx_count", self.caps.tx_count),
            ("volume", self.caps.volume),
            ("unique_token_types", self.caps.unique_token_types),
            ("contract_interactions", self.caps.contract_interactions),
            ("repayment_ratio", self.caps.repayment_ratio),
        ];
        for (name, value) in caps {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidCap { name, value });
            }
        }

        let rf = &self.red_flags;
        if !(0.0..1.0).contains(&rf.failed_ratio_threshold) {
            return Err(ConfigError::InvalidRedFlag {
                name: "failed_ratio_threshold",
                value: rf.failed_ratio_threshold,
            });
        }
        if !rf.inactive_days_saturation.is_finite() || rf.inactive_days_saturation <= 0.0 {
            return Err(ConfigError::InvalidRedFlag {
                name: "inactive_days_saturation",
                value: rf.inactive_days_saturation,
            });
        }
        if !rf.low_activity_tx_count.is_finite() || rf.low_activity_tx_count <= 0.0 {
            return Err(ConfigError::InvalidRedFlag {
                name: "low_activity_tx_count",
                value: rf.low_activity_tx_count,
            });
        }
        let points = [
            ("failed_ratio_max_points", rf.failed_ratio_max_points),
            ("inactivity_max_points", rf.inactivity_max_points),
            ("low_activity_max_points", rf.low_activity_max_points),
            ("inactive_days_threshold", rf.inactive_days_threshold),
        ];
        for (name, value) in points {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRedFlag { name, value });
            }
        }
        if !(0.0..=MAX_RED_FLAG_PENALTY).contains(&rf.max_penalty) {
            return Err(ConfigError::InvalidRedFlag {
                name: "max_penalty",
                value: rf.max_penalty,
            });
        }

        let s = &self.sampling;
        let windows = [
            ("tx_window", s.tx_window),
            ("contract_window", s.contract_window),
            ("red_flag_window", s.red_flag_window),
            ("history_page_size", s.history_page_size),
            ("history_max_pages", s.history_max_pages),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::InvalidSampling { name, value });
            }
        }
        if s.volume_sample > s.tx_window {
            return Err(ConfigError::InvalidSampling {
                name: "volume_sample",
                value: s.volume_sample,
            });
        }
        if s.contract_sample > s.contract_window {
            return Err(ConfigError::InvalidSampling {
                name: "contract_sample",
                value: s.contract_sample,
            });
        }

        if !(0.0..=1.0).contains(&self.neutral_repayment_ratio) {
            return Err(ConfigError::InvalidNeutralRatio(self.neutral_repayment_ratio));
        }
        if self.fallback.score > 100 {
            return Err(ConfigError::InvalidFallbackScore(self.fallback.score));
        }

        Ok(())
    }
}
