//! The neutral fallback result.

use std::fmt;

use crate::config::ScoringConfig;
use crate::types::{RawSignals, ScoreResult};

/// Why a request was answered with the fallback result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The identifier failed to parse.
    InvalidIdentifier,
    /// No positive activity and no platform history.
    Dormant,
    /// Composition rejected its inputs or produced a non-finite value.
    ComputationDefect,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidIdentifier => "invalid identifier",
            Self::Dormant => "dormant account",
            Self::ComputationDefect => "computation defect",
        };
        f.write_str(s)
    }
}

/// Build the fallback result for `config`.
///
/// Metrics are zeroed except `repayment_ratio`, which carries the neutral
/// value.
pub fn neutral_result(config: &ScoringConfig) -> ScoreResult {
    ScoreResult {
        score: config.fallback.score,
        breakdown: config.fallback.breakdown,
        metrics: RawSignals::zeroed(config.neutral_repayment_ratio),
    }
}
