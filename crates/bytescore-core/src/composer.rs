//! Score composition.
//!
//! Pure and deterministic: the same [`RawSignals`] and [`ScoringConfig`]
//! always produce the same [`ScoreResult`].
//!
//! ```text
//! score_i = normalized_i * 100 * weight_i
//! total   = clamp(sum(score_i) - penalty, 0, 100)
//! ```
//!
//! `score` is `round(total)`; each breakdown entry is `round(score_i)` on its
//! own, capped at the whole points of its weight, so the breakdown need not
//! add up to `score` exactly.

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::normalize::NormalizedSignals;
use crate::penalty::red_flag_penalty;
use crate::types::{RawSignals, ScoreBreakdown, ScoreResult};

/// Unrounded point contributions, kept for auditing and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subscores {
    pub wallet_age: f64,
    pub tx_frequency: f64,
    pub volume: f64,
    pub diversity: f64,
    pub contract_usage: f64,
    pub repayment_history: f64,
    pub penalty: f64,
}

impl Subscores {
    /// Compute weighted subscores and the red-flag penalty.
    pub fn compute(signals: &RawSignals, config: &ScoringConfig) -> Self {
        let n = NormalizedSignals::from_raw(signals, &config.caps);
        let w = &config.weights;

        Self {
            wallet_age: n.wallet_age * 100.0 * w.wallet_age,
            tx_frequency: n.tx_frequency * 100.0 * w.tx_frequency,
            volume: n.volume * 100.0 * w.volume,
            diversity: n.diversity * 100.0 * w.diversity,
            contract_usage: n.contract_usage * 100.0 * w.contract_usage,
            repayment_history: n.repayment_history * 100.0 * w.repayment_history,
            penalty: red_flag_penalty(
                signals.failed_tx_ratio,
                signals.inactive_days,
                signals.tx_count,
                &config.red_flags,
            ),
        }
    }

    pub fn positive_sum(&self) -> f64 {
        self.wallet_age
            + self.tx_frequency
            + self.volume
            + self.diversity
            + self.contract_usage
            + self.repayment_history
    }

    /// `sum - penalty`, clamped to `[0, 100]`.
    pub fn total(&self) -> f64 {
        (self.positive_sum() - self.penalty).clamp(0.0, 100.0)
    }
}

/// Round a non-negative point value into the `0..=100` integer range.
fn to_points(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Whole points a weight allows. The epsilon absorbs float noise such as
/// `0.29 * 100.0 == 28.999999999999996`.
fn weight_points(weight: f64) -> u8 {
    (weight * 100.0 + 1e-9).floor().clamp(0.0, 100.0) as u8
}

/// Round `value` and keep it within `weight_i * 100`.
fn to_capped_points(value: f64, weight: f64) -> u8 {
    to_points(value).min(weight_points(weight))
}

/// Compose the final score for `signals`.
///
/// Fails with [`ScoreError::ComputationDefect`] if the inputs violate their
/// documented ranges or an intermediate value is not finite; callers are
/// expected to substitute the fallback result.
pub fn compose(signals: &RawSignals, config: &ScoringConfig) -> Result<ScoreResult, ScoreError> {
    signals.check_bounds().map_err(ScoreError::ComputationDefect)?;

    let sub = Subscores::compute(signals, config);
    let w = &config.weights;
    let total = sub.total();
    if !total.is_finite() {
        return Err(ScoreError::ComputationDefect(format!(
            "non-finite total: {total}"
        )));
    }

    Ok(ScoreResult {
        score: to_points(total),
        breakdown: ScoreBreakdown {
            wallet_age: to_capped_points(sub.wallet_age, w.wallet_age),
            transaction_frequency: to_capped_points(sub.tx_frequency, w.tx_frequency),
            volume: to_capped_points(sub.volume, w.volume),
            diversity: to_capped_points(sub.diversity, w.diversity),
            contract_usage: to_capped_points(sub.contract_usage, w.contract_usage),
            repayment_history: to_capped_points(sub.repayment_history, w.repayment_history),
            red_flags: to_points(sub.penalty),
        },
        metrics: *signals,
    })
}
