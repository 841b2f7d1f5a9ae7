//! Metric normalization.
//!
//! Each raw signal maps to a fraction in `[0, 1]` by a linear clamp against
//! its cap: `min(raw / cap, 1.0)`. No smoothing is applied.

use crate::config::SignalCaps;
use crate::types::RawSignals;

/// Normalize one raw value against its cap.
///
/// Negative or non-finite inputs map to `0.0`; a non-positive cap maps
/// everything to `0.0`.
///
/// # Examples
///
/// ```
/// use bytescore_core::normalize::normalize;
///
/// assert_eq!(normalize(182.5, 365.0), 0.5);
/// assert_eq!(normalize(5000.0, 1000.0), 1.0);
/// assert_eq!(normalize(0.0, 10.0), 0.0);
/// ```
pub fn normalize(raw: f64, cap: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 || cap.is_nan() || cap <= 0.0 {
        return 0.0;
    }
    (raw / cap).min(1.0)
}

/// The six positive signals after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSignals {
    pub wallet_age: f64,
    pub tx_frequency: f64,
    pub volume: f64,
    pub diversity: f64,
    pub contract_usage: f64,
    pub repayment_history: f64,
}

impl NormalizedSignals {
    /// Normalize every positive signal of `signals` against `caps`.
    pub fn from_raw(signals: &RawSignals, caps: &SignalCaps) -> Self {
        Self {
            wallet_age: normalize(signals.wallet_age_days as f64, caps.wallet_age_days),
            tx_frequency: normalize(signals.tx_count as f64, caps.tx_count),
            volume: normalize(signals.volume, caps.volume),
            diversity: normalize(signals.unique_token_types as f64, caps.unique_token_types),
            contract_usage: normalize(
                signals.contract_interactions as f64,
                caps.contract_interactions,
            ),
            repayment_history: normalize(signals.repayment_ratio, caps.repayment_ratio),
        }
    }

    fn all(&self) -> [f64; 6] {
        [
            self.wallet_age,
            self.tx_frequency,
            self.volume,
            self.diversity,
            self.contract_usage,
            self.repayment_history,
        ]
    }

    /// Returns `true` if every fraction lies in `[0, 1]`.
    pub fn in_unit_range(&self) -> bool {
        self.all().iter().all(|v| (0.0..=1.0).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_below_cap() {
        assert_eq!(normalize(250.0, 1000.0), 0.25);
        assert_eq!(normalize(1.0, 10.0), 0.1);
    }

    #[test]
    fn saturates_at_cap() {
        assert_eq!(normalize(1000.0, 1000.0), 1.0);
        assert_eq!(normalize(1e12, 1000.0), 1.0);
    }

    #[test]
    fn degenerate_inputs_go_to_zero() {
        assert_eq!(normalize(-5.0, 10.0), 0.0);
        assert_eq!(normalize(f64::NAN, 10.0), 0.0);
        assert_eq!(normalize(f64::INFINITY, 10.0), 0.0);
        assert_eq!(normalize(5.0, 0.0), 0.0);
        assert_eq!(normalize(5.0, f64::NAN), 0.0);
    }

    #[test]
    fn from_raw_uses_each_cap() {
        let signals = RawSignals {
            wallet_age_days: 73,
            tx_count: 500,
            volume: 2000.0,
            unique_token_types: 4,
            contract_interactions: 25,
            repayment_ratio: 0.9,
            failed_tx_ratio: 0.0,
            inactive_days: 0,
        };
        let n = NormalizedSignals::from_raw(&signals, &SignalCaps::default());

        assert!((n.wallet_age - 0.2).abs() < 1e-12);
        assert_eq!(n.tx_frequency, 0.5);
        assert_eq!(n.volume, 1.0);
        assert_eq!(n.diversity, 0.4);
        assert_eq!(n.contract_usage, 0.25);
        assert_eq!(n.repayment_history, 0.9);
        assert!(n.in_unit_range());
    }
}
