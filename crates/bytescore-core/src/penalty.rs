//! Red-flag penalty.
//!
//! Three independent rules are evaluated unconditionally and summed:
//!
//! 1. failure ratio above the threshold, scaled linearly up to ratio 1.0
//! 2. inactivity above the threshold, scaled by `inactive / saturation`
//! 3. fewer transactions than the low-activity floor
//!
//! The sum is clamped to `[0, max_penalty]`.

use crate::config::RedFlagConfig;

/// Penalty points for a failed-transaction ratio.
pub fn failure_penalty(failed_tx_ratio: f64, cfg: &RedFlagConfig) -> f64 {
    if failed_tx_ratio > cfg.failed_ratio_threshold {
        cfg.failed_ratio_max_points * (failed_tx_ratio - cfg.failed_ratio_threshold)
            / (1.0 - cfg.failed_ratio_threshold)
    } else {
        0.0
    }
}

/// Penalty points for days without activity.
///
/// Once the threshold is crossed, the rule scales from the day count itself
/// (not the excess over the threshold), so 31 idle days already cost a third
/// of the maximum.
pub fn inactivity_penalty(inactive_days: u64, cfg: &RedFlagConfig) -> f64 {
    let days = inactive_days as f64;
    if days > cfg.inactive_days_threshold {
        cfg.inactivity_max_points * (days / cfg.inactive_days_saturation).min(1.0)
    } else {
        0.0
    }
}

/// Penalty points for very low transaction counts.
pub fn low_activity_penalty(tx_count: u64, cfg: &RedFlagConfig) -> f64 {
    let count = tx_count as f64;
    if count < cfg.low_activity_tx_count {
        cfg.low_activity_max_points * (1.0 - count / cfg.low_activity_tx_count)
    } else {
        0.0
    }
}

/// Total red-flag penalty, clamped to `[0, cfg.max_penalty]`.
///
/// # Examples
///
/// ```
/// use bytescore_core::config::RedFlagConfig;
/// use bytescore_core::penalty::red_flag_penalty;
///
/// let cfg = RedFlagConfig::default();
/// let p = red_flag_penalty(0.65, 120, 1, &cfg);
/// assert!((p - 19.0).abs() < 1e-9);
/// assert_eq!(red_flag_penalty(0.0, 0, 500, &cfg), 0.0);
/// ```
pub fn red_flag_penalty(
    failed_tx_ratio: f64,
    inactive_days: u64,
    tx_count: u64,
    cfg: &RedFlagConfig,
) -> f64 {
    let total = failure_penalty(failed_tx_ratio, cfg)
        + inactivity_penalty(inactive_days, cfg)
        + low_activity_penalty(tx_count, cfg);

    total.clamp(0.0, cfg.max_penalty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RedFlagConfig {
        RedFlagConfig::default()
    }

    #[test]
    fn clean_account_has_no_penalty() {
        assert_eq!(red_flag_penalty(0.1, 3, 200, &cfg()), 0.0);
    }

    #[test]
    fn failure_rule_is_zero_at_threshold() {
        assert_eq!(failure_penalty(0.30, &cfg()), 0.0);
    }

    #[test]
    fn failure_rule_reaches_max_at_total_failure() {
        assert!((failure_penalty(1.0, &cfg()) - 10.0).abs() < 1e-9);
        assert!((failure_penalty(0.65, &cfg()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn inactivity_rule_starts_above_threshold() {
        assert_eq!(inactivity_penalty(30, &cfg()), 0.0);
        let p = inactivity_penalty(45, &cfg());
        assert!((p - 5.0).abs() < 1e-9, "45/90 of 10 points, got {p}");
    }

    #[test]
    fn inactivity_rule_saturates() {
        assert_eq!(inactivity_penalty(90, &cfg()), 10.0);
        assert_eq!(inactivity_penalty(10_000, &cfg()), 10.0);
    }

    #[test]
    fn low_activity_rule() {
        assert_eq!(low_activity_penalty(0, &cfg()), 5.0);
        assert!((low_activity_penalty(1, &cfg()) - 4.0).abs() < 1e-9);
        assert_eq!(low_activity_penalty(5, &cfg()), 0.0);
    }

    /// All three rules fire together and are summed, not branched.
    #[test]
    fn rules_are_additive() {
        let p = red_flag_penalty(0.65, 120, 1, &cfg());
        assert!((p - 19.0).abs() < 1e-9, "expected 5 + 10 + 4, got {p}");
    }

    #[test]
    fn sum_is_clamped_to_max() {
        // 10 + 10 + 5 = 25 before clamping.
        assert_eq!(red_flag_penalty(1.0, 365, 0, &cfg()), 20.0);
    }
}
