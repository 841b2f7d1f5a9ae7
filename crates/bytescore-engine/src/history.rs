//! Platform history provider: repayment ratio over an account's obligations.

use bytescore_core::account::AccountId;
use bytescore_core::error::{HistoryError, LedgerError};
use bytescore_core::traits::PlatformHistory;
use bytescore_core::types::{Obligation, RepaymentEvidence};
use std::time::Duration;
use tracing::{debug, warn};

/// `Σrepaid / Σdue`, clamped to `[0, 1]`, or `None` when nothing is due.
pub fn observed_ratio(obligations: &[Obligation]) -> Option<f64> {
    let (due, repaid) = obligations.iter().fold((0u128, 0u128), |(d, r), o| {
        (d + u128::from(o.due_lamports), r + u128::from(o.repaid_lamports))
    });
    if due == 0 {
        return None;
    }
    Some((repaid as f64 / due as f64).clamp(0.0, 1.0))
}

/// `Σrepaid / Σdue`, clamped to `[0, 1]`.
///
/// Accounts without obligations, or whose obligations sum to nothing due,
/// get `neutral`.
///
/// # Examples
///
/// ```
/// use bytescore_core::types::Obligation;
/// use bytescore_engine::history::ratio_from_obligations;
///
/// let obligations = vec![
///     Obligation { bond: "a".into(), due_lamports: 110, repaid_lamports: 110 },
///     Obligation { bond: "b".into(), due_lamports: 90, repaid_lamports: 40 },
/// ];
/// assert_eq!(ratio_from_obligations(&obligations, 0.5), 0.75);
/// assert_eq!(ratio_from_obligations(&[], 0.5), 0.5);
/// ```
pub fn ratio_from_obligations(obligations: &[Obligation], neutral: f64) -> f64 {
    observed_ratio(obligations).unwrap_or(neutral)
}

/// Repayment evidence for `account`. Absent when the account has nothing
/// due or the history cannot be read within `limit`.
pub async fn repayment_evidence(
    history: &dyn PlatformHistory,
    account: &AccountId,
    limit: Duration,
) -> RepaymentEvidence {
    let fetch = tokio::time::timeout(limit, history.obligations(account));
    match fetch.await.unwrap_or(Err(HistoryError::Ledger(LedgerError::Timeout))) {
        Ok(obligations) => {
            let ratio = observed_ratio(&obligations);
            debug!(%account, obligations = obligations.len(), ?ratio, "history: repayment ratio");
            ratio.map_or(RepaymentEvidence::Absent, RepaymentEvidence::Observed)
        }
        Err(e) => {
            warn!(%account, error = %e, "history: lookup failed, using neutral ratio");
            RepaymentEvidence::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytescore_core::traits::MockPlatformHistory;

    fn ob(due: u64, repaid: u64) -> Obligation {
        Obligation {
            bond: format!("bond-{due}-{repaid}"),
            due_lamports: due,
            repaid_lamports: repaid,
        }
    }

    fn account() -> AccountId {
        AccountId::parse("FrSHWUWT9QBZHsC5fSxen1GXZWMCAZKf4qQNH6wazgRW").unwrap()
    }

    #[test]
    fn ratio_is_neutral_without_obligations() {
        assert_eq!(ratio_from_obligations(&[], 0.5), 0.5);
        assert_eq!(ratio_from_obligations(&[ob(0, 0)], 0.5), 0.5);
    }

    #[test]
    fn ratio_is_aggregate_not_average() {
        // 1/1 and 0/9 average to 0.5 but aggregate to 0.1.
        assert_eq!(ratio_from_obligations(&[ob(1, 1), ob(9, 0)], 0.5), 0.1);
    }

    #[test]
    fn overpayment_is_clamped() {
        assert_eq!(ratio_from_obligations(&[ob(100, 150)], 0.5), 1.0);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let obligations = vec![ob(u64::MAX, u64::MAX), ob(u64::MAX, 0)];
        assert_eq!(ratio_from_obligations(&obligations, 0.5), 0.5);
    }

    #[test]
    fn nothing_due_is_not_observed() {
        assert_eq!(observed_ratio(&[]), None);
        assert_eq!(observed_ratio(&[ob(0, 0)]), None);
        assert_eq!(observed_ratio(&[ob(200, 100)]), Some(0.5));
    }

    #[tokio::test]
    async fn failure_yields_absent() {
        let mut history = MockPlatformHistory::new();
        history
            .expect_obligations()
            .returning(|_| Err(HistoryError::Decode("truncated".into())));

        let evidence = repayment_evidence(&history, &account(), Duration::from_secs(1)).await;
        assert_eq!(evidence, RepaymentEvidence::Absent);
    }

    #[tokio::test]
    async fn fully_repaid_history() {
        let mut history = MockPlatformHistory::new();
        history
            .expect_obligations()
            .returning(|_| Ok(vec![ob(1_100, 1_100), ob(2_200, 2_200)]));

        let evidence = repayment_evidence(&history, &account(), Duration::from_secs(1)).await;
        assert_eq!(evidence, RepaymentEvidence::Observed(1.0));
    }

    /// Half repaid sits on the neutral value yet still counts as history.
    #[tokio::test]
    async fn half_repaid_is_observed() {
        let mut history = MockPlatformHistory::new();
        history.expect_obligations().returning(|_| Ok(vec![ob(200, 100)]));

        let evidence = repayment_evidence(&history, &account(), Duration::from_secs(1)).await;
        assert_eq!(evidence, RepaymentEvidence::Observed(0.5));
    }
}
