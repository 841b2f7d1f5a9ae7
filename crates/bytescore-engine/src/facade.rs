//! The scoring facade.
//!
//! [`ScoringEngine`] validates the identifier, fans out one task per signal
//! on a [`JoinSet`], joins all of them, and composes the score. No error
//! leaves the facade: a failed fetch contributes its default, and an invalid
//! identifier, a dormant account, or a composition defect yields the
//! fallback result.

use std::future::Future;
use std::sync::Arc;

use bytescore_core::account::AccountId;
use bytescore_core::composer::compose;
use bytescore_core::config::ScoringConfig;
use bytescore_core::error::{ConfigError, ScoreError};
use bytescore_core::fallback::{FallbackReason, neutral_result};
use bytescore_core::traits::{LedgerReader, PlatformHistory};
use bytescore_core::types::{RawSignals, RepaymentEvidence, ScoreResult};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::history;
use crate::signals::{self, RedFlagInputs, TxActivity};

/// Source of the current unix time in seconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp()
}

/// One resolved fetch task.
#[derive(Debug)]
enum Fetched {
    WalletAge(u64),
    Tx(TxActivity),
    Tokens(u64),
    Contracts(u64),
    RedFlags(RedFlagInputs),
    Repayment(RepaymentEvidence),
}

/// Signals gathered so far. Starts at every fetch's default, so anything
/// still missing when the join ends keeps its default.
struct Collected {
    wallet_age_days: u64,
    tx: TxActivity,
    tokens: u64,
    contracts: u64,
    red_flags: RedFlagInputs,
    repayment: RepaymentEvidence,
}

impl Collected {
    fn defaults(config: &ScoringConfig) -> Self {
        Self {
            wallet_age_days: 0,
            tx: TxActivity::default(),
            tokens: 0,
            contracts: 0,
            red_flags: RedFlagInputs::unknown(&config.sampling),
            repayment: RepaymentEvidence::Absent,
        }
    }

    fn absorb(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::WalletAge(days) => self.wallet_age_days = days,
            Fetched::Tx(tx) => self.tx = tx,
            Fetched::Tokens(n) => self.tokens = n,
            Fetched::Contracts(n) => self.contracts = n,
            Fetched::RedFlags(rf) => self.red_flags = rf,
            Fetched::Repayment(evidence) => self.repayment = evidence,
        }
    }

    fn into_signals(self, neutral_repayment_ratio: f64) -> (RawSignals, RepaymentEvidence) {
        let signals = RawSignals {
            wallet_age_days: self.wallet_age_days,
            tx_count: self.tx.count,
            volume: self.tx.volume,
            unique_token_types: self.tokens,
            contract_interactions: self.contracts,
            repayment_ratio: self.repayment.ratio_or(neutral_repayment_ratio),
            failed_tx_ratio: self.red_flags.failed_tx_ratio,
            inactive_days: self.red_flags.inactive_days,
        };
        (signals, self.repayment)
    }
}

/// Computes reputation scores from a ledger reader and a platform history.
pub struct ScoringEngine {
    ledger: Arc<dyn LedgerReader>,
    history: Arc<dyn PlatformHistory>,
    config: Arc<ScoringConfig>,
    clock: Clock,
}

impl ScoringEngine {
    /// Create an engine. Fails only if `config` is invalid.
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        history: Arc<dyn PlatformHistory>,
        config: ScoringConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ledger,
            history,
            config: Arc::new(config),
            clock: system_clock,
        })
    }

    /// Replace the wall clock used for day arithmetic.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `account`. Always returns a usable result.
    pub async fn compute_reputation_score(&self, account: &str) -> ScoreResult {
        self.compute_reputation_score_until(account, std::future::pending::<()>())
            .await
    }

    /// Score `account`, giving up on unresolved fetches once `cancel`
    /// completes. Signals still in flight keep their defaults.
    pub async fn compute_reputation_score_until<C>(&self, account: &str, cancel: C) -> ScoreResult
    where
        C: Future<Output = ()>,
    {
        match self.try_compute_until(account, cancel).await {
            Ok(result) => result,
            Err(ScoreError::InvalidIdentifier(e)) => {
                info!(account, error = %e, "bytescore: invalid identifier, returning fallback");
                self.fallback(FallbackReason::InvalidIdentifier)
            }
            Err(ScoreError::ComputationDefect(msg)) => {
                warn!(account, defect = %msg, "bytescore: computation defect, returning fallback");
                self.fallback(FallbackReason::ComputationDefect)
            }
        }
    }

    /// Like [`compute_reputation_score`](Self::compute_reputation_score) but
    /// reports invalid identifiers and composition defects instead of
    /// substituting the fallback. Dormant accounts still get the fallback.
    pub async fn try_compute(&self, account: &str) -> Result<ScoreResult, ScoreError> {
        self.try_compute_until(account, std::future::pending::<()>())
            .await
    }

    async fn try_compute_until<C>(&self, account: &str, cancel: C) -> Result<ScoreResult, ScoreError>
    where
        C: Future<Output = ()>,
    {
        let id = AccountId::parse(account)?;
        let (signals, repayment) = self.collect(&id, cancel).await;
        debug!(%id, ?signals, ?repayment, "bytescore: signals collected");

        let result = self.score_signals(&signals, repayment)?;
        info!(%id, score = result.score, "bytescore: score computed");
        Ok(result)
    }

    /// Compose already-collected signals, applying the dormancy rule:
    /// no ledger activity and no platform history yields the fallback.
    pub fn score_signals(
        &self,
        signals: &RawSignals,
        repayment: RepaymentEvidence,
    ) -> Result<ScoreResult, ScoreError> {
        if signals.is_dormant(repayment) {
            return Ok(self.fallback(FallbackReason::Dormant));
        }
        compose(signals, &self.config)
    }

    fn fallback(&self, reason: FallbackReason) -> ScoreResult {
        debug!(%reason, "bytescore: fallback result");
        neutral_result(&self.config)
    }

    async fn collect<C>(&self, id: &AccountId, cancel: C) -> (RawSignals, RepaymentEvidence)
    where
        C: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        self.spawn_fetches(&mut tasks, id, (self.clock)());

        let mut collected = Collected::defaults(&self.config);
        tokio::pin!(cancel);
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    warn!(%id, pending = tasks.len(), "bytescore: cancelled, pending signals use defaults");
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(fetched)) => collected.absorb(fetched),
                    Some(Err(e)) => warn!(%id, error = %e, "bytescore: fetch task died, using default"),
                    None => break,
                },
            }
        }
        collected.into_signals(self.config.neutral_repayment_ratio)
    }

    fn spawn_fetches(&self, tasks: &mut JoinSet<Fetched>, id: &AccountId, now: i64) {
        let (ledger, account, config) = self.task_handles(id);
        tasks.spawn(async move {
            let age = signals::wallet_age_days(ledger.as_ref(), &account, &config.sampling, now).await;
            Fetched::WalletAge(age)
        });

        let (ledger, account, config) = self.task_handles(id);
        tasks.spawn(async move {
            Fetched::Tx(signals::tx_activity(ledger.as_ref(), &account, &config.sampling).await)
        });

        let (ledger, account, config) = self.task_handles(id);
        tasks.spawn(async move {
            Fetched::Tokens(signals::unique_token_types(ledger.as_ref(), &account, &config.sampling).await)
        });

        let (ledger, account, config) = self.task_handles(id);
        tasks.spawn(async move {
            let n = signals::contract_interactions(ledger.as_ref(), &account, &config.sampling).await;
            Fetched::Contracts(n)
        });

        let (ledger, account, config) = self.task_handles(id);
        tasks.spawn(async move {
            let rf = signals::red_flag_inputs(ledger.as_ref(), &account, &config.sampling, now).await;
            Fetched::RedFlags(rf)
        });

        let source = Arc::clone(&self.history);
        let account = id.clone();
        let config = Arc::clone(&self.config);
        tasks.spawn(async move {
            let evidence =
                history::repayment_evidence(source.as_ref(), &account, config.sampling.fetch_timeout)
                    .await;
            Fetched::Repayment(evidence)
        });
    }

    fn task_handles(&self, id: &AccountId) -> (Arc<dyn LedgerReader>, AccountId, Arc<ScoringConfig>) {
        (Arc::clone(&self.ledger), id.clone(), Arc::clone(&self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytescore_core::constants::{LAMPORTS_PER_SOL, SECS_PER_DAY, SYSTEM_PROGRAM_ID};
    use bytescore_core::error::{HistoryError, LedgerError};
    use bytescore_core::traits::{MockLedgerReader, MockPlatformHistory};
    use bytescore_core::types::{
        Obligation, ScoreBreakdown, SignatureInfo, SignatureQuery, TransactionDetail,
    };

    const OWNER: &str = "7YrKN1iELoJfpGxgCYoWzM7x6vjvrHSXT2Wiq6ULacgG";
    const NOW: i64 = 1_750_000_000;

    fn fixed_clock() -> i64 {
        NOW
    }

    fn sig(n: usize, days_ago: i64) -> SignatureInfo {
        SignatureInfo {
            signature: format!("sig{n}"),
            slot: 1_000 - n as u64,
            block_time: Some(NOW - days_ago * SECS_PER_DAY),
            failed: false,
        }
    }

    fn engine(ledger: impl LedgerReader + 'static, history: impl PlatformHistory + 'static) -> ScoringEngine {
        ScoringEngine::new(Arc::new(ledger), Arc::new(history), ScoringConfig::new())
            .unwrap()
            .with_clock(fixed_clock)
    }

    /// Three transfers of 2 native units each, a year of history.
    fn active_ledger() -> MockLedgerReader {
        let mut ledger = MockLedgerReader::new();
        ledger
            .expect_signatures()
            .returning(|_, _| Ok(vec![sig(0, 1), sig(1, 2), sig(2, 365)]));
        ledger.expect_transaction().returning(|_| {
            Ok(Some(TransactionDetail {
                block_time: Some(NOW),
                account_keys: vec![OWNER.into(), "dest".into()],
                pre_balances: vec![5 * LAMPORTS_PER_SOL, 0],
                post_balances: vec![3 * LAMPORTS_PER_SOL, 2 * LAMPORTS_PER_SOL],
                program_ids: vec![SYSTEM_PROGRAM_ID.into(), "progX".into()],
                failed: false,
            }))
        });
        ledger
            .expect_token_mints()
            .returning(|_| Ok(vec!["m1".into(), "m2".into()]));
        ledger
    }

    fn repaid_history() -> MockPlatformHistory {
        let mut history = MockPlatformHistory::new();
        history.expect_obligations().returning(|_| {
            Ok(vec![Obligation {
                bond: "bond".into(),
                due_lamports: 110,
                repaid_lamports: 110,
            }])
        });
        history
    }

    fn failing_ledger() -> MockLedgerReader {
        let mut ledger = MockLedgerReader::new();
        ledger
            .expect_signatures()
            .returning(|_, _| Err(LedgerError::Transport("refused".into())));
        ledger
            .expect_transaction()
            .returning(|_| Err(LedgerError::Transport("refused".into())));
        ledger
            .expect_token_mints()
            .returning(|_| Err(LedgerError::Rpc { code: -32005, message: "busy".into() }));
        ledger
    }

    fn failing_history() -> MockPlatformHistory {
        let mut history = MockPlatformHistory::new();
        history
            .expect_obligations()
            .returning(|_| Err(HistoryError::Decode("short".into())));
        history
    }

    #[tokio::test]
    async fn active_account_is_composed() {
        let result = engine(active_ledger(), repaid_history())
            .compute_reputation_score(OWNER)
            .await;

        assert_eq!(result.metrics.wallet_age_days, 365);
        assert_eq!(result.metrics.tx_count, 3);
        assert_eq!(result.metrics.volume, 6.0);
        assert_eq!(result.metrics.unique_token_types, 2);
        assert_eq!(result.metrics.contract_interactions, 1);
        assert_eq!(result.metrics.repayment_ratio, 1.0);
        assert_eq!(result.metrics.inactive_days, 1);
        assert_eq!(
            result.breakdown,
            ScoreBreakdown {
                wallet_age: 15,
                transaction_frequency: 0,
                volume: 0,
                diversity: 2,
                contract_usage: 0,
                repayment_history: 20,
                red_flags: 2,
            }
        );
        // 15 + 0.06 + 0.12 + 2 + 0.1 + 20 - 2
        assert_eq!(result.score, 35);
    }

    #[tokio::test]
    async fn invalid_identifier_returns_fallback() {
        let engine = engine(MockLedgerReader::new(), MockPlatformHistory::new());
        for bad in ["", "not-base58-0OIl", "5rnJ7EdhDZQT4bcJKYdbeUVn94SzU5q8UNit5SSSogN8"] {
            let result = engine.compute_reputation_score(bad).await;
            assert_eq!(result, neutral_result(engine.config()), "input {bad:?}");
        }
    }

    #[tokio::test]
    async fn try_compute_reports_invalid_identifier() {
        let engine = engine(MockLedgerReader::new(), MockPlatformHistory::new());
        let err = engine.try_compute("abc").await.unwrap_err();
        assert!(matches!(err, ScoreError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn total_outage_is_dormant_fallback() {
        let result = engine(failing_ledger(), failing_history())
            .compute_reputation_score(OWNER)
            .await;
        assert_eq!(result.score, 50);
        assert_eq!(result.metrics, RawSignals::zeroed(0.5));
    }

    #[tokio::test]
    async fn half_repaid_history_is_not_dormant() {
        let mut history = MockPlatformHistory::new();
        history.expect_obligations().returning(|_| {
            Ok(vec![Obligation {
                bond: "bond".into(),
                due_lamports: 200,
                repaid_lamports: 100,
            }])
        });
        let engine = engine(failing_ledger(), history);
        let result = engine.compute_reputation_score(OWNER).await;

        assert_ne!(result, neutral_result(engine.config()));
        assert_eq!(result.metrics.repayment_ratio, 0.5);
        assert_eq!(result.breakdown.repayment_history, 10);
        // 10 - (10 inactivity + 5 low activity)
        assert_eq!(result.score, 0);
    }

    #[tokio::test]
    async fn one_failure_degrades_one_signal() {
        let mut ledger = MockLedgerReader::new();
        ledger
            .expect_signatures()
            .returning(|_, _| Ok(vec![sig(0, 1), sig(1, 2), sig(2, 365)]));
        ledger.expect_transaction().returning(|_| Ok(None));
        ledger
            .expect_token_mints()
            .returning(|_| Err(LedgerError::Timeout));

        let result = engine(ledger, repaid_history())
            .compute_reputation_score(OWNER)
            .await;
        assert_eq!(result.metrics.unique_token_types, 0);
        assert_eq!(result.metrics.wallet_age_days, 365);
        assert_eq!(result.metrics.repayment_ratio, 1.0);
    }

    /// Ledger whose token index panics.
    struct PanickingLedger;

    #[async_trait]
    impl LedgerReader for PanickingLedger {
        async fn signatures(
            &self,
            _account: &AccountId,
            _query: SignatureQuery,
        ) -> Result<Vec<SignatureInfo>, LedgerError> {
            Ok(vec![sig(0, 1), sig(1, 30)])
        }

        async fn transaction(&self, _signature: &str) -> Result<Option<TransactionDetail>, LedgerError> {
            Ok(None)
        }

        async fn token_mints(&self, _account: &AccountId) -> Result<Vec<String>, LedgerError> {
            panic!("token index corrupted")
        }
    }

    #[tokio::test]
    async fn panicking_fetch_uses_default() {
        let result = engine(PanickingLedger, repaid_history())
            .compute_reputation_score(OWNER)
            .await;
        assert_eq!(result.metrics.unique_token_types, 0);
        assert_eq!(result.metrics.wallet_age_days, 30);
        assert_eq!(result.metrics.tx_count, 2);
    }

    /// Ledger whose signature queries never finish in time.
    struct StalledLedger;

    #[async_trait]
    impl LedgerReader for StalledLedger {
        async fn signatures(
            &self,
            _account: &AccountId,
            _query: SignatureQuery,
        ) -> Result<Vec<SignatureInfo>, LedgerError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        async fn transaction(&self, _signature: &str) -> Result<Option<TransactionDetail>, LedgerError> {
            Ok(None)
        }

        async fn token_mints(&self, _account: &AccountId) -> Result<Vec<String>, LedgerError> {
            Ok(vec!["m1".into()])
        }
    }

    #[tokio::test]
    async fn cancellation_keeps_resolved_signals() {
        let engine = engine(StalledLedger, repaid_history());
        let result = engine
            .compute_reputation_score_until(OWNER, tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert_eq!(result.metrics.unique_token_types, 1);
        assert_eq!(result.metrics.repayment_ratio, 1.0);
        assert_eq!(result.metrics.tx_count, 0);
        assert_eq!(result.metrics.inactive_days, 182);
        assert_ne!(result, neutral_result(engine.config()));
    }

    #[tokio::test]
    async fn immediate_cancellation_is_dormant() {
        let engine = engine(StalledLedger, failing_history());
        let result = engine
            .compute_reputation_score_until(OWNER, std::future::ready(()))
            .await;
        assert_eq!(result, neutral_result(engine.config()));
    }

    #[tokio::test]
    async fn fetch_timeout_applies_per_signal() {
        let config = ScoringConfig::new().with_fetch_timeout(Duration::from_millis(50));
        let engine = ScoringEngine::new(Arc::new(StalledLedger), Arc::new(repaid_history()), config)
            .unwrap()
            .with_clock(fixed_clock);

        let result = engine.compute_reputation_score(OWNER).await;
        assert_eq!(result.metrics.unique_token_types, 1);
        assert_eq!(result.metrics.wallet_age_days, 0);
        assert_eq!(result.metrics.inactive_days, 182);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ScoringConfig::new();
        config.weights.volume = -0.1;
        let built = ScoringEngine::new(
            Arc::new(MockLedgerReader::new()),
            Arc::new(MockPlatformHistory::new()),
            config,
        );
        assert!(matches!(built, Err(ConfigError::InvalidWeight { name: "volume", .. })));
    }

    #[test]
    fn score_signals_maps_out_of_range_to_defect() {
        let engine = engine(MockLedgerReader::new(), MockPlatformHistory::new());
        let signals = RawSignals {
            tx_count: 10,
            failed_tx_ratio: 2.0,
            ..RawSignals::zeroed(0.5)
        };
        assert!(matches!(
            engine.score_signals(&signals, RepaymentEvidence::Absent),
            Err(ScoreError::ComputationDefect(_))
        ));
    }
}
