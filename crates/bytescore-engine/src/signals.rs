//! Activity signal fetchers.
//!
//! Each public fetcher resolves to exactly one signal value. The fallible
//! work lives in a private `try_*` twin; the public function bounds it with
//! the configured timeout and substitutes the documented default on any
//! failure, logging at `warn!`. Wallet age spreads one deadline over its
//! history pages instead.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use bytescore_core::account::AccountId;
use bytescore_core::config::SamplingConfig;
use bytescore_core::constants::{LAMPORTS_PER_SOL, SECS_PER_DAY, SYSTEM_PROGRAM_ID};
use bytescore_core::error::LedgerError;
use bytescore_core::traits::LedgerReader;
use bytescore_core::types::{SignatureInfo, SignatureQuery};
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Signal values
// ---------------------------------------------------------------------------

/// Transaction count and sampled volume.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TxActivity {
    pub count: u64,
    /// Native units.
    pub volume: f64,
}

/// Inputs to the red-flag penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedFlagInputs {
    pub failed_tx_ratio: f64,
    pub inactive_days: u64,
}

impl RedFlagInputs {
    /// Conservative default when the history cannot be read.
    pub fn unknown(sampling: &SamplingConfig) -> Self {
        Self {
            failed_tx_ratio: 0.0,
            inactive_days: sampling.default_inactive_days,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run `fut` with a deadline. Elapsing maps to [`LedgerError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(LedgerError::Timeout))
}

/// Whole days from `then` to `now`, rounded to nearest, never negative.
pub fn days_between(now: i64, then: i64) -> u64 {
    let secs = now.saturating_sub(then).max(0);
    (secs as f64 / SECS_PER_DAY as f64).round() as u64
}

/// Convert lamports to native units.
pub fn lamports_to_native(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

// ---------------------------------------------------------------------------
// Wallet age
// ---------------------------------------------------------------------------

/// Days since the account's earliest recorded activity; `0` if none is found
/// or the history cannot be read.
pub async fn wallet_age_days(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
    now: i64,
) -> u64 {
    match try_oldest_block_time(ledger, account, sampling).await {
        Ok(Some(oldest)) => {
            let days = days_between(now, oldest);
            debug!(%account, days, "signals: wallet age");
            days
        }
        Ok(None) => 0,
        Err(e) => {
            warn!(%account, error = %e, "signals: wallet age fetch failed, using 0");
            0
        }
    }
}

/// Walk the history backwards and return the oldest block time seen.
///
/// Stops at a short page, an empty page, or after `history_max_pages`; very
/// old accounts are therefore dated by the oldest signature reachable within
/// the page budget. The whole walk shares one `fetch_timeout` deadline. A
/// page that fails or runs past it ends the walk early, keeping whatever
/// was already seen; it is an error only if nothing was.
async fn try_oldest_block_time(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> Result<Option<i64>, LedgerError> {
    let deadline = Instant::now() + sampling.fetch_timeout;
    let mut oldest = None;
    let mut query = SignatureQuery::latest(sampling.history_page_size);

    for page in 0..sampling.history_max_pages {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let sigs = match bounded(remaining, ledger.signatures(account, query.clone())).await {
            Ok(sigs) => sigs,
            Err(e) if oldest.is_some() => {
                warn!(%account, page, error = %e, "signals: wallet age walk cut short, using oldest seen");
                break;
            }
            Err(e) => return Err(e),
        };
        if let Some(t) = sigs.iter().rev().find_map(|s| s.block_time) {
            oldest = Some(oldest.map_or(t, |o: i64| o.min(t)));
        }
        let Some(last) = sigs.last() else { break };
        if sigs.len() < sampling.history_page_size {
            break;
        }
        debug!(%account, page, "signals: wallet age paging");
        query = SignatureQuery::before(sampling.history_page_size, last.signature.clone());
    }

    Ok(oldest)
}

// ---------------------------------------------------------------------------
// Transaction frequency and volume
// ---------------------------------------------------------------------------

/// Count over the recent window and volume over its newest sub-sample.
/// `0`/`0.0` if the signature list cannot be read.
pub async fn tx_activity(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> TxActivity {
    match bounded(sampling.fetch_timeout, try_tx_activity(ledger, account, sampling)).await {
        Ok(activity) => {
            debug!(%account, count = activity.count, volume = activity.volume, "signals: tx activity");
            activity
        }
        Err(e) => {
            warn!(%account, error = %e, "signals: tx activity fetch failed, using 0");
            TxActivity::default()
        }
    }
}

async fn try_tx_activity(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> Result<TxActivity, LedgerError> {
    let sigs = ledger
        .signatures(account, SignatureQuery::latest(sampling.tx_window))
        .await?;

    // A single unreadable transaction contributes nothing.
    let deltas = join_all(
        sigs.iter()
            .take(sampling.volume_sample)
            .map(|s| sample_delta(ledger, account, s)),
    )
    .await;
    let lamports: u64 = deltas.into_iter().fold(0u64, |acc, d| acc.saturating_add(d));

    Ok(TxActivity {
        count: sigs.len() as u64,
        volume: lamports_to_native(lamports),
    })
}

async fn sample_delta(ledger: &dyn LedgerReader, account: &AccountId, sig: &SignatureInfo) -> u64 {
    match ledger.transaction(&sig.signature).await {
        Ok(Some(tx)) => tx.balance_delta(account.as_str()).unwrap_or(0),
        Ok(None) => 0,
        Err(e) => {
            debug!(signature = %sig.signature, error = %e, "signals: skipping unreadable transaction");
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Token diversity
// ---------------------------------------------------------------------------

/// Distinct token mints held by the account; `0` on failure.
pub async fn unique_token_types(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> u64 {
    let fetch = async {
        let mints = ledger.token_mints(account).await?;
        Ok::<_, LedgerError>(mints.iter().collect::<HashSet<_>>().len() as u64)
    };
    match bounded(sampling.fetch_timeout, fetch).await {
        Ok(n) => {
            debug!(%account, tokens = n, "signals: token diversity");
            n
        }
        Err(e) => {
            warn!(%account, error = %e, "signals: token fetch failed, using 0");
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Contract usage
// ---------------------------------------------------------------------------

/// Distinct non-system programs invoked in the newest sampled transactions;
/// `0` on failure.
pub async fn contract_interactions(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> u64 {
    match bounded(sampling.fetch_timeout, try_contract_interactions(ledger, account, sampling)).await {
        Ok(n) => {
            debug!(%account, programs = n, "signals: contract usage");
            n
        }
        Err(e) => {
            warn!(%account, error = %e, "signals: contract usage fetch failed, using 0");
            0
        }
    }
}

async fn try_contract_interactions(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
) -> Result<u64, LedgerError> {
    let sigs = ledger
        .signatures(account, SignatureQuery::latest(sampling.contract_window))
        .await?;

    let mut programs = HashSet::new();
    for sig in sigs.iter().take(sampling.contract_sample) {
        match ledger.transaction(&sig.signature).await {
            Ok(Some(tx)) => programs.extend(tx.program_ids),
            Ok(None) => {}
            Err(e) => {
                debug!(signature = %sig.signature, error = %e, "signals: skipping unreadable transaction");
            }
        }
    }
    programs.remove(SYSTEM_PROGRAM_ID);

    Ok(programs.len() as u64)
}

// ---------------------------------------------------------------------------
// Red-flag inputs
// ---------------------------------------------------------------------------

/// Failure ratio and inactivity over the recent window.
pub async fn red_flag_inputs(
    ledger: &dyn LedgerReader,
    account: &AccountId,
    sampling: &SamplingConfig,
    now: i64,
) -> RedFlagInputs {
    let fetch = ledger.signatures(account, SignatureQuery::latest(sampling.red_flag_window));
    match bounded(sampling.fetch_timeout, fetch).await {
        Ok(sigs) => {
            let inputs = red_flags_from(&sigs, sampling, now);
            debug!(
                %account,
                failed_ratio = inputs.failed_tx_ratio,
                inactive_days = inputs.inactive_days,
                "signals: red-flag inputs"
            );
            inputs
        }
        Err(e) => {
            warn!(%account, error = %e, "signals: red-flag fetch failed, using defaults");
            RedFlagInputs::unknown(sampling)
        }
    }
}

/// Derive red-flag inputs from a newest-first signature list.
pub fn red_flags_from(sigs: &[SignatureInfo], sampling: &SamplingConfig, now: i64) -> RedFlagInputs {
    let failed_tx_ratio = if sigs.is_empty() {
        0.0
    } else {
        sigs.iter().filter(|s| s.failed).count() as f64 / sigs.len() as f64
    };
    let inactive_days = match sigs.first().and_then(|s| s.block_time) {
        Some(newest) => days_between(now, newest),
        None => sampling.default_inactive_days,
    };
    RedFlagInputs {
        failed_tx_ratio,
        inactive_days,
    }
}
