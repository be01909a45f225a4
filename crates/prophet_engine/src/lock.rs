//! Stability lock: hysteresis and TTL over per-ticker top-3 sets.
//!
//! Recommendations are recomputed on every poll, but a briefing that swaps
//! its "best trade" every few seconds is useless. The lock freezes the
//! top-3 for a TTL window unless a new scan beats the locked top score by
//! the jump threshold. The policy itself is a pure function; persistence
//! goes through the injected `LockStore`, and `LockManager` serializes the
//! read-modify-write per ticker key.

use chrono::{DateTime, Duration, Utc};
use common::{Error, LockedTradeSet, RankedTrade, Result};
use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Policy tuning, derived from `LockConfig`.
#[derive(Debug, Clone, Copy)]
pub struct LockParams {
    pub ttl: Duration,
    /// Minimum top-score improvement that breaks an unexpired lock.
    pub score_jump: f64,
    /// How many trades a lock freezes.
    pub top_n: usize,
}

impl Default for LockParams {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            score_jump: 8.0,
            top_n: 3,
        }
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    pub lock: Option<LockedTradeSet>,
    /// True on the hold path: the prior lock was returned unchanged.
    pub still_valid: bool,
    /// Set when the lock was taken or replaced this round.
    pub refresh_reason: Option<String>,
}

fn take_lock(
    ticker: &str,
    top: &[RankedTrade],
    now: DateTime<Utc>,
    params: LockParams,
    reason: &str,
) -> LockedTradeSet {
    LockedTradeSet {
        ticker: ticker.to_string(),
        trades: top.iter().take(params.top_n).cloned().collect(),
        locked_at: now,
        valid_until: now + params.ttl,
        reason: reason.to_string(),
    }
}

fn hold(prior: &LockedTradeSet) -> LockOutcome {
    LockOutcome {
        lock: Some(prior.clone()),
        still_valid: true,
        refresh_reason: None,
    }
}

/// Decide whether a freshly ranked top-N replaces the prior lock. Pure:
/// the caller supplies `now` and performs any persistence.
pub fn reconcile(
    ticker: &str,
    top: &[RankedTrade],
    prior: Option<&LockedTradeSet>,
    now: DateTime<Utc>,
    params: LockParams,
) -> LockOutcome {
    let Some(prior) = prior else {
        if top.is_empty() {
            // Nothing to lock and nothing held — stay unlocked.
            return LockOutcome {
                lock: None,
                still_valid: false,
                refresh_reason: None,
            };
        }
        let reason = "initial lock";
        return LockOutcome {
            lock: Some(take_lock(ticker, top, now, params, reason)),
            still_valid: false,
            refresh_reason: Some(reason.to_string()),
        };
    };

    if top.is_empty() {
        // A scan that found nothing never evicts an existing lock.
        return hold(prior);
    }

    if now > prior.valid_until {
        let reason = "24h refresh";
        return LockOutcome {
            lock: Some(take_lock(ticker, top, now, params, reason)),
            still_valid: false,
            refresh_reason: Some(reason.to_string()),
        };
    }

    let prior_top = prior
        .trades
        .first()
        .map(|t| t.breakdown.score)
        .unwrap_or(f64::NEG_INFINITY);
    let delta = top[0].breakdown.score - prior_top;
    if delta >= params.score_jump {
        let reason = format!("+{:.1} score jump", delta);
        return LockOutcome {
            lock: Some(take_lock(ticker, top, now, params, &reason)),
            still_valid: false,
            refresh_reason: Some(reason),
        };
    }

    hold(prior)
}

// ── Persistence ───────────────────────────────────────────────────────

/// Keyed persistence for lock records. Injected so the policy is testable
/// without a real store.
pub trait LockStore: Send + Sync {
    fn get(&self, ticker: &str) -> Result<Option<LockedTradeSet>>;
    fn put(&self, ticker: &str, lock: &LockedTradeSet) -> Result<()>;
}

/// In-memory store, the default.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    inner: DashMap<String, LockedTradeSet>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn get(&self, ticker: &str) -> Result<Option<LockedTradeSet>> {
        Ok(self.inner.get(ticker).map(|entry| entry.clone()))
    }

    fn put(&self, ticker: &str, lock: &LockedTradeSet) -> Result<()> {
        self.inner.insert(ticker.to_string(), lock.clone());
        Ok(())
    }
}

/// One JSON file per ticker under a directory.
#[derive(Debug, Clone)]
pub struct FileLockStore {
    dir: PathBuf,
}

impl FileLockStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        // Tickers are plain symbols; keep the filename boring anyway.
        let safe: String = ticker
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl LockStore for FileLockStore {
    fn get(&self, ticker: &str) -> Result<Option<LockedTradeSet>> {
        match fs::read_to_string(self.path_for(ticker)) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, ticker: &str, lock: &LockedTradeSet) -> Result<()> {
        let raw = serde_json::to_string_pretty(lock)?;
        fs::write(self.path_for(ticker), raw)?;
        Ok(())
    }
}

/// Owns the per-ticker read-modify-write. Two concurrent scans for the same
/// ticker cannot both observe UNLOCKED and both write.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    params: LockParams,
    guards: DashMap<String, Arc<Mutex<()>>>,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>, params: LockParams) -> Self {
        Self {
            store,
            params,
            guards: DashMap::new(),
        }
    }

    pub fn params(&self) -> LockParams {
        self.params
    }

    /// Atomically reconcile and persist for one ticker. The hold path does
    /// not write back, so repeated non-qualifying scans leave the stored
    /// record byte-identical.
    pub fn reconcile_and_store(
        &self,
        ticker: &str,
        top: &[RankedTrade],
        now: DateTime<Utc>,
    ) -> Result<LockOutcome> {
        let guard = self
            .guards
            .entry(ticker.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = guard
            .lock()
            .map_err(|_| Error::LockStore(format!("{}: lock guard poisoned", ticker)))?;

        let prior = self.store.get(ticker)?;
        let outcome = reconcile(ticker, top, prior.as_ref(), now, self.params);

        if outcome.still_valid {
            debug!("{}: lock held (still valid)", ticker);
        } else if let Some(lock) = &outcome.lock {
            self.store.put(ticker, lock)?;
            info!(
                "{}: lock {} ({} trades, valid until {})",
                ticker,
                outcome.refresh_reason.as_deref().unwrap_or("updated"),
                lock.trades.len(),
                lock.valid_until
            );
        }

        Ok(outcome)
    }
}
