//! Per-ticker scan orchestration.
//!
//! One scan: synthesize snapshot + flow → merge optional live overrides →
//! enumerate → score → rank → reconcile the stability lock. The provider
//! call is the only await point. A monotonic per-ticker sequence number
//! detects scans that were superseded while waiting on the provider; their
//! results are discarded before they can touch the lock.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use common::{FlowSentimentSnapshot, LockedTradeSet, MarketSnapshot, RankedTrade, Result};
use dashmap::DashMap;
use market_data_client::MarketDataProvider;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::enumerate::generate_all_candidates;
use crate::lock::LockManager;
use crate::score::score_candidate;
use crate::snapshot::{apply_live_overrides, synthesize_flow, synthesize_snapshot};

/// Everything one completed scan produced.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub snapshot: MarketSnapshot,
    pub flow: FlowSentimentSnapshot,
    /// All admitted candidates, scored, sorted descending by raw score.
    pub candidates: Vec<RankedTrade>,
    /// The lock record presented to callers (post-reconcile).
    pub locked: Option<LockedTradeSet>,
}

/// A scan either completes or is quietly superseded by a newer one.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed(ScanReport),
    Superseded,
}

pub struct Scanner {
    provider: Option<Arc<dyn MarketDataProvider>>,
    locks: LockManager,
    seq: DashMap<String, u64>,
}

impl Scanner {
    pub fn new(provider: Option<Arc<dyn MarketDataProvider>>, locks: LockManager) -> Self {
        Self {
            provider,
            locks,
            seq: DashMap::new(),
        }
    }

    fn begin_scan(&self, ticker: &str) -> u64 {
        let mut entry = self.seq.entry(ticker.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    fn is_latest(&self, ticker: &str, seq: u64) -> bool {
        self.seq.get(ticker).map(|v| *v).unwrap_or(0) == seq
    }

    /// Run the full pipeline for one ticker. `reference_spot` seeds the
    /// synthesized snapshot; a live provider quote may override it.
    pub async fn run_scan(
        &self,
        ticker: &str,
        reference_spot: f64,
        rng: &mut StdRng,
    ) -> Result<ScanOutcome> {
        let seq = self.begin_scan(ticker);

        let mut snapshot = synthesize_snapshot(ticker, reference_spot, rng);
        let flow = synthesize_flow(rng);

        if let Some(provider) = &self.provider {
            match provider.fetch(ticker).await {
                Ok(live) => snapshot = apply_live_overrides(snapshot, &live),
                Err(e) => {
                    // Absorbed: downstream output is just labeled simulated.
                    warn!("{}: live data unavailable, using simulated snapshot: {}", ticker, e);
                }
            }
        }

        if !self.is_latest(ticker, seq) {
            debug!("{}: scan {} superseded during fetch, discarding", ticker, seq);
            return Ok(ScanOutcome::Superseded);
        }

        let mut candidates: Vec<RankedTrade> = generate_all_candidates(&snapshot)?
            .into_iter()
            .map(|candidate| {
                let breakdown = score_candidate(&candidate, &snapshot, &flow);
                RankedTrade {
                    candidate,
                    breakdown,
                }
            })
            .collect();
        candidates.sort_by(rank_order);

        // Last check before the only stateful step.
        if !self.is_latest(ticker, seq) {
            debug!("{}: scan {} superseded before lock commit, discarding", ticker, seq);
            return Ok(ScanOutcome::Superseded);
        }

        let top: Vec<RankedTrade> = candidates
            .iter()
            .take(self.locks.params().top_n)
            .cloned()
            .collect();
        let outcome = self.locks.reconcile_and_store(ticker, &top, Utc::now())?;

        debug!(
            "{}: scan {} complete — {} candidates, top score {:.1}",
            ticker,
            seq,
            candidates.len(),
            candidates.first().map(|t| t.breakdown.score).unwrap_or(0.0)
        );

        Ok(ScanOutcome::Completed(ScanReport {
            snapshot,
            flow,
            candidates,
            locked: outcome.lock,
        }))
    }
}

/// Descending by raw score, ties broken by id for a stable order.
pub fn rank_order(a: &RankedTrade, b: &RankedTrade) -> Ordering {
    b.breakdown
        .score
        .partial_cmp(&a.breakdown.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockParams, MemoryLockStore};
    use async_trait::async_trait;
    use common::Error;
    use market_data_client::LiveVolStats;
    use rand::SeedableRng;
    use tokio::sync::Notify;

    fn scanner(provider: Option<Arc<dyn MarketDataProvider>>) -> Scanner {
        Scanner::new(
            provider,
            LockManager::new(Arc::new(MemoryLockStore::new()), LockParams::default()),
        )
    }

    struct FailingProvider;

    #[async_trait]
    impl MarketDataProvider for FailingProvider {
        async fn fetch(&self, _ticker: &str) -> Result<LiveVolStats> {
            Err(Error::DataUnavailable("provider down".into()))
        }
    }

    /// Parks inside `fetch` until released, so tests can interleave scans.
    struct GatedProvider {
        entered: Notify,
        release: Notify,
    }

    impl GatedProvider {
        fn new() -> Self {
            Self {
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for GatedProvider {
        async fn fetch(&self, _ticker: &str) -> Result<LiveVolStats> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(LiveVolStats::default())
        }
    }

    #[tokio::test]
    async fn scan_completes_sorted_and_locked() {
        let scanner = scanner(None);
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = scanner.run_scan("SPY", 595.0, &mut rng).await.unwrap();
        let report = match outcome {
            ScanOutcome::Completed(report) => report,
            ScanOutcome::Superseded => panic!("single scan cannot be superseded"),
        };

        assert!(!report.candidates.is_empty());
        for pair in report.candidates.windows(2) {
            assert!(pair[0].breakdown.score >= pair[1].breakdown.score);
        }

        let locked = report.locked.expect("first scan must take the lock");
        assert_eq!(locked.ticker, "SPY");
        assert!(locked.trades.len() <= 3);
        assert_eq!(
            locked.trades[0].candidate.id,
            report.candidates[0].candidate.id
        );
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_simulated() {
        let scanner = scanner(Some(Arc::new(FailingProvider)));
        let mut rng = StdRng::seed_from_u64(12);
        let outcome = scanner.run_scan("QQQ", 520.0, &mut rng).await.unwrap();
        match outcome {
            ScanOutcome::Completed(report) => {
                assert_eq!(
                    report.snapshot.provenance,
                    common::DataProvenance::Simulated
                );
            }
            ScanOutcome::Superseded => panic!("no competing scan"),
        }
    }

    #[tokio::test]
    async fn stale_scan_is_superseded() {
        let gate = Arc::new(GatedProvider::new());
        let scanner = scanner(Some(gate.clone()));

        let mut rng_old = StdRng::seed_from_u64(13);
        let old_scan = scanner.run_scan("SPY", 595.0, &mut rng_old);
        tokio::pin!(old_scan);

        // Drive the first scan until it parks inside the provider call.
        tokio::select! {
            biased;
            _ = &mut old_scan => panic!("scan finished while gated"),
            _ = gate.entered.notified() => {}
        }

        // A newer scan arrives for the same ticker.
        let _newer = scanner.begin_scan("SPY");

        gate.release.notify_one();
        match old_scan.await.unwrap() {
            ScanOutcome::Superseded => {}
            ScanOutcome::Completed(_) => panic!("stale scan must be discarded"),
        }
    }

    #[tokio::test]
    async fn scans_for_different_tickers_do_not_interfere() {
        let scanner = scanner(None);
        let mut rng = StdRng::seed_from_u64(14);
        let spy = scanner.run_scan("SPY", 595.0, &mut rng).await.unwrap();
        let qqq = scanner.run_scan("QQQ", 520.0, &mut rng).await.unwrap();
        assert!(matches!(spy, ScanOutcome::Completed(_)));
        assert!(matches!(qqq, ScanOutcome::Completed(_)));
    }
}
