//! Cross-ticker leaderboard.
//!
//! Two-stage merge: each ticker contributes at most its local top-N, then
//! the union is ranked globally and truncated. This bounds total work to
//! O(tickers × per-ticker candidates) and stops one volatile ticker from
//! flooding the board by sheer candidate count.

use common::config::TickerConfig;
use common::RankedTrade;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::scan::{rank_order, ScanOutcome, Scanner};

/// Pure merge step: union of per-ticker locals, globally ranked, top-K.
pub fn merge_local_tops(
    locals: Vec<Vec<RankedTrade>>,
    per_ticker_top: usize,
    global_top: usize,
) -> Vec<RankedTrade> {
    let mut merged: Vec<RankedTrade> = locals
        .into_iter()
        .flat_map(|local| local.into_iter().take(per_ticker_top))
        .collect();
    merged.sort_by(rank_order);
    merged.truncate(global_top);
    merged
}

/// Scan the whole universe and build the global board. Tickers whose scans
/// were superseded, errored, or found nothing are simply left off.
pub async fn build_leaderboard(
    scanner: &Scanner,
    universe: &[TickerConfig],
    rng: &mut StdRng,
    per_ticker_top: usize,
    global_top: usize,
) -> Vec<RankedTrade> {
    let mut locals = Vec::with_capacity(universe.len());

    for ticker in universe {
        match scanner.run_scan(&ticker.symbol, ticker.reference_spot, rng).await {
            Ok(ScanOutcome::Completed(report)) => locals.push(report.candidates),
            Ok(ScanOutcome::Superseded) => {
                debug!("{}: scan superseded, skipping for this round", ticker.symbol);
            }
            Err(e) => {
                warn!("{}: scan failed, omitting from leaderboard: {}", ticker.symbol, e);
            }
        }
    }

    merge_local_tops(locals, per_ticker_top, global_top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockManager, LockParams, MemoryLockStore};
    use common::{Breakeven, ScoreBreakdown, StrategyType, Tier, TradeCandidate};
    use rand::SeedableRng;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn ranked(ticker: &str, id: &str, score: f64) -> RankedTrade {
        RankedTrade {
            candidate: TradeCandidate {
                id: id.to_string(),
                strategy_type: StrategyType::BearCallSpread,
                ticker: ticker.to_string(),
                days_to_expiration: 21,
                legs: Vec::new(),
                credit: 1.0,
                max_loss: 4.0,
                breakeven: Breakeven::Single(0.0),
                probability_of_profit: 75.0,
                return_on_risk: 25.0,
            },
            breakdown: ScoreBreakdown {
                score,
                display_score: score.round().clamp(0.0, 100.0) as u32,
                tier: Tier::from_score(score),
                factors: BTreeMap::new(),
                technical_bonus: 0.0,
            },
        }
    }

    /// Locals here are pre-sorted descending, as the scanner guarantees.
    fn local(ticker: &str, scores: &[f64]) -> Vec<RankedTrade> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| ranked(ticker, &format!("{}-{}", ticker, i), s))
            .collect()
    }

    #[test]
    fn merge_keeps_only_local_top_n() {
        let locals = vec![
            local("SPY", &[95.0, 94.0, 93.0, 92.0, 91.0]),
            local("QQQ", &[70.0, 69.0]),
        ];
        let board = merge_local_tops(locals, 3, 10);

        // SPY-3 (92.0) and SPY-4 (91.0) outrank QQQ but sit outside SPY's
        // local top-3, so they must not appear.
        assert_eq!(board.len(), 5);
        assert!(board.iter().all(|t| t.candidate.id != "SPY-3"));
        assert!(board.iter().all(|t| t.candidate.id != "SPY-4"));
        assert_eq!(board[3].candidate.ticker, "QQQ");
    }

    #[test]
    fn board_is_sorted_and_bounded() {
        let locals = vec![
            local("A", &[90.0, 80.0, 70.0]),
            local("B", &[88.0, 78.0, 68.0]),
            local("C", &[86.0, 76.0, 66.0]),
            local("D", &[84.0, 74.0, 64.0]),
        ];
        let board = merge_local_tops(locals, 3, 10);
        assert_eq!(board.len(), 10);
        for pair in board.windows(2) {
            assert!(pair[0].breakdown.score >= pair[1].breakdown.score);
        }
    }

    #[test]
    fn fewer_candidates_than_cap_yields_them_all() {
        let locals = vec![local("A", &[90.0]), local("B", &[80.0])];
        let board = merge_local_tops(locals, 3, 10);
        assert_eq!(board.len(), 2);
    }

    #[tokio::test]
    async fn full_universe_run_respects_the_bound() {
        let scanner = Scanner::new(
            None,
            LockManager::new(Arc::new(MemoryLockStore::new()), LockParams::default()),
        );
        let universe: Vec<_> = [
            ("SPY", 595.0),
            ("QQQ", 520.0),
            ("IWM", 240.0),
            ("AAPL", 235.0),
            ("NVDA", 145.0),
        ]
        .into_iter()
        .map(|(symbol, reference_spot)| TickerConfig {
            symbol: symbol.to_string(),
            reference_spot,
        })
        .collect();

        let mut rng = StdRng::seed_from_u64(21);
        let board = build_leaderboard(&scanner, &universe, &mut rng, 3, 10).await;

        assert!(board.len() <= 10);
        for pair in board.windows(2) {
            assert!(pair[0].breakdown.score >= pair[1].breakdown.score);
        }
        // No ticker may contribute more than its local top-3.
        for ticker in universe.iter().map(|t| t.symbol.as_str()) {
            let contributed = board
                .iter()
                .filter(|t| t.candidate.ticker == ticker)
                .count();
            assert!(contributed <= 3, "{} contributed {}", ticker, contributed);
        }
    }
}
