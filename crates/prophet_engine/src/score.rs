//! Nine-factor weighted scoring with technical bonus and tier mapping.
//!
//! Each factor input is clamped to [0, 100] before weighting; the weighted
//! sum plus the (unweighted) technical bonus forms the raw score. Tier
//! assignment reads the raw value, so the bonus can lift a 98 into the top
//! tier; only the display score is clamped back to [0, 100].

use common::{FactorContribution, FlowSentimentSnapshot, MarketSnapshot, ScoreBreakdown, Tier, TradeCandidate};
use std::collections::BTreeMap;

const W_IV_PERCENTILE: f64 = 0.20;
const W_VIX_REGIME: f64 = 0.20;
const W_IV_HV_SPREAD: f64 = 0.15;
const W_POP: f64 = 0.15;
const W_CREDIT_TO_RISK: f64 = 0.10;
const W_TERM_STRUCTURE: f64 = 0.08;
const W_FLOW_NEUTRALITY: f64 = 0.05;
const W_PUT_CALL_BALANCE: f64 = 0.05;
const W_EARNINGS_DISTANCE: f64 = 0.02;

fn push_factor(
    factors: &mut BTreeMap<String, FactorContribution>,
    weighted_sum: &mut f64,
    name: &str,
    weight: f64,
    raw: f64,
) {
    let score = raw.clamp(0.0, 100.0);
    let contribution = score * weight;
    factors.insert(
        name.to_string(),
        FactorContribution {
            score,
            weight,
            contribution,
        },
    );
    *weighted_sum += contribution;
}

/// Contango keeps premium sellers paid; backwardation gets penalized more
/// steeply than contango is rewarded.
fn term_structure_score(slope: f64) -> f64 {
    if slope >= 0.0 {
        (70.0 + slope * 30.0).min(100.0)
    } else {
        (70.0 + slope * 80.0).max(0.0)
    }
}

/// A VIX hovering near 20 is the selling sweet spot; both a sleepy tape and
/// a panic tape score down from there.
fn vix_regime_score(vix: f64) -> f64 {
    100.0 - (vix - 20.0).abs() * 5.0
}

/// Score one candidate against the market and flow snapshots. Pure and
/// total over enumerator output: the enumerator guarantees `max_loss > 0`.
pub fn score_candidate(
    candidate: &TradeCandidate,
    market: &MarketSnapshot,
    flow: &FlowSentimentSnapshot,
) -> ScoreBreakdown {
    let mut factors = BTreeMap::new();
    let mut weighted_sum = 0.0;

    push_factor(
        &mut factors,
        &mut weighted_sum,
        "iv_percentile",
        W_IV_PERCENTILE,
        market.iv_percentile.min(100.0),
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "vix_regime",
        W_VIX_REGIME,
        vix_regime_score(market.vix),
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "iv_hv_spread",
        W_IV_HV_SPREAD,
        ((market.implied_volatility - market.realized_volatility + 20.0) / 40.0).clamp(0.0, 1.0)
            * 100.0,
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "probability_of_profit",
        W_POP,
        candidate.probability_of_profit.min(100.0),
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "credit_to_risk",
        W_CREDIT_TO_RISK,
        (candidate.credit / candidate.max_loss * 200.0).min(100.0),
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "term_structure",
        W_TERM_STRUCTURE,
        term_structure_score(market.term_structure_slope),
    );
    // Premium selling wants range-bound flow, so neutral sentiment scores highest.
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "flow_neutrality",
        W_FLOW_NEUTRALITY,
        100.0 - flow.sentiment.abs() as f64,
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "put_call_balance",
        W_PUT_CALL_BALANCE,
        (100.0 - (market.put_call_ratio - 1.0).abs() * 50.0).max(0.0),
    );
    push_factor(
        &mut factors,
        &mut weighted_sum,
        "earnings_distance",
        W_EARNINGS_DISTANCE,
        if market.days_to_earnings > 7 {
            100.0
        } else {
            market.days_to_earnings as f64 / 7.0 * 100.0
        },
    );

    let mut technical_bonus = 0.0;
    if (40.0..=60.0).contains(&market.rsi) {
        technical_bonus += 3.0;
    }
    if market.price_in_bollinger_bands {
        technical_bonus += 2.0;
    }

    let score = weighted_sum + technical_bonus;
    ScoreBreakdown {
        score,
        display_score: score.round().clamp(0.0, 100.0) as u32,
        tier: Tier::from_score(score),
        factors,
        technical_bonus,
    }
}
