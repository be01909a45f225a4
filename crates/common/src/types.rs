//! Domain types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Market features ───────────────────────────────────────────────────

/// Where a snapshot's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProvenance {
    /// Fully synthesized — no live provider data was merged in.
    Simulated,
    /// At least one field was overridden by the live provider.
    Live,
}

/// Volatility skew summary for one expiration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewProfile {
    /// IV of the ~25-delta OTM put, in percent.
    pub otm_put_iv: f64,
    /// IV of the ~25-delta OTM call, in percent.
    pub otm_call_iv: f64,
    /// Put-minus-call IV slope, normalized.
    pub slope: f64,
}

/// Per-ticker feature vector at a point in time. Immutable once produced;
/// request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub spot_price: f64,
    /// ATM implied volatility, percent.
    pub implied_volatility: f64,
    /// IV percentile over the trailing window, 0–100.
    pub iv_percentile: f64,
    /// Realized (historical) volatility, percent.
    pub realized_volatility: f64,
    pub vix: f64,
    /// Positive = contango, negative = backwardation.
    pub term_structure_slope: f64,
    pub put_call_ratio: f64,
    pub days_to_earnings: u32,
    /// 0–100.
    pub rsi: f64,
    pub price_in_bollinger_bands: bool,
    pub skew: SkewProfile,
    pub provenance: DataProvenance,
}

/// Aggregate unusual-options-activity sentiment. Ephemeral, regenerated per
/// scan alongside the market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSentimentSnapshot {
    /// −100 (max bearish) .. +100 (max bullish).
    pub sentiment: i32,
    pub bullish_flow: f64,
    pub bearish_flow: f64,
    pub unusual_trade_count: u32,
}

// ── Candidates ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegAction {
    Sell,
    Buy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

/// One leg of a multi-leg strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub action: LegAction,
    pub option_type: OptionType,
    pub strike: f64,
    pub delta_approx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    BullPutSpread,
    BearCallSpread,
    IronCondor,
}

impl StrategyType {
    /// Short code used in deterministic candidate ids.
    pub fn code(&self) -> &'static str {
        match self {
            StrategyType::BullPutSpread => "BPS",
            StrategyType::BearCallSpread => "BCS",
            StrategyType::IronCondor => "IC",
        }
    }
}

/// Breakeven price(s) — a scalar for verticals, a band for condors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakeven {
    Single(f64),
    Range { lower: f64, upper: f64 },
}

/// A fully specified multi-leg credit strategy. Created during enumeration,
/// scored immediately, discarded after ranking.
///
/// Invariants upheld by the enumerator: `credit > 0`, `max_loss > 0`, and
/// the admission filters on credit and probability of profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    /// Deterministic from strategy type + DTE + short strike(s) + width.
    pub id: String,
    pub strategy_type: StrategyType,
    pub ticker: String,
    pub days_to_expiration: u32,
    pub legs: Vec<OptionLeg>,
    pub credit: f64,
    pub max_loss: f64,
    pub breakeven: Breakeven,
    /// Percent, delta-derived proxy.
    pub probability_of_profit: f64,
    /// credit / max_loss, percent.
    pub return_on_risk: f64,
}

// ── Scoring ───────────────────────────────────────────────────────────

/// Discrete quality label derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Weak,
    Moderate,
    Strong,
    HighEdge,
    GodTier,
}

impl Tier {
    /// Tier is assigned from the raw (pre-display-clamp) score, so a bonus
    /// that pushes the raw value past 100 still maps to `GodTier`.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Tier::GodTier
        } else if score >= 85.0 {
            Tier::HighEdge
        } else if score >= 75.0 {
            Tier::Strong
        } else if score >= 60.0 {
            Tier::Moderate
        } else {
            Tier::Weak
        }
    }
}

/// One factor's input score, weight, and weighted contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    /// Clamped to [0, 100] before weighting.
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Output of the scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Raw score: weighted factor sum plus technical bonus. May exceed 100
    /// slightly; tier assignment uses this value.
    pub score: f64,
    /// Rounded and clamped to [0, 100] for presentation.
    pub display_score: u32,
    pub tier: Tier,
    /// Keyed by factor name; BTreeMap keeps serialization order stable.
    pub factors: BTreeMap<String, FactorContribution>,
    pub technical_bonus: f64,
}

/// A scored candidate, the unit that rankings and locks operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTrade {
    pub candidate: TradeCandidate,
    pub breakdown: ScoreBreakdown,
}

// ── Stability lock ────────────────────────────────────────────────────

/// Per-ticker stability record. Replaced wholesale by the lock policy,
/// never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedTradeSet {
    pub ticker: String,
    /// Top-3 at lock time.
    pub trades: Vec<RankedTrade>,
    pub locked_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// Why this lock was (re)taken, e.g. "24h refresh" or "+9.0 score jump".
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_partition_the_score_range() {
        assert_eq!(Tier::from_score(90.0), Tier::GodTier);
        assert_eq!(Tier::from_score(89.999), Tier::HighEdge);
        assert_eq!(Tier::from_score(85.0), Tier::HighEdge);
        assert_eq!(Tier::from_score(84.999), Tier::Strong);
        assert_eq!(Tier::from_score(75.0), Tier::Strong);
        assert_eq!(Tier::from_score(74.999), Tier::Moderate);
        assert_eq!(Tier::from_score(60.0), Tier::Moderate);
        assert_eq!(Tier::from_score(59.999), Tier::Weak);
        assert_eq!(Tier::from_score(0.0), Tier::Weak);
        // Raw scores past 100 (bonus overflow) stay in the top tier.
        assert_eq!(Tier::from_score(103.2), Tier::GodTier);
    }

    #[test]
    fn tier_is_monotone_in_score() {
        let mut prev = Tier::from_score(0.0);
        let mut score = 0.0;
        while score <= 105.0 {
            let tier = Tier::from_score(score);
            assert!(tier >= prev, "tier regressed at score {}", score);
            prev = tier;
            score += 0.25;
        }
    }

    #[test]
    fn breakeven_serializes_by_shape() {
        let single = serde_json::to_value(Breakeven::Single(582.5)).unwrap();
        let range = serde_json::to_value(Breakeven::Range {
            lower: 578.0,
            upper: 611.0,
        })
        .unwrap();
        assert_eq!(single["single"], 582.5);
        assert_eq!(range["range"]["lower"], 578.0);
        assert_eq!(range["range"]["upper"], 611.0);
    }
}
