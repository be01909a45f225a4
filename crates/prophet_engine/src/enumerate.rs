//! Candidate enumeration over the {DTE × delta × width} grid.
//!
//! One parametrized credit-spread primitive (put side / call side) covers
//! both verticals and composes into iron condors, instead of three copies
//! of the same grid walk. Pure and deterministic given the snapshot.

use common::{
    Breakeven, Error, LegAction, MarketSnapshot, OptionLeg, OptionType, Result, StrategyType,
    TradeCandidate,
};
use std::collections::HashSet;

pub const DTE_GRID: [u32; 6] = [7, 14, 21, 30, 45, 60];
pub const DELTA_GRID: [f64; 6] = [0.10, 0.15, 0.20, 0.25, 0.30, 0.35];
pub const WIDTH_GRID: [f64; 5] = [3.0, 5.0, 10.0, 15.0, 20.0];

/// Condors walk a narrower subset of the grid to bound the blow-up.
pub const CONDOR_DELTA_COUNT: usize = 4;
pub const CONDOR_WIDTH_COUNT: usize = 3;

/// Admission filters. Candidates below these never leave the enumerator.
pub const MIN_VERTICAL_CREDIT: f64 = 0.30;
pub const MIN_CONDOR_CREDIT: f64 = 0.80;
pub const MIN_VERTICAL_POP: f64 = 65.0;
pub const MIN_CONDOR_POP: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpreadSide {
    Put,
    Call,
}

/// Internal result of pricing one vertical at a grid point.
#[derive(Debug, Clone, Copy)]
struct CreditSpread {
    short_strike: f64,
    long_strike: f64,
    credit: f64,
}

fn round_to_5(value: f64) -> f64 {
    (value / 5.0).round() * 5.0
}

/// Volatility-time scale: annualized IV shrunk to the option's horizon.
fn sigma_t(iv_pct: f64, dte: u32) -> f64 {
    (iv_pct / 100.0) * (dte as f64 / 365.0).sqrt()
}

/// Black-Scholes-free leg price approximation: ATM value decays linearly
/// with moneyness and hits zero 12.5% out.
fn leg_price(spot: f64, strike: f64, st: f64) -> f64 {
    let moneyness = (spot - strike).abs() / spot;
    spot * st * 0.4 * (1.0 - moneyness * 8.0).max(0.0)
}

/// Price one credit vertical. The short strike sits a vol-scaled distance
/// `1.5·delta·sigma_t` from spot (rounded to the nearest 5); the long
/// strike is one width further out. Credit comes from the post-rounding
/// strikes, so grid points that collapse under rounding price honestly.
fn build_spread(spot: f64, st: f64, delta: f64, width: f64, side: SpreadSide) -> Option<CreditSpread> {
    let offset = 1.5 * delta * st;
    let short_strike = match side {
        SpreadSide::Put => round_to_5(spot * (1.0 - offset)),
        SpreadSide::Call => round_to_5(spot * (1.0 + offset)),
    };
    if short_strike <= 0.0 {
        return None;
    }

    let long_strike = match side {
        SpreadSide::Put => short_strike - width,
        SpreadSide::Call => short_strike + width,
    };
    if long_strike <= 0.0 {
        return None;
    }

    let credit = (leg_price(spot, short_strike, st) - leg_price(spot, long_strike, st)).max(0.0);
    Some(CreditSpread {
        short_strike,
        long_strike,
        credit,
    })
}

fn vertical_legs(spread: &CreditSpread, option_type: OptionType, delta: f64) -> Vec<OptionLeg> {
    vec![
        OptionLeg {
            action: LegAction::Sell,
            option_type,
            strike: spread.short_strike,
            delta_approx: delta,
        },
        OptionLeg {
            action: LegAction::Buy,
            option_type,
            strike: spread.long_strike,
            delta_approx: delta * 0.5,
        },
    ]
}

/// Enumerate every admissible candidate for the snapshot. Empty output is
/// a valid terminal state; only a non-positive spot is an error.
pub fn generate_all_candidates(snapshot: &MarketSnapshot) -> Result<Vec<TradeCandidate>> {
    let spot = snapshot.spot_price;
    if spot <= 0.0 {
        return Err(Error::InvalidSpot(spot));
    }

    let iv = snapshot.implied_volatility;
    let ticker = &snapshot.ticker;
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for &dte in &DTE_GRID {
        let st = sigma_t(iv, dte);

        for (delta_idx, &delta) in DELTA_GRID.iter().enumerate() {
            for (width_idx, &width) in WIDTH_GRID.iter().enumerate() {
                let put = build_spread(spot, st, delta, width, SpreadSide::Put);
                let call = build_spread(spot, st, delta, width, SpreadSide::Call);
                let vertical_pop = (1.0 - delta) * 100.0;

                if let Some(spread) = put {
                    let max_loss = width - spread.credit;
                    if spread.credit > MIN_VERTICAL_CREDIT
                        && vertical_pop > MIN_VERTICAL_POP
                        && max_loss > 0.0
                    {
                        let id = format!(
                            "{}-BPS-{}D-S{:.0}-W{:.0}",
                            ticker, dte, spread.short_strike, width
                        );
                        if seen.insert(id.clone()) {
                            out.push(TradeCandidate {
                                id,
                                strategy_type: StrategyType::BullPutSpread,
                                ticker: ticker.clone(),
                                days_to_expiration: dte,
                                legs: vertical_legs(&spread, OptionType::Put, -delta),
                                credit: spread.credit,
                                max_loss,
                                breakeven: Breakeven::Single(spread.short_strike - spread.credit),
                                probability_of_profit: vertical_pop,
                                return_on_risk: spread.credit / max_loss * 100.0,
                            });
                        }
                    }
                }

                if let Some(spread) = call {
                    let max_loss = width - spread.credit;
                    if spread.credit > MIN_VERTICAL_CREDIT
                        && vertical_pop > MIN_VERTICAL_POP
                        && max_loss > 0.0
                    {
                        let id = format!(
                            "{}-BCS-{}D-S{:.0}-W{:.0}",
                            ticker, dte, spread.short_strike, width
                        );
                        if seen.insert(id.clone()) {
                            out.push(TradeCandidate {
                                id,
                                strategy_type: StrategyType::BearCallSpread,
                                ticker: ticker.clone(),
                                days_to_expiration: dte,
                                legs: vertical_legs(&spread, OptionType::Call, delta),
                                credit: spread.credit,
                                max_loss,
                                breakeven: Breakeven::Single(spread.short_strike + spread.credit),
                                probability_of_profit: vertical_pop,
                                return_on_risk: spread.credit / max_loss * 100.0,
                            });
                        }
                    }
                }

                if delta_idx < CONDOR_DELTA_COUNT && width_idx < CONDOR_WIDTH_COUNT {
                    if let (Some(put), Some(call)) = (put, call) {
                        let credit = put.credit + call.credit;
                        let max_loss = width - credit;
                        let pop = (1.0 - 2.0 * delta) * 100.0;
                        if credit > MIN_CONDOR_CREDIT && pop > MIN_CONDOR_POP && max_loss > 0.0 {
                            let id = format!(
                                "{}-IC-{}D-P{:.0}-C{:.0}-W{:.0}",
                                ticker, dte, put.short_strike, call.short_strike, width
                            );
                            if seen.insert(id.clone()) {
                                let mut legs = vertical_legs(&put, OptionType::Put, -delta);
                                legs.extend(vertical_legs(&call, OptionType::Call, delta));
                                out.push(TradeCandidate {
                                    id,
                                    strategy_type: StrategyType::IronCondor,
                                    ticker: ticker.clone(),
                                    days_to_expiration: dte,
                                    legs,
                                    credit,
                                    max_loss,
                                    breakeven: Breakeven::Range {
                                        lower: put.short_strike - credit,
                                        upper: call.short_strike + credit,
                                    },
                                    probability_of_profit: pop,
                                    return_on_risk: credit / max_loss * 100.0,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}
