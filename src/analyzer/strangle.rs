use crate::chain::{OptionChainSnapshot, OptionSide};
use crate::config::AnalyzerConfig;
use crate::noise::NoiseSource;
use crate::pricing::BlackScholes;
use serde::Serialize;

// ── Strategy types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegAction {
    Sell,
    Buy,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyLeg {
    pub action: LegAction,
    pub side: OptionSide,
    pub strike: f64,
    pub premium: f64,
}

/// One evaluated candidate strategy. Built fresh per analysis pass and never
/// mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    pub kind: &'static str,
    /// Short strangle: exactly [SELL PUT below spot, SELL CALL above spot].
    pub legs: Vec<StrategyLeg>,
    /// Chance of spot finishing strictly between the strikes, in [0, 100].
    pub probability_of_profit: f64,
    pub net_premium: f64,
    pub max_profit: f64,
    /// Worst-case one-sided breach distance minus collected premium.
    /// Reported as the literal arithmetic, negative values included.
    pub max_loss: f64,
    pub profit_percentage: f64,
    /// Absent when the solver left the leg's volatility undetermined.
    pub call_iv: Option<f64>,
    pub put_iv: Option<f64>,
    pub expiry_date: String,
    pub days_to_expiry: u32,
}

const SHORT_STRANGLE: &str = "Short Strangle";

/// Build every short-strangle candidate from the full cross product of
/// OTM calls (strike > spot) and OTM puts (strike < spot).
///
/// Leg premiums are distance-scaled estimates perturbed by the noise source,
/// standing in for a live quote-derived premium. A candidate is emitted only
/// when its estimated return on margin clears the profit threshold; all other
/// pruning happens downstream.
pub(crate) fn build_strangles(
    pricing: &BlackScholes,
    cfg: &AnalyzerConfig,
    snapshot: &OptionChainSnapshot,
    time_to_expiry: f64,
    expiry_date: &str,
    noise: &mut dyn NoiseSource,
) -> Vec<Strategy> {
    let spot = snapshot.spot_price;
    let hv = cfg.historical_volatility(&snapshot.symbol);
    let calls: Vec<_> = snapshot.calls().filter(|q| q.strike > spot).collect();
    let puts: Vec<_> = snapshot.puts().filter(|q| q.strike < spot).collect();

    let mut strategies = Vec::new();

    for call in &calls {
        for put in &puts {
            let call_distance = (call.strike - spot).abs();
            let put_distance = (spot - put.strike).abs();

            let (lo, hi) = cfg.premium_noise;
            let call_premium = (call_distance * cfg.premium_scale + noise.uniform(lo, hi))
                .clamp(cfg.premium_floor, cfg.premium_cap);
            let put_premium = (put_distance * cfg.premium_scale + noise.uniform(lo, hi))
                .clamp(cfg.premium_floor, cfg.premium_cap);
            let net_premium = call_premium + put_premium;

            // Each leg's vol is re-derived from its own quoted last price.
            let call_iv = pricing.implied_volatility(
                OptionSide::Call,
                call.last_price,
                spot,
                call.strike,
                time_to_expiry,
                cfg.risk_free_rate,
                cfg.iv_max_iterations,
                cfg.iv_tolerance,
            );
            let put_iv = pricing.implied_volatility(
                OptionSide::Put,
                put.last_price,
                spot,
                put.strike,
                time_to_expiry,
                cfg.risk_free_rate,
                cfg.iv_max_iterations,
                cfg.iv_tolerance,
            );

            let probability_of_profit = strangle_probability(
                pricing,
                spot,
                put.strike,
                call.strike,
                time_to_expiry,
                call_iv,
                put_iv,
                hv,
            );

            let max_profit = net_premium;
            let max_loss =
                (spot - put.strike).max(call.strike - spot) - net_premium;

            // Margin estimate: closer strikes draw a higher multiplier.
            let avg_distance = (call_distance + put_distance) / 2.0;
            let (m_lo, m_hi) = if avg_distance < cfg.margin_near_limit {
                cfg.margin_near
            } else if avg_distance < cfg.margin_mid_limit {
                cfg.margin_mid
            } else {
                cfg.margin_far
            };
            let margin_required = net_premium * noise.uniform(m_lo, m_hi);
            let profit_percentage = if margin_required > 0.0 {
                max_profit / margin_required * 100.0
            } else {
                0.0
            };

            if profit_percentage > cfg.profit_threshold_pct {
                strategies.push(Strategy {
                    kind: SHORT_STRANGLE,
                    legs: vec![
                        StrategyLeg {
                            action: LegAction::Sell,
                            side: OptionSide::Put,
                            strike: put.strike,
                            premium: put_premium,
                        },
                        StrategyLeg {
                            action: LegAction::Sell,
                            side: OptionSide::Call,
                            strike: call.strike,
                            premium: call_premium,
                        },
                    ],
                    probability_of_profit,
                    net_premium,
                    max_profit,
                    max_loss,
                    profit_percentage,
                    call_iv,
                    put_iv,
                    expiry_date: expiry_date.to_string(),
                    days_to_expiry: (time_to_expiry * 365.0).round() as u32,
                });
            }
        }
    }

    strategies
}

/// P(put_strike < S_T < call_strike) under a zero-drift normal approximation
/// centered at spot with std dev `sigma * sqrt(T) * spot`, as a percentage.
///
/// Sigma is the average of the two leg IVs; when either is undetermined the
/// symbol's historical volatility stands in.
#[allow(clippy::too_many_arguments)]
fn strangle_probability(
    pricing: &BlackScholes,
    spot: f64,
    put_strike: f64,
    call_strike: f64,
    time_to_expiry: f64,
    call_iv: Option<f64>,
    put_iv: Option<f64>,
    historical_vol: f64,
) -> f64 {
    let sigma = match (call_iv, put_iv) {
        (Some(c), Some(p)) => (c + p) / 2.0,
        _ => historical_vol,
    };
    let std_dev = sigma * time_to_expiry.sqrt() * spot;
    if std_dev <= 0.0 {
        return 0.0;
    }
    let z_lower = (put_strike - spot) / std_dev;
    let z_upper = (call_strike - spot) / std_dev;
    (pricing.cdf(z_upper) - pricing.cdf(z_lower)) * 100.0
}

/// High-probability subset: profit and probability thresholds both cleared,
/// sorted by probability descending. The sort is stable so ties keep their
/// generation order.
pub(crate) fn filter_high_probability(
    strategies: &[Strategy],
    cfg: &AnalyzerConfig,
) -> Vec<Strategy> {
    let mut filtered: Vec<Strategy> = strategies
        .iter()
        .filter(|s| {
            s.profit_percentage > cfg.profit_threshold_pct
                && s.probability_of_profit > cfg.probability_threshold_pct
        })
        .cloned()
        .collect();
    filtered.sort_by(|a, b| {
        b.probability_of_profit
            .partial_cmp(&a.probability_of_profit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    filtered
}
