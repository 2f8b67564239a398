pub mod indicators;
pub mod strangle;

use crate::chain::{OptionChainSnapshot, OptionSide};
use crate::config::AnalyzerConfig;
use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::noise::NoiseSource;
use crate::pricing::{BlackScholes, Greeks};
use chrono::{NaiveDate, Utc};
use indicators::MarketIndicators;
use serde::Serialize;
use std::collections::HashSet;
use strangle::Strategy;

/// Per-contract analytics for one (strike, side) quote.
#[derive(Debug, Clone, Serialize)]
pub struct OptionAnalysis {
    pub strike: f64,
    /// Observed market price the IV was inverted from.
    pub price: f64,
    /// None when the solver failed to converge meaningfully. Distinct from
    /// zero: callers substitute a default, they never treat this as 0.
    #[serde(rename = "iv")]
    pub implied_volatility: Option<f64>,
    pub volume: u64,
    pub open_interest: u64,
    pub greeks: Greeks,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainAnalysis {
    pub calls: Vec<OptionAnalysis>,
    pub puts: Vec<OptionAnalysis>,
}

/// Everything one analysis pass derives from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub spot_price: f64,
    /// Years, floored at 1/365.
    pub time_to_expiry: f64,
    pub option_analysis: ChainAnalysis,
    pub strategies: Vec<Strategy>,
    pub high_probability_strategies: Vec<Strategy>,
    pub market_indicators: MarketIndicators,
    pub analysis_timestamp: String,
}

/// Boundary result of `analyze`: a completed pass or a structured failure.
/// Callers at the API layer check the discriminant; a failed pass never
/// surfaces as a panic or a partial result.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Completed(AnalysisResult),
    Failed { error: String, status: &'static str },
}

impl AnalysisOutcome {
    fn failed(e: &AnalyzerError) -> Self {
        Self::Failed { error: e.to_string(), status: "failed" }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// End-to-end analysis over one option-chain snapshot.
///
/// Stateless across calls: the only fields are read-only configuration and
/// the pricing engine, so one analyzer can serve concurrent callers with
/// independent snapshots. The whole pass is CPU-bound and never suspends.
pub struct StrategyAnalyzer {
    cfg: AnalyzerConfig,
    pricing: BlackScholes,
}

impl StrategyAnalyzer {
    pub fn new(cfg: AnalyzerConfig) -> Self {
        Self { cfg, pricing: BlackScholes::new() }
    }

    #[inline]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.cfg
    }

    /// Run a full pass. Any internal failure is converted into
    /// `AnalysisOutcome::Failed` here; nothing propagates.
    pub fn analyze(
        &self,
        snapshot: &OptionChainSnapshot,
        noise: &mut dyn NoiseSource,
    ) -> AnalysisOutcome {
        let today = Utc::now().date_naive();
        match self.run(snapshot, today, noise) {
            Ok(result) => AnalysisOutcome::Completed(result),
            Err(e) => {
                tracing::warn!(symbol = %snapshot.symbol, error = %e, "analysis pass failed");
                AnalysisOutcome::failed(&e)
            }
        }
    }

    /// The fallible pass, with "today" explicit so tests can pin the clock.
    fn run(
        &self,
        snapshot: &OptionChainSnapshot,
        today: NaiveDate,
        noise: &mut dyn NoiseSource,
    ) -> AnalyzerResult<AnalysisResult> {
        validate(snapshot)?;

        let time_to_expiry = self.time_to_expiry(&snapshot.expiry_date, today);
        let option_analysis = self.analyze_quotes(snapshot, time_to_expiry);

        let strategies = if self.cfg.strategies_enabled(&snapshot.symbol) {
            strangle::build_strangles(
                &self.pricing,
                &self.cfg,
                snapshot,
                time_to_expiry,
                &snapshot.expiry_date,
                noise,
            )
        } else {
            Vec::new()
        };
        let high_probability_strategies =
            strangle::filter_high_probability(&strategies, &self.cfg);

        let market_indicators = indicators::compute(snapshot, self.cfg.max_pain_step);

        tracing::debug!(
            symbol = %snapshot.symbol,
            quotes = snapshot.quotes.len(),
            strategies = strategies.len(),
            high_probability = high_probability_strategies.len(),
            "analysis pass complete"
        );

        Ok(AnalysisResult {
            spot_price: snapshot.spot_price,
            time_to_expiry,
            option_analysis,
            strategies,
            high_probability_strategies,
            market_indicators,
            analysis_timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Years until expiry, floored at the configured minimum so downstream
    /// math never sees a zero or negative T. Unparsable dates take the
    /// one-week default.
    pub(crate) fn time_to_expiry(&self, expiry_date: &str, today: NaiveDate) -> f64 {
        match NaiveDate::parse_from_str(expiry_date, "%Y-%m-%d") {
            Ok(expiry) => {
                let days = (expiry - today).num_days() as f64;
                (days / 365.0).max(self.cfg.min_time_to_expiry)
            }
            Err(_) => self.cfg.default_time_to_expiry,
        }
    }

    /// Invert IV from each observed price, then evaluate Greeks at that vol
    /// (or the 0.20 default when the solver came back empty). Sequences keep
    /// the snapshot's strike order.
    fn analyze_quotes(&self, snapshot: &OptionChainSnapshot, time_to_expiry: f64) -> ChainAnalysis {
        let mut calls = Vec::new();
        let mut puts = Vec::new();

        for quote in &snapshot.quotes {
            let iv = self.pricing.implied_volatility(
                quote.side,
                quote.last_price,
                snapshot.spot_price,
                quote.strike,
                time_to_expiry,
                self.cfg.risk_free_rate,
                self.cfg.iv_max_iterations,
                self.cfg.iv_tolerance,
            );
            let greeks = self.pricing.greeks(
                quote.side,
                snapshot.spot_price,
                quote.strike,
                time_to_expiry,
                self.cfg.risk_free_rate,
                iv.unwrap_or(self.cfg.default_volatility),
            );
            let analysis = OptionAnalysis {
                strike: quote.strike,
                price: quote.last_price,
                implied_volatility: iv,
                volume: quote.volume,
                open_interest: quote.open_interest,
                greeks,
            };
            match quote.side {
                OptionSide::Call => calls.push(analysis),
                OptionSide::Put => puts.push(analysis),
            }
        }

        ChainAnalysis { calls, puts }
    }
}

/// Reject snapshots the pass cannot price: non-positive or non-finite spot,
/// bad strikes/prices, or duplicate (strike, side) entries. The whole pass
/// aborts on the first violation; there are no partial results.
fn validate(snapshot: &OptionChainSnapshot) -> AnalyzerResult<()> {
    if snapshot.symbol.trim().is_empty() {
        return Err(AnalyzerError::MalformedInput("empty symbol".into()));
    }
    if !snapshot.spot_price.is_finite() || snapshot.spot_price <= 0.0 {
        return Err(AnalyzerError::MalformedInput(format!(
            "spot price must be positive, got {}",
            snapshot.spot_price
        )));
    }
    let mut seen: HashSet<(u64, OptionSide)> = HashSet::with_capacity(snapshot.quotes.len());
    for q in &snapshot.quotes {
        if !q.strike.is_finite() || q.strike <= 0.0 {
            return Err(AnalyzerError::MalformedInput(format!(
                "strike must be positive, got {}",
                q.strike
            )));
        }
        for (name, v) in [("last_price", q.last_price), ("bid", q.bid), ("ask", q.ask)] {
            if !v.is_finite() || v < 0.0 {
                return Err(AnalyzerError::MalformedInput(format!(
                    "{name} at strike {} must be non-negative, got {v}",
                    q.strike
                )));
            }
        }
        if !seen.insert((q.strike.to_bits(), q.side)) {
            return Err(AnalyzerError::MalformedInput(format!(
                "duplicate quote for ({}, {})",
                q.strike, q.side
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::OptionQuote;
    use crate::noise::FlatNoise;

    fn quote(strike: f64, side: OptionSide, last_price: f64) -> OptionQuote {
        OptionQuote {
            strike,
            side,
            last_price,
            bid: last_price * 0.95,
            ask: last_price * 1.05,
            open_interest: 10_000,
            volume: 1_000,
            expiry: "2026-09-28".into(),
        }
    }

    fn nifty_snapshot() -> OptionChainSnapshot {
        OptionChainSnapshot {
            symbol: "NIFTY".into(),
            spot_price: 24500.0,
            expiry_date: "2026-09-28".into(),
            quotes: vec![
                quote(24400.0, OptionSide::Put, 2.0),
                quote(24600.0, OptionSide::Call, 2.0),
            ],
        }
    }

    fn analyzer() -> StrategyAnalyzer {
        StrategyAnalyzer::new(AnalyzerConfig::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn test_time_to_expiry_floor_and_default() {
        let a = analyzer();
        let today = today();
        // 30 days out
        assert!((a.time_to_expiry("2026-09-28", today) - 30.0 / 365.0).abs() < 1e-12);
        // Same-day and past expiries floor at 1/365
        assert_eq!(a.time_to_expiry("2026-08-29", today), 1.0 / 365.0);
        assert_eq!(a.time_to_expiry("2026-08-01", today), 1.0 / 365.0);
        // Unparsable dates default to one week
        assert_eq!(a.time_to_expiry("next thursday", today), 7.0 / 365.0);
        assert_eq!(a.time_to_expiry("", today), 7.0 / 365.0);
    }

    #[test]
    fn test_end_to_end_single_strangle() {
        let a = analyzer();
        let snap = nifty_snapshot();
        let mut noise = FlatNoise::floor();
        let result = match a.run(&snap, today(), &mut noise) {
            Ok(r) => r,
            Err(e) => panic!("pass failed: {e}"),
        };

        assert_eq!(result.spot_price, 24500.0);
        assert!((result.time_to_expiry - 30.0 / 365.0).abs() < 1e-12);
        assert_eq!(result.option_analysis.calls.len(), 1);
        assert_eq!(result.option_analysis.puts.len(), 1);

        // One OTM call x one OTM put: exactly one candidate, and with the
        // floor-pinned noise its profit percentage (25%) clears the gate.
        assert_eq!(result.strategies.len(), 1);
        let s = &result.strategies[0];
        assert!(s.legs[0].strike < 24500.0 && s.legs[1].strike > 24500.0);
        assert!(s.profit_percentage > 3.0);
        assert!(s.probability_of_profit >= 0.0 && s.probability_of_profit <= 100.0);
        assert_eq!(s.expiry_date, "2026-09-28");
        assert_eq!(s.days_to_expiry, 30);

        // Subset property: every high-probability entry clears both gates
        for h in &result.high_probability_strategies {
            assert!(h.profit_percentage > 3.0);
            assert!(h.probability_of_profit > 85.0);
        }
        assert!(result.high_probability_strategies.len() <= result.strategies.len());
    }

    #[test]
    fn test_unfiltered_strategies_clear_profit_gate() {
        let a = analyzer();
        let mut snap = nifty_snapshot();
        snap.quotes.extend([
            quote(24200.0, OptionSide::Put, 1.2),
            quote(24800.0, OptionSide::Call, 1.1),
            quote(25000.0, OptionSide::Call, 0.6),
        ]);
        let mut noise = FlatNoise::midpoint();
        match a.run(&snap, today(), &mut noise) {
            Ok(r) => {
                assert!(!r.strategies.is_empty());
                for s in &r.strategies {
                    assert!(s.profit_percentage > 3.0);
                }
                // Descending probability in the filtered list
                for pair in r.high_probability_strategies.windows(2) {
                    assert!(pair[0].probability_of_profit >= pair[1].probability_of_profit);
                }
            }
            Err(e) => panic!("pass failed: {e}"),
        }
    }

    #[test]
    fn test_unsupported_symbol_yields_no_strategies() {
        let a = analyzer();
        let mut snap = nifty_snapshot();
        snap.symbol = "AAPL".into();
        let mut noise = FlatNoise::midpoint();
        match a.run(&snap, today(), &mut noise) {
            Ok(r) => {
                assert!(r.strategies.is_empty());
                assert!(r.high_probability_strategies.is_empty());
                // Analytics and indicators still come through
                assert_eq!(r.option_analysis.calls.len(), 1);
                assert!(r.market_indicators.total_call_oi > 0);
            }
            Err(e) => panic!("pass failed: {e}"),
        }
    }

    #[test]
    fn test_greeks_computed_at_default_vol_when_iv_absent() {
        let a = analyzer();
        let mut snap = nifty_snapshot();
        // A near-ATM call quoted at zero: no volatility reproduces a zero
        // price for a forward-ITM strike, so the solver rides the floor and
        // reports absence. Greeks still come back from the 0.20 default.
        snap.quotes.push(quote(24550.0, OptionSide::Call, 0.0));
        let mut noise = FlatNoise::midpoint();
        let r = match a.run(&snap, today(), &mut noise) {
            Ok(r) => r,
            Err(e) => panic!("pass failed: {e}"),
        };
        let dead = r
            .option_analysis
            .calls
            .iter()
            .find(|c| c.strike == 24550.0)
            .expect("zero-priced call analyzed");
        assert!(dead.implied_volatility.is_none());
        // Greeks used the default vol, so delta is a sane ATM-ish figure
        assert!(dead.greeks.delta.is_finite() && dead.greeks.delta > 0.0);
    }

    #[test]
    fn test_malformed_snapshot_is_structured_failure() {
        let a = analyzer();
        let mut noise = FlatNoise::midpoint();

        let mut bad_spot = nifty_snapshot();
        bad_spot.spot_price = -1.0;
        assert!(a.analyze(&bad_spot, &mut noise).is_failed());

        let mut bad_strike = nifty_snapshot();
        bad_strike.quotes[0].strike = 0.0;
        assert!(a.analyze(&bad_strike, &mut noise).is_failed());

        let mut dup = nifty_snapshot();
        dup.quotes.push(quote(24400.0, OptionSide::Put, 2.5));
        assert!(a.analyze(&dup, &mut noise).is_failed());

        let mut nan_price = nifty_snapshot();
        nan_price.quotes[0].last_price = f64::NAN;
        assert!(a.analyze(&nan_price, &mut noise).is_failed());
    }

    #[test]
    fn test_failure_serializes_with_status() {
        let a = analyzer();
        let mut noise = FlatNoise::midpoint();
        let mut bad = nifty_snapshot();
        bad.symbol = " ".into();
        let outcome = a.analyze(&bad, &mut noise);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json["error"].as_str().unwrap().contains("symbol"));
    }

    #[test]
    fn test_pass_is_reproducible_with_seeded_noise() {
        use crate::noise::SeededNoise;
        let a = analyzer();
        let snap = nifty_snapshot();
        let run = |seed: u64| {
            let mut noise = SeededNoise::new(seed);
            a.run(&snap, today(), &mut noise).expect("pass")
        };
        let (r1, r2) = (run(9), run(9));
        assert_eq!(r1.strategies.len(), r2.strategies.len());
        for (s1, s2) in r1.strategies.iter().zip(&r2.strategies) {
            assert_eq!(s1.net_premium, s2.net_premium);
            assert_eq!(s1.profit_percentage, s2.profit_percentage);
            assert_eq!(s1.probability_of_profit, s2.probability_of_profit);
        }
    }
}
