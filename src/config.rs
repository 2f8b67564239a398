use crate::errors::{AnalyzerError, AnalyzerResult};
use std::collections::HashMap;

/// Process-level configuration, from env vars with defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub default_symbol: String,
    /// Seconds between pushes on the /ws feed.
    pub ws_refresh_secs: u64,
    pub risk_free_rate: f64,
}

impl AppConfig {
    pub fn from_env() -> AnalyzerResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| AnalyzerError::Config(format!("SERVER_PORT: {e}")))?;

        let ws_refresh_secs = env_var_or("WS_REFRESH_SECS", "5")
            .parse::<u64>()
            .map_err(|e| AnalyzerError::Config(format!("WS_REFRESH_SECS: {e}")))?;

        let risk_free_rate = env_var_or("RISK_FREE_RATE", "0.065")
            .parse::<f64>()
            .map_err(|e| AnalyzerError::Config(format!("RISK_FREE_RATE: {e}")))?;

        Ok(Self {
            server_port,
            default_symbol: env_var_or("DEFAULT_SYMBOL", "NIFTY"),
            ws_refresh_secs,
            risk_free_rate,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// ── Per-symbol capability/config ──

/// What the engine knows about one underlying. Strategy generation is a
/// data-driven capability, not a hard-coded branch: symbols without
/// `strategies_enabled` still get per-option analytics and indicators,
/// but yield an empty strategy list.
#[derive(Debug, Clone, Copy)]
pub struct SymbolProfile {
    pub strategies_enabled: bool,
    /// Fallback annualized volatility when leg IVs are undetermined.
    pub historical_volatility: f64,
    /// Center for the synthetic chain's jittered spot.
    pub reference_spot: f64,
    pub spot_jitter: f64,
    /// Indices use a fixed 50-point strike interval.
    pub is_index: bool,
}

// ── Analyzer configuration ──

/// Every tunable the analysis pass depends on. `Default` carries the
/// calibrated values; tests override individual fields.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub risk_free_rate: f64,
    /// Substituted when the IV solver reports no convergence.
    pub default_volatility: f64,
    /// Fallback when a symbol has no profile entry.
    pub fallback_volatility: f64,

    // IV solver
    pub iv_max_iterations: u32,
    pub iv_tolerance: f64,

    // Time to expiry (years)
    pub min_time_to_expiry: f64,
    pub default_time_to_expiry: f64,

    // Strangle premium estimate: clamp(distance * scale + noise, floor, cap)
    pub premium_scale: f64,
    pub premium_noise: (f64, f64),
    pub premium_floor: f64,
    pub premium_cap: f64,

    // Margin multiplier tiers by average strike distance from spot.
    // Empirically chosen; kept as data rather than re-derived.
    pub margin_near_limit: f64,
    pub margin_mid_limit: f64,
    pub margin_near: (f64, f64),
    pub margin_mid: (f64, f64),
    pub margin_far: (f64, f64),

    // Filters
    pub profit_threshold_pct: f64,
    pub probability_threshold_pct: f64,

    // Max-pain candidate scan increment
    pub max_pain_step: f64,

    pub symbols: HashMap<String, SymbolProfile>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.065,
            default_volatility: 0.20,
            fallback_volatility: 0.22,
            iv_max_iterations: 100,
            iv_tolerance: 1e-6,
            min_time_to_expiry: 1.0 / 365.0,
            default_time_to_expiry: 7.0 / 365.0,
            premium_scale: 0.02,
            premium_noise: (0.1, 0.5),
            premium_floor: 0.1,
            premium_cap: 5.0,
            margin_near_limit: 50.0,
            margin_mid_limit: 100.0,
            margin_near: (8.0, 12.0),
            margin_mid: (6.0, 10.0),
            margin_far: (4.0, 8.0),
            profit_threshold_pct: 3.0,
            probability_threshold_pct: 85.0,
            max_pain_step: 25.0,
            symbols: default_symbols(),
        }
    }
}

impl AnalyzerConfig {
    #[inline]
    pub fn profile(&self, symbol: &str) -> Option<&SymbolProfile> {
        self.symbols.get(&symbol.to_uppercase())
    }

    #[inline]
    pub fn strategies_enabled(&self, symbol: &str) -> bool {
        self.profile(symbol).is_some_and(|p| p.strategies_enabled)
    }

    #[inline]
    pub fn historical_volatility(&self, symbol: &str) -> f64 {
        self.profile(symbol)
            .map(|p| p.historical_volatility)
            .unwrap_or(self.fallback_volatility)
    }
}

fn default_symbols() -> HashMap<String, SymbolProfile> {
    let entries = [
        // symbol, hv, reference spot, jitter, index
        ("NIFTY", 0.22, 24500.0, 200.0, true),
        ("BANKNIFTY", 0.22, 52000.0, 500.0, true),
        ("FINNIFTY", 0.22, 21000.0, 200.0, true),
        ("RELIANCE", 0.28, 2800.0, 50.0, false),
        ("TCS", 0.22, 3800.0, 50.0, false),
        ("INFY", 0.24, 1450.0, 30.0, false),
        ("SBICARD", 0.25, 850.0, 20.0, false),
        ("HDFCBANK", 0.23, 1600.0, 30.0, false),
        ("HINDUNILVR", 0.20, 2500.0, 50.0, false),
        ("MARUTI", 0.26, 12000.0, 200.0, false),
    ];
    entries
        .into_iter()
        .map(|(sym, hv, spot, jitter, is_index)| {
            (
                sym.to_string(),
                SymbolProfile {
                    strategies_enabled: true,
                    historical_volatility: hv,
                    reference_spot: spot,
                    spot_jitter: jitter,
                    is_index,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.risk_free_rate, 0.065);
        assert_eq!(cfg.max_pain_step, 25.0);
        assert_eq!(cfg.profit_threshold_pct, 3.0);
        assert_eq!(cfg.probability_threshold_pct, 85.0);
        assert_eq!(cfg.iv_max_iterations, 100);
        assert_eq!(cfg.iv_tolerance, 1e-6);
    }

    #[test]
    fn test_symbol_lookup_is_case_insensitive() {
        let cfg = AnalyzerConfig::default();
        assert!(cfg.strategies_enabled("nifty"));
        assert!(cfg.strategies_enabled("NIFTY"));
        assert!(!cfg.strategies_enabled("AAPL"));
    }

    #[test]
    fn test_historical_volatility_fallback() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.historical_volatility("RELIANCE"), 0.28);
        assert_eq!(cfg.historical_volatility("HINDUNILVR"), 0.20);
        // Unknown symbols take the fallback, never zero
        assert_eq!(cfg.historical_volatility("UNKNOWN"), 0.22);
    }
}
