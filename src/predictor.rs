use crate::analyzer::strangle::Strategy;
use serde::Deserialize;

/// Feature vector for the probability scorer. Missing inputs take neutral
/// defaults rather than zeros that would skew the weighted sum.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScoreFeatures {
    /// Implied volatility in percent (e.g. 22.0).
    pub iv: f64,
    pub delta: f64,
    /// Relative strength index, 0-100.
    pub rsi: f64,
    /// Open interest in contracts.
    pub oi: f64,
}

impl Default for ScoreFeatures {
    fn default() -> Self {
        Self { iv: 0.0, delta: 0.0, rsi: 50.0, oi: 1.0e6 }
    }
}

/// Linear probability scorer.
///
/// A deliberately simple weighted sum standing in for a trained model: low
/// IV, directional exposure, momentum, and liquidity each nudge the base
/// rate up. The output is a probability in [0, 1].
pub struct LinearScorer {
    base: f64,
    w_iv: f64,
    w_delta: f64,
    w_rsi: f64,
    w_oi: f64,
}

impl LinearScorer {
    pub fn new() -> Self {
        Self { base: 0.7, w_iv: 0.1, w_delta: 0.05, w_rsi: 0.05, w_oi: 0.05 }
    }

    pub fn score(&self, f: &ScoreFeatures) -> f64 {
        let p = self.base
            + self.w_iv * (1.0 - f.iv / 100.0)
            + self.w_delta * f.delta.abs()
            + self.w_rsi * (f.rsi / 100.0)
            + self.w_oi * (f.oi / 1.0e6);
        p.clamp(0.0, 1.0)
    }

    /// Batch scoring over evaluated strategies.
    pub fn score_strategies(&self, strategies: &[Strategy]) -> Vec<f64> {
        strategies
            .iter()
            .map(|s| self.score(&extract_features(s)))
            .collect()
    }
}

impl Default for LinearScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a strategy onto the scorer's feature space. IV comes from the leg
/// vols (averaged, in percent); the rest take the neutral defaults until a
/// richer feature pipeline exists.
fn extract_features(s: &Strategy) -> ScoreFeatures {
    let iv = match (s.call_iv, s.put_iv) {
        (Some(c), Some(p)) => (c + p) / 2.0 * 100.0,
        (Some(v), None) | (None, Some(v)) => v * 100.0,
        (None, None) => 0.0,
    };
    ScoreFeatures { iv, ..ScoreFeatures::default() }
}
