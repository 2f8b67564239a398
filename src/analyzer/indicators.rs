use crate::chain::{OptionChainSnapshot, OptionSide};
use serde::Serialize;

/// Aggregate breadth indicators over one chain snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MarketIndicators {
    pub pcr_volume: f64,
    pub pcr_oi: f64,
    pub total_call_volume: u64,
    pub total_put_volume: u64,
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    pub max_pain: f64,
}

/// Sum volume/OI per side and compute put/call ratios and max pain.
/// Degenerate denominators (no call volume or OI) take a neutral 1.0
/// rather than propagating a division error.
pub fn compute(snapshot: &OptionChainSnapshot, max_pain_step: f64) -> MarketIndicators {
    let mut total_call_volume: u64 = 0;
    let mut total_put_volume: u64 = 0;
    let mut total_call_oi: u64 = 0;
    let mut total_put_oi: u64 = 0;

    for q in &snapshot.quotes {
        match q.side {
            OptionSide::Call => {
                total_call_volume += q.volume;
                total_call_oi += q.open_interest;
            }
            OptionSide::Put => {
                total_put_volume += q.volume;
                total_put_oi += q.open_interest;
            }
        }
    }

    let pcr_volume = if total_call_volume > 0 {
        total_put_volume as f64 / total_call_volume as f64
    } else {
        1.0
    };
    let pcr_oi = if total_call_oi > 0 {
        total_put_oi as f64 / total_call_oi as f64
    } else {
        1.0
    };

    MarketIndicators {
        pcr_volume,
        pcr_oi,
        total_call_volume,
        total_put_volume,
        total_call_oi,
        total_put_oi,
        max_pain: max_pain(snapshot, max_pain_step),
    }
}

/// The settlement strike minimizing total intrinsic loss to option writers.
///
/// Candidates are scanned from the minimum quoted strike upward in fixed
/// increments; at each candidate the writer loss is
/// `(candidate - strike) * call_OI` for calls below it plus
/// `(strike - candidate) * put_OI` for puts above it. The first minimum wins
/// on ties. An empty strike ladder yields 0.
pub fn max_pain(snapshot: &OptionChainSnapshot, step: f64) -> f64 {
    let Some((lo, hi)) = snapshot.strike_range() else {
        return 0.0;
    };
    if step <= 0.0 {
        return lo;
    }

    let mut best_strike = lo;
    let mut best_loss = f64::INFINITY;

    let mut candidate = lo;
    while candidate <= hi {
        let mut loss = 0.0;
        for q in &snapshot.quotes {
            match q.side {
                OptionSide::Call if candidate > q.strike => {
                    loss += (candidate - q.strike) * q.open_interest as f64;
                }
                OptionSide::Put if candidate < q.strike => {
                    loss += (q.strike - candidate) * q.open_interest as f64;
                }
                _ => {}
            }
        }
        if loss < best_loss {
            best_loss = loss;
            best_strike = candidate;
        }
        candidate += step;
    }

    best_strike
}
