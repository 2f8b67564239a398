pub mod synthetic;

use serde::{Deserialize, Serialize};

// ── Option chain input types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    Call,
    Put,
}

impl std::fmt::Display for OptionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// One quoted contract. Immutable input, owned by the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub side: OptionSide,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub open_interest: u64,
    pub volume: u64,
    /// Contract expiry, `%Y-%m-%d`.
    pub expiry: String,
}

/// An assembled option-chain snapshot. Supplied whole to the analyzer and
/// read-only within it: the analyzer derives everything, mutates nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub symbol: String,
    pub spot_price: f64,
    /// Active expiry for the whole chain, `%Y-%m-%d`.
    pub expiry_date: String,
    /// Ordered by strike as assembled; unique per (strike, side).
    pub quotes: Vec<OptionQuote>,
}

impl OptionChainSnapshot {
    #[inline]
    pub fn calls(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.side == OptionSide::Call)
    }

    #[inline]
    pub fn puts(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.side == OptionSide::Put)
    }

    /// (min, max) over all quoted strikes, or None on an empty ladder.
    pub fn strike_range(&self) -> Option<(f64, f64)> {
        let mut it = self.quotes.iter().map(|q| q.strike);
        let first = it.next()?;
        let mut lo = first;
        let mut hi = first;
        for s in it {
            if s < lo {
                lo = s;
            }
            if s > hi {
                hi = s;
            }
        }
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(strike: f64, side: OptionSide) -> OptionQuote {
        OptionQuote {
            strike,
            side,
            last_price: 1.0,
            bid: 0.9,
            ask: 1.1,
            open_interest: 100,
            volume: 10,
            expiry: "2026-09-30".into(),
        }
    }

    #[test]
    fn test_side_filters() {
        let snap = OptionChainSnapshot {
            symbol: "NIFTY".into(),
            spot_price: 24500.0,
            expiry_date: "2026-09-30".into(),
            quotes: vec![
                quote(24400.0, OptionSide::Put),
                quote(24600.0, OptionSide::Call),
                quote(24700.0, OptionSide::Call),
            ],
        };
        assert_eq!(snap.calls().count(), 2);
        assert_eq!(snap.puts().count(), 1);
    }

    #[test]
    fn test_strike_range() {
        let snap = OptionChainSnapshot {
            symbol: "NIFTY".into(),
            spot_price: 24500.0,
            expiry_date: "2026-09-30".into(),
            quotes: vec![
                quote(24600.0, OptionSide::Call),
                quote(24300.0, OptionSide::Put),
                quote(24800.0, OptionSide::Call),
            ],
        };
        assert_eq!(snap.strike_range(), Some((24300.0, 24800.0)));

        let empty = OptionChainSnapshot {
            symbol: "NIFTY".into(),
            spot_price: 24500.0,
            expiry_date: "2026-09-30".into(),
            quotes: vec![],
        };
        assert_eq!(empty.strike_range(), None);
    }

    #[test]
    fn test_side_serde_uppercase() {
        assert_eq!(serde_json::to_string(&OptionSide::Call).unwrap(), "\"CALL\"");
        assert_eq!(serde_json::to_string(&OptionSide::Put).unwrap(), "\"PUT\"");
    }
}
