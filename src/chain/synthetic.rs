use super::{OptionChainSnapshot, OptionQuote, OptionSide};
use crate::config::AnalyzerConfig;
use crate::noise::NoiseSource;
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

/// Synthetic option-chain source.
///
/// Stands in for the live exchange feed: jittered spot around each symbol's
/// reference level, a realistic strike ladder, distance-priced quotes, and
/// monthly expiries (last Thursday of the month). The analyzer never knows
/// whether a snapshot came from here or from a real feed.
pub struct SyntheticChain {
    cfg: AnalyzerConfig,
}

/// Spot for symbols without a profile entry.
const DEFAULT_SPOT: f64 = 20_000.0;

/// Ladder shape: never start below 85% of spot, run 8 intervals above center.
const LADDER_FLOOR_RATIO: f64 = 0.85;
const LADDER_BELOW: f64 = 3.0;
const LADDER_ABOVE: f64 = 8.0;

impl SyntheticChain {
    pub fn new(cfg: AnalyzerConfig) -> Self {
        Self { cfg }
    }

    /// Upcoming monthly expiry dates (last Thursday), nearest first.
    pub fn expiry_dates(&self, today: NaiveDate) -> Vec<String> {
        let mut dates = Vec::with_capacity(4);
        let mut cursor = today;
        while dates.len() < 4 {
            let expiry = last_thursday(cursor.year(), cursor.month());
            if expiry > today {
                dates.push(expiry.format("%Y-%m-%d").to_string());
            }
            cursor = next_month(cursor);
        }
        dates
    }

    /// Generate a snapshot for `symbol` dated "now". `expiry_hint` picks one
    /// of the listed expiries when it matches; otherwise the nearest is used.
    pub fn generate(
        &self,
        symbol: &str,
        expiry_hint: Option<&str>,
        noise: &mut dyn NoiseSource,
    ) -> OptionChainSnapshot {
        self.generate_at(symbol, expiry_hint, Utc::now().date_naive(), noise)
    }

    /// Same as `generate`, with the calendar pinned for tests.
    pub fn generate_at(
        &self,
        symbol: &str,
        expiry_hint: Option<&str>,
        today: NaiveDate,
        noise: &mut dyn NoiseSource,
    ) -> OptionChainSnapshot {
        let symbol = symbol.to_uppercase();
        let profile = self.cfg.profile(&symbol);

        let (reference, jitter, is_index) = profile
            .map(|p| (p.reference_spot, p.spot_jitter, p.is_index))
            .unwrap_or((DEFAULT_SPOT, 0.0, false));
        let spot_price = (reference + noise.uniform(-jitter, jitter)).round();

        let expiry_dates = self.expiry_dates(today);
        let expiry_date = expiry_hint
            .filter(|hint| expiry_dates.iter().any(|d| d == hint))
            .map(str::to_string)
            .unwrap_or_else(|| expiry_dates[0].clone());

        let mut quotes = Vec::new();
        for strike in strike_ladder(spot_price, is_index) {
            let call_distance = (strike - spot_price).max(0.0);
            let put_distance = (spot_price - strike).max(0.0);

            let (call_lo, call_hi) = premium_band(call_distance, OptionSide::Call);
            let (put_lo, put_hi) = premium_band(put_distance, OptionSide::Put);
            let call_price = round2(noise.uniform(call_lo, call_hi));
            let put_price = round2(noise.uniform(put_lo, put_hi));

            quotes.push(quote(strike, OptionSide::Call, call_price, &expiry_date, noise));
            quotes.push(quote(strike, OptionSide::Put, put_price, &expiry_date, noise));
        }

        tracing::debug!(
            symbol = %symbol,
            spot = spot_price,
            strikes = quotes.len() / 2,
            expiry = %expiry_date,
            "generated synthetic chain"
        );

        OptionChainSnapshot { symbol, spot_price, expiry_date, quotes }
    }
}

fn quote(
    strike: f64,
    side: OptionSide,
    last_price: f64,
    expiry: &str,
    noise: &mut dyn NoiseSource,
) -> OptionQuote {
    OptionQuote {
        strike,
        side,
        last_price,
        bid: round2(last_price * 0.95),
        ask: round2(last_price * 1.05),
        open_interest: noise.uniform_int(1_000, 50_000) as u64,
        volume: noise.uniform_int(100, 10_000) as u64,
        expiry: expiry.to_string(),
    }
}

/// Premium range by distance from spot, mirroring observed market levels:
/// calls carry more premium than puts at the same distance.
fn premium_band(distance: f64, side: OptionSide) -> (f64, f64) {
    match side {
        OptionSide::Call => {
            if distance == 0.0 {
                (2.0, 3.0)
            } else if distance < 50.0 {
                (1.5, 2.5)
            } else {
                (0.5, 2.0)
            }
        }
        OptionSide::Put => {
            if distance == 0.0 {
                (0.3, 0.6)
            } else if distance < 50.0 {
                (0.2, 0.5)
            } else {
                (0.1, 0.4)
            }
        }
    }
}

/// Strike grid around spot. Indices quote on fixed 50-point intervals;
/// stocks narrow the interval with price.
fn strike_ladder(spot: f64, is_index: bool) -> Vec<f64> {
    let interval = if is_index {
        50.0
    } else if spot > 1000.0 {
        50.0
    } else if spot > 500.0 {
        25.0
    } else {
        10.0
    };
    let center = (spot / interval).round() * interval;

    let min_strike = (spot * LADDER_FLOOR_RATIO).max(center - LADDER_BELOW * interval);
    let max_strike = center + LADDER_ABOVE * interval;

    let mut strikes = Vec::new();
    let mut current = min_strike;
    while current <= max_strike {
        strikes.push(current);
        current += interval;
    }
    strikes
}

/// Last Thursday of the given month (monthly index-option expiry).
fn last_thursday(year: i32, month: u32) -> NaiveDate {
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    // from_ymd_opt(_, _, 1) is always a valid date
    let mut day = first_next
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or_default();
    while day.weekday() != Weekday::Thu {
        day = day.checked_sub_days(Days::new(1)).unwrap_or_default();
    }
    day
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date)
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{FlatNoise, SeededNoise};

    fn cfg() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn test_last_thursday() {
        // September 2026: the 24th is the final Thursday
        assert_eq!(
            last_thursday(2026, 9),
            NaiveDate::from_ymd_opt(2026, 9, 24).unwrap()
        );
        // December rollover path
        assert_eq!(
            last_thursday(2026, 12),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_expiry_dates_are_future_and_ordered() {
        let gen = SyntheticChain::new(cfg());
        let dates = gen.expiry_dates(today());
        assert_eq!(dates.len(), 4);
        let mut prev = today();
        for d in &dates {
            let parsed = NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap();
            assert!(parsed > prev, "expiry {d} out of order");
            prev = parsed;
        }
    }

    #[test]
    fn test_generated_chain_shape() {
        let gen = SyntheticChain::new(cfg());
        let mut noise = SeededNoise::new(11);
        let snap = gen.generate_at("NIFTY", None, today(), &mut noise);

        assert_eq!(snap.symbol, "NIFTY");
        assert!((24300.0..=24700.0).contains(&snap.spot_price));
        assert!(!snap.quotes.is_empty());
        // Call and put at every strike
        assert_eq!(snap.calls().count(), snap.puts().count());

        for q in &snap.quotes {
            assert!(q.strike > 0.0);
            assert!(q.last_price >= 0.1);
            assert!(q.bid <= q.ask);
            assert!((1_000..=50_000).contains(&q.open_interest));
            assert!((100..=10_000).contains(&q.volume));
            assert_eq!(q.expiry, snap.expiry_date);
        }

        // Ladder floor: nothing below 85% of spot
        for q in &snap.quotes {
            assert!(q.strike >= snap.spot_price * 0.85 - 50.0);
        }
    }

    #[test]
    fn test_index_ladder_uses_50_point_interval() {
        let strikes = strike_ladder(24500.0, true);
        assert!(strikes.len() >= 10);
        for pair in strikes.windows(2) {
            assert_eq!(pair[1] - pair[0], 50.0);
        }
    }

    #[test]
    fn test_stock_ladder_interval_narrows_with_price() {
        let sbicard = strike_ladder(850.0, false);
        for pair in sbicard.windows(2) {
            assert_eq!(pair[1] - pair[0], 25.0);
        }
        let cheap = strike_ladder(300.0, false);
        for pair in cheap.windows(2) {
            assert_eq!(pair[1] - pair[0], 10.0);
        }
    }

    #[test]
    fn test_expiry_hint_selected_when_listed() {
        let gen = SyntheticChain::new(cfg());
        let dates = gen.expiry_dates(today());
        let mut noise = FlatNoise::midpoint();
        let snap = gen.generate_at("NIFTY", Some(&dates[2]), today(), &mut noise);
        assert_eq!(snap.expiry_date, dates[2]);

        // Unlisted hints fall back to the nearest expiry
        let mut noise = FlatNoise::midpoint();
        let snap = gen.generate_at("NIFTY", Some("2031-01-01"), today(), &mut noise);
        assert_eq!(snap.expiry_date, dates[0]);
    }

    #[test]
    fn test_unknown_symbol_gets_default_spot() {
        let gen = SyntheticChain::new(cfg());
        let mut noise = FlatNoise::midpoint();
        let snap = gen.generate_at("AAPL", None, today(), &mut noise);
        assert_eq!(snap.spot_price, 20_000.0);
    }

    #[test]
    fn test_generated_chain_is_analyzable() {
        use crate::analyzer::StrategyAnalyzer;
        let gen = SyntheticChain::new(cfg());
        let analyzer = StrategyAnalyzer::new(cfg());
        let mut noise = SeededNoise::new(3);
        let snap = gen.generate_at("BANKNIFTY", None, today(), &mut noise);
        let outcome = analyzer.analyze(&snap, &mut noise);
        assert!(!outcome.is_failed(), "synthetic chain must pass validation");
    }
}
