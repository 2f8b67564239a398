use crate::chain::OptionSide;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Sensitivities of an option price. Recomputed on demand, never cached:
/// spot and vol inputs vary per invocation.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct Greeks {
    pub delta: f64,
    /// Side-independent.
    pub gamma: f64,
    /// Per calendar day (annualized value / 365).
    pub theta: f64,
    /// Per 1 vol point (annualized value / 100).
    pub vega: f64,
    /// Per 1 rate point (annualized value / 100).
    pub rho: f64,
}

/// Newton-Raphson starting volatility, also the default substituted when the
/// solver fails to converge.
pub const IV_INITIAL_GUESS: f64 = 0.20;

/// Solver clamp domain. A terminal estimate at or below the floor is
/// reported as absent, not as a volatility.
pub const IV_FLOOR: f64 = 0.001;
pub const IV_CEILING: f64 = 5.0;

/// Black-Scholes European option pricing and implied-vol inversion.
///
/// call = S*Phi(d1) - K*e^(-rT)*Phi(d2)
/// put  = K*e^(-rT)*Phi(-d2) - S*Phi(-d1)
///
/// where d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma*sqrt(T))
/// and   d2 = d1 - sigma*sqrt(T).
///
/// Every method is a pure function of its arguments; the struct only holds
/// the standard normal distribution (created once, reused).
pub struct BlackScholes {
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        // Normal::new(0, 1) only fails if std_dev <= 0; this is safe.
        let normal = Normal::new(0.0, 1.0).unwrap_or_else(|_| Normal::standard());
        Self { normal }
    }

    /// Standard normal CDF.
    #[inline]
    pub fn cdf(&self, x: f64) -> f64 {
        self.normal.cdf(x)
    }

    /// Theoretical price. At or past expiry (T <= 0) this is the exact
    /// intrinsic value; otherwise the closed-form price, floored at zero to
    /// guard against numerical negativity.
    pub fn price(&self, side: OptionSide, s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
        if t <= 0.0 {
            return intrinsic(side, s, k);
        }
        let d1 = d1(s, k, t, r, sigma);
        let d2 = d2(d1, sigma, t);
        let discount = (-r * t).exp();
        let price = match side {
            OptionSide::Call => s * self.cdf(d1) - k * discount * self.cdf(d2),
            OptionSide::Put => k * discount * self.cdf(-d2) - s * self.cdf(-d1),
        };
        price.max(0.0)
    }

    /// The five standard Greeks. All zero at or past expiry: no sensitivity
    /// remains once the contract has settled.
    pub fn greeks(&self, side: OptionSide, s: f64, k: f64, t: f64, r: f64, sigma: f64) -> Greeks {
        if t <= 0.0 {
            return Greeks::default();
        }
        let d1 = d1(s, k, t, r, sigma);
        let d2 = d2(d1, sigma, t);
        let pdf_d1 = self.normal.pdf(d1);
        let sqrt_t = t.sqrt();
        let discount = (-r * t).exp();

        let delta = match side {
            OptionSide::Call => self.cdf(d1),
            OptionSide::Put => self.cdf(d1) - 1.0,
        };
        let gamma = pdf_d1 / (s * sigma * sqrt_t);
        let decay = -(s * pdf_d1 * sigma) / (2.0 * sqrt_t);
        let theta = match side {
            OptionSide::Call => (decay - r * k * discount * self.cdf(d2)) / 365.0,
            OptionSide::Put => (decay + r * k * discount * self.cdf(-d2)) / 365.0,
        };
        let vega = s * pdf_d1 * sqrt_t / 100.0;
        let rho = match side {
            OptionSide::Call => k * t * discount * self.cdf(d2) / 100.0,
            OptionSide::Put => -k * t * discount * self.cdf(-d2) / 100.0,
        };

        Greeks { delta, gamma, theta, vega, rho }
    }

    /// Invert an observed market price to an implied volatility via
    /// Newton-Raphson, starting at 0.20 and clamped to [0.001, 5.0] each step.
    ///
    /// Returns None when T <= 0 or when the solver exhausts its iterations
    /// with the estimate stuck at the floor. This is an approximate solver:
    /// extreme moneyness or very short expiries may not converge, and the
    /// absent case means "volatility undetermined", never zero.
    pub fn implied_volatility(
        &self,
        side: OptionSide,
        market_price: f64,
        s: f64,
        k: f64,
        t: f64,
        r: f64,
        max_iterations: u32,
        tolerance: f64,
    ) -> Option<f64> {
        if t <= 0.0 {
            return None;
        }
        let mut sigma = IV_INITIAL_GUESS;
        for _ in 0..max_iterations {
            let price = self.price(side, s, k, t, r, sigma);
            let diff = market_price - price;
            if diff.abs() < tolerance {
                return Some(sigma);
            }
            // Raw (unscaled) vega is the price derivative w.r.t. sigma.
            let vega = self.greeks(side, s, k, t, r, sigma).vega * 100.0;
            if vega == 0.0 {
                break;
            }
            sigma += diff / vega;
            sigma = sigma.clamp(IV_FLOOR, IV_CEILING);
        }
        (sigma > IV_FLOOR).then_some(sigma)
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn intrinsic(side: OptionSide, s: f64, k: f64) -> f64 {
    match side {
        OptionSide::Call => (s - k).max(0.0),
        OptionSide::Put => (k - s).max(0.0),
    }
}

#[inline]
fn d1(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
}

#[inline]
fn d2(d1: f64, sigma: f64, t: f64) -> f64 {
    d1 - sigma * t.sqrt()
}
