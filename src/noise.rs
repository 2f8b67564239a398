use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of bounded random perturbations.
///
/// The premium and margin estimates are deliberate approximations standing in
/// for live-quote-derived values, and the synthetic chain generator needs
/// jittered spots and open interest. All of that randomness flows through
/// this trait so a pass can be made fully reproducible: handlers use an
/// entropy-seeded source, tests use a fixed seed or a constant.
pub trait NoiseSource: Send {
    /// Uniform draw in [lo, hi).
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;

    /// Uniform integer draw in [lo, hi].
    fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        self.uniform(lo as f64, (hi + 1) as f64).floor() as i64
    }
}

/// PRNG-backed noise. Seedable for reproducible runs.
pub struct SeededNoise {
    rng: SmallRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: SmallRng::from_os_rng() }
    }
}

impl NoiseSource for SeededNoise {
    #[inline]
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }
}

/// Constant noise: every draw lands at the same fraction of its range.
/// `FlatNoise::midpoint()` makes strangle premiums and margins exact,
/// hand-checkable numbers in tests.
pub struct FlatNoise {
    fraction: f64,
}

impl FlatNoise {
    pub fn new(fraction: f64) -> Self {
        Self { fraction: fraction.clamp(0.0, 1.0) }
    }

    pub fn midpoint() -> Self {
        Self::new(0.5)
    }

    pub fn floor() -> Self {
        Self::new(0.0)
    }
}

impl NoiseSource for FlatNoise {
    #[inline]
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.fraction * (hi - lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SeededNoise::new(42);
        let mut b = SeededNoise::new(42);
        for _ in 0..10 {
            assert_eq!(a.uniform(0.1, 0.5), b.uniform(0.1, 0.5));
        }
    }

    #[test]
    fn test_seeded_stays_in_range() {
        let mut n = SeededNoise::new(7);
        for _ in 0..1000 {
            let x = n.uniform(0.1, 0.5);
            assert!((0.1..0.5).contains(&x), "draw {x} out of range");
        }
    }

    #[test]
    fn test_flat_midpoint() {
        let mut n = FlatNoise::midpoint();
        assert!((n.uniform(0.1, 0.5) - 0.3).abs() < 1e-12);
        assert_eq!(n.uniform(4.0, 8.0), 6.0);
    }

    #[test]
    fn test_uniform_int_bounds() {
        let mut n = SeededNoise::new(1);
        for _ in 0..1000 {
            let v = n.uniform_int(1000, 50000);
            assert!((1000..=50000).contains(&v), "draw {v} out of range");
        }
    }
}
