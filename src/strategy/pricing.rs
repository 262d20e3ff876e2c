//! Theoretical ITM-probability model.
//!
//! Standard Black-Scholes d1 term with the probability of finishing
//! in-the-money taken as Φ(d1). The same formula is applied to calls and
//! puts without a sign adjustment — that asymmetry is inherited from the
//! original screener and kept for output compatibility (a put's ITM
//! probability would conventionally be 1 − Φ(d1)).
//!
//! Time to expiry is a single configured horizon applied to every
//! contract, regardless of its listed expiration. Another inherited
//! simplification that must stay as-is.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::ModelConfig;

/// Standard normal CDF: Φ(x)
fn norm_cdf(x: f64) -> f64 {
    // Normal::new only fails for non-finite or non-positive std dev.
    Normal::new(0.0, 1.0).unwrap().cdf(x)
}

/// Prices the probability that a contract finishes in-the-money.
///
/// Pure and stateless: identical inputs always produce bit-identical
/// output.
#[derive(Debug, Clone)]
pub struct ProbabilityModel {
    config: ModelConfig,
}

impl ProbabilityModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Access the model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Probability in [0, 1] that an option at `strike` finishes
    /// in-the-money given the current `spot`.
    ///
    /// `implied_volatility` is the contract's quoted σ; absent or NaN
    /// quotes fall back to the configured default. Any arithmetic failure
    /// (non-positive spot/strike, σ = 0 division, non-finite d1) degrades
    /// to probability 0 rather than propagating.
    pub fn probability_itm(&self, spot: f64, strike: f64, implied_volatility: Option<f64>) -> f64 {
        let sigma = implied_volatility
            .filter(|v| v.is_finite())
            .unwrap_or(self.config.default_volatility);

        if !(spot > 0.0 && spot.is_finite()) || !(strike > 0.0 && strike.is_finite()) {
            return 0.0;
        }

        let t = self.config.time_to_expiry_years();
        let r = self.config.risk_free_rate;

        let d1 = ((spot / strike).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
        if !d1.is_finite() {
            return 0.0;
        }

        norm_cdf(d1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ProbabilityModel {
        ProbabilityModel::new(ModelConfig::default())
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let m = model();
        for strike in [1.0, 50.0, 99.0, 100.0, 101.0, 150.0, 10_000.0] {
            let p = m.probability_itm(100.0, strike, Some(0.2));
            assert!((0.0..=1.0).contains(&p), "p={p} for strike={strike}");
        }
    }

    #[test]
    fn test_monotonically_decreasing_in_strike() {
        let m = model();
        let mut prev = f64::INFINITY;
        for strike in [95.0, 100.0, 105.0, 110.0, 120.0, 150.0] {
            let p = m.probability_itm(100.0, strike, Some(0.2));
            assert!(p < prev, "p={p} not below prev={prev} at strike={strike}");
            prev = p;
        }
    }

    #[test]
    fn test_at_the_money_slightly_above_half() {
        // With r > 0 the drift term pushes d1 slightly positive at S == K.
        let p = model().probability_itm(100.0, 100.0, Some(0.2));
        assert!(p > 0.5, "ATM probability {p} should exceed 0.5");
        assert!(p < 0.55, "ATM probability {p} should be only slightly above 0.5");
    }

    #[test]
    fn test_known_value() {
        // S=100, K=105, T=14/365, r=0.01, σ=0.2:
        // d1 = (ln(100/105) + (0.01 + 0.02) * T) / (0.2 * sqrt(T)) ≈ -1.2165
        let p = model().probability_itm(100.0, 105.0, Some(0.2));
        assert!((p - 0.1119).abs() < 0.005, "p={p}");
    }

    #[test]
    fn test_missing_iv_uses_default() {
        let m = model();
        let with_default = m.probability_itm(100.0, 105.0, None);
        let explicit = m.probability_itm(100.0, 105.0, Some(0.2));
        assert_eq!(with_default.to_bits(), explicit.to_bits());
    }

    #[test]
    fn test_nan_iv_uses_default() {
        let m = model();
        let with_nan = m.probability_itm(100.0, 105.0, Some(f64::NAN));
        let explicit = m.probability_itm(100.0, 105.0, Some(0.2));
        assert_eq!(with_nan.to_bits(), explicit.to_bits());
    }

    #[test]
    fn test_invalid_strike_degrades_to_zero() {
        let m = model();
        assert_eq!(m.probability_itm(100.0, 0.0, Some(0.2)), 0.0);
        assert_eq!(m.probability_itm(100.0, -5.0, Some(0.2)), 0.0);
        assert_eq!(m.probability_itm(0.0, 105.0, Some(0.2)), 0.0);
        assert_eq!(m.probability_itm(f64::NAN, 105.0, Some(0.2)), 0.0);
    }

    #[test]
    fn test_zero_sigma_degrades_to_zero_for_otm_call() {
        // σ = 0 divides by zero; d1 is -inf for S < K and Φ(-inf) = 0,
        // never a panic.
        let p = model().probability_itm(100.0, 105.0, Some(0.0));
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_bit_identical_on_repeat() {
        let m = model();
        let a = m.probability_itm(231.57, 250.0, Some(0.31));
        let b = m.probability_itm(231.57, 250.0, Some(0.31));
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_higher_volatility_raises_otm_probability() {
        let m = model();
        let low = m.probability_itm(100.0, 110.0, Some(0.1));
        let high = m.probability_itm(100.0, 110.0, Some(0.5));
        assert!(high > low);
    }
}
