//! Black-Scholes (log-normal) pricing model and analytic Greeks.
//!
//! The formulas are evaluated as written: a zero volatility or a zero time
//! to expiry divides by zero inside `d1` and the resulting non-finite or
//! limiting values are returned to the caller untouched.

use std::f64::consts::PI;

use crate::types::{MarketParams, OptionType};

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Log-normal price together with the standardized distances behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormalPrice {
    /// Theoretical option price.
    pub price: f64,
    /// `d1 = [ln(S/K) + (r + σ²/2)T] / (σ√T)`
    pub d1: f64,
    /// `d2 = d1 - σ√T`
    pub d2: f64,
}

/// Log-normal model: European prices, vega and delta in closed form, plus
/// the normal distribution helpers shared with the arithmetic model.
pub struct BlackScholes;

impl BlackScholes {
    /// Error function, Abramowitz & Stegun 7.1.26 (|error| ≤ 1.5e-7).
    ///
    /// Odd away from the origin, so `Φ(x) + Φ(-x) = 1` to rounding for
    /// `x != 0`. At the origin the polynomial leaves `erf(0) ≈ 1e-9`, which
    /// offsets `Φ(0) + Φ(-0)` from 1 by the same amount.
    #[must_use]
    pub fn erf(x: f64) -> f64 {
        const A1: f64 = 0.254829592;
        const A2: f64 = -0.284496736;
        const A3: f64 = 1.421413741;
        const A4: f64 = -1.453152027;
        const A5: f64 = 1.061405429;
        const P: f64 = 0.3275911;

        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let x = x.abs();

        let t = 1.0 / (1.0 + P * x);
        let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

        sign * y
    }

    /// Standard normal cumulative distribution function, Φ(x).
    #[must_use]
    pub fn norm_cdf(x: f64) -> f64 {
        0.5 * (1.0 + Self::erf(x / SQRT_2))
    }

    /// Standard normal probability density function, φ(x).
    #[must_use]
    pub fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// `d1 = [ln(S/K) + (r + σ²/2)T] / (σ√T)`
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `vol`: Volatility (decimal, e.g. 0.25 for 25%)
    ///
    /// # Returns
    /// The standardized distance `d1`; NaN or infinite when `σ√T = 0`
    #[must_use]
    pub fn d1(params: &MarketParams, vol: f64) -> f64 {
        let time = params.time_to_expiry;
        ((params.spot / params.strike).ln() + (params.risk_free_rate + 0.5 * vol * vol) * time)
            / (vol * time.sqrt())
    }

    /// `d2 = d1 - σ√T`
    #[must_use]
    pub fn d2(d1: f64, vol: f64, time: f64) -> f64 {
        d1 - vol * time.sqrt()
    }

    /// Price plus the distances it was computed from.
    ///
    /// ```text
    /// C = S·Φ(d1) - K·e^(-rT)·Φ(d2)
    /// P = K·e^(-rT)·Φ(-d2) - S·Φ(-d1)
    /// ```
    #[must_use]
    pub fn price_with_distances(
        params: &MarketParams,
        option_type: OptionType,
        vol: f64,
    ) -> LogNormalPrice {
        let d1 = Self::d1(params, vol);
        let d2 = Self::d2(d1, vol, params.time_to_expiry);
        let discounted_strike = params.strike * params.discount_factor();

        let price = match option_type {
            OptionType::Call => {
                params.spot * Self::norm_cdf(d1) - discounted_strike * Self::norm_cdf(d2)
            }
            OptionType::Put => {
                discounted_strike * Self::norm_cdf(-d2) - params.spot * Self::norm_cdf(-d1)
            }
        };

        LogNormalPrice { price, d1, d2 }
    }

    /// Log-normal price of a European option.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `option_type`: Call or put
    /// - `vol`: Volatility (decimal)
    ///
    /// # Returns
    /// Theoretical option price
    #[must_use]
    pub fn price(params: &MarketParams, option_type: OptionType, vol: f64) -> f64 {
        Self::price_with_distances(params, option_type, vol).price
    }

    /// Analytic vega `S·φ(d1)·√T`, the same for both sides.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `vol`: Volatility (decimal)
    ///
    /// # Returns
    /// Price change per unit of volatility (not per percentage point)
    #[must_use]
    pub fn vega(params: &MarketParams, vol: f64) -> f64 {
        let d1 = Self::d1(params, vol);
        params.spot * Self::norm_pdf(d1) * params.time_to_expiry.sqrt()
    }

    /// Analytic delta: `Φ(d1)` for a call, `Φ(d1) - 1` for a put.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `option_type`: Call or put
    /// - `vol`: Volatility (decimal)
    ///
    /// # Returns
    /// Price change per unit of spot, in `(0, 1)` for calls and `(-1, 0)` for puts
    #[must_use]
    pub fn delta(params: &MarketParams, option_type: OptionType, vol: f64) -> f64 {
        let d1 = Self::d1(params, vol);

        match option_type {
            OptionType::Call => Self::norm_cdf(d1),
            OptionType::Put => Self::norm_cdf(d1) - 1.0,
        }
    }
}
