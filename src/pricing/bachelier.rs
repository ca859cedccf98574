//! Arithmetic (Bachelier-style) pricing model.
//!
//! The underlying carries additive noise with the risk-free drift, so the
//! terminal price is normal with mean `S·e^(rT)` and variance
//! `σ²/(2r)·(e^(2rT) - 1)`. Volatility is quoted in price units.
//!
//! # Formula
//! ```text
//! v = √(σ²/(2r)·(e^(2rT) - 1))
//! d = (S·e^(rT) - K) / v
//! C = e^(-rT)·[(S·e^(rT) - K)·N(d) + v·n(d)]
//! P = e^(-rT)·[(K - S·e^(rT))·N(-d) + v·n(d)]
//! ```
//!
//! A zero rate makes the variance `0/0`; it is not special-cased.

use super::black_scholes::BlackScholes;
use crate::types::{MarketParams, OptionType};

/// Arithmetic pricing model implementation.
pub struct Bachelier;

impl Bachelier {
    /// Standard deviation of the terminal price, `v`.
    #[must_use]
    pub fn std_dev(params: &MarketParams, vol: f64) -> f64 {
        let rate = params.risk_free_rate;
        let growth = (2.0 * rate * params.time_to_expiry).exp_m1();
        (vol * vol / (2.0 * rate) * growth).sqrt()
    }

    /// Calculates the theoretical option price.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `option_type`: Call or put
    /// - `vol`: Volatility in price units (for example `0.30 * spot`)
    ///
    /// # Returns
    /// The discounted expected payoff under normal terminal prices. Not
    /// finite when `r = 0`, `t = 0` or `vol = 0`.
    #[must_use]
    pub fn price(params: &MarketParams, option_type: OptionType, vol: f64) -> f64 {
        let v = Self::std_dev(params, vol);
        let moneyness = params.forward() - params.strike;
        let d = moneyness / v;
        let time_value = v * BlackScholes::norm_pdf(d);

        let undiscounted = match option_type {
            OptionType::Call => moneyness * BlackScholes::norm_cdf(d) + time_value,
            OptionType::Put => -moneyness * BlackScholes::norm_cdf(-d) + time_value,
        };

        params.discount_factor() * undiscounted
    }
}
