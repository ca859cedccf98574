//! Finite-difference sensitivities.
//!
//! First-order forward differences against a [`PricingEngine`]:
//! `(price(x + h) - price(x)) / h`. This is the default derivative supplier
//! for the Newton solver, and the only one available for the arithmetic
//! model.

use crate::error::Result;
use crate::pricing::PricingEngine;
use crate::types::{MarketBatch, MarketParams};

/// Default forward-difference step.
pub const DEFAULT_BUMP: f64 = 1e-6;

/// Forward-difference vega and delta estimator.
///
/// Deterministic for a fixed bump; no state is retained between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityEstimator {
    engine: PricingEngine,
    bump: f64,
}

impl SensitivityEstimator {
    /// Creates an estimator with the default bump of `1e-6`.
    #[must_use]
    pub fn new(engine: PricingEngine) -> Self {
        Self {
            engine,
            bump: DEFAULT_BUMP,
        }
    }

    /// Sets the forward-difference step.
    #[must_use]
    pub fn with_bump(mut self, bump: f64) -> Self {
        self.bump = bump;
        self
    }

    /// Forward-difference step in use.
    #[must_use]
    pub fn bump(&self) -> f64 {
        self.bump
    }

    /// Engine the sensitivities are taken against.
    #[must_use]
    pub fn engine(&self) -> PricingEngine {
        self.engine
    }

    /// ∂price/∂σ ≈ `(price(σ + h) - price(σ)) / h`.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `vol`: Volatility in the engine's units
    ///
    /// # Returns
    /// Forward-difference vega with step `h = self.bump()`
    #[must_use]
    pub fn vega(&self, params: &MarketParams, vol: f64) -> f64 {
        let base = self.engine.price(params, vol);
        let bumped = self.engine.price(params, vol + self.bump);
        (bumped - base) / self.bump
    }

    /// ∂price/∂S ≈ `(price(S + h) - price(S)) / h`.
    ///
    /// # Arguments
    /// - `params`: Market data; only the spot is bumped
    /// - `vol`: Volatility in the engine's units
    ///
    /// # Returns
    /// Forward-difference delta with step `h = self.bump()`
    #[must_use]
    pub fn delta(&self, params: &MarketParams, vol: f64) -> f64 {
        let base = self.engine.price(params, vol);
        let bumped_params = params.with_spot(params.spot + self.bump);
        let bumped = self.engine.price(&bumped_params, vol);
        (bumped - base) / self.bump
    }

    /// Element-wise vega across a batch.
    pub fn vega_batch(&self, batch: &MarketBatch, vols: &[f64]) -> Result<Vec<f64>> {
        batch.check_len(vols.len(), "volatility vector")?;
        Ok(batch
            .iter()
            .zip(vols)
            .map(|(params, &vol)| self.vega(params, vol))
            .collect())
    }

    /// Element-wise delta across a batch.
    pub fn delta_batch(&self, batch: &MarketBatch, vols: &[f64]) -> Result<Vec<f64>> {
        batch.check_len(vols.len(), "volatility vector")?;
        Ok(batch
            .iter()
            .zip(vols)
            .map(|(params, &vol)| self.delta(params, vol))
            .collect())
    }
}
