//! Pricing residuals the Newton solver drives to zero.

use crate::error::Result;
use crate::pricing::PricingEngine;
use crate::types::{MarketBatch, MarketParams};

/// `f(σ) = price(σ) - observed` for one contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveFunction {
    engine: PricingEngine,
    params: MarketParams,
    observed: f64,
}

impl ObjectiveFunction {
    /// Binds market data and an observed price.
    #[must_use]
    pub fn new(engine: PricingEngine, params: MarketParams, observed: f64) -> Self {
        Self {
            engine,
            params,
            observed,
        }
    }

    /// Market data the residual is evaluated against.
    #[must_use]
    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    /// Observed price being matched.
    #[must_use]
    pub fn observed(&self) -> f64 {
        self.observed
    }

    /// Pricing residual at `vol`.
    #[must_use]
    pub fn residual(&self, vol: f64) -> f64 {
        self.engine.price(&self.params, vol) - self.observed
    }
}

/// Element-wise `f(σ)_i = price_i(σ_i) - observed_i` over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchObjective<'a> {
    engine: PricingEngine,
    batch: &'a MarketBatch,
    observed: &'a [f64],
}

impl<'a> BatchObjective<'a> {
    /// Binds a batch and its quotes. The quotes must be aligned with the batch.
    pub fn new(engine: PricingEngine, batch: &'a MarketBatch, observed: &'a [f64]) -> Result<Self> {
        batch.check_len(observed.len(), "observed prices")?;
        Ok(Self {
            engine,
            batch,
            observed,
        })
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Residual vector at `vols`.
    pub fn residuals(&self, vols: &[f64]) -> Result<Vec<f64>> {
        let prices = self.engine.price_batch(self.batch, vols)?;
        Ok(prices
            .into_iter()
            .zip(self.observed)
            .map(|(price, observed)| price - observed)
            .collect())
    }
}
