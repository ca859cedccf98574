//! Closed-form European option pricing.
//!
//! [`PricingEngine`] binds a [`PricingModel`] and an [`OptionType`] and
//! evaluates prices for a scalar [`MarketParams`] or element-wise over a
//! [`MarketBatch`]. It holds no state beyond that pair, so it is `Copy`,
//! `Send` and `Sync` and can be shared freely between independent solves.

mod bachelier;
mod black_scholes;

pub use bachelier::Bachelier;
pub use black_scholes::{BlackScholes, LogNormalPrice};

use crate::error::Result;
use crate::types::{MarketBatch, MarketParams, OptionType, PricingModel};

/// Prices European options under a fixed model and side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    model: PricingModel,
    option_type: OptionType,
}

impl PricingEngine {
    /// Creates an engine for the given model and side.
    #[must_use]
    pub fn new(model: PricingModel, option_type: OptionType) -> Self {
        Self { model, option_type }
    }

    /// Model this engine prices under.
    #[must_use]
    pub fn model(&self) -> PricingModel {
        self.model
    }

    /// Side this engine prices.
    #[must_use]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Theoretical price of one contract at volatility `vol`.
    #[must_use]
    pub fn price(&self, params: &MarketParams, vol: f64) -> f64 {
        match self.model {
            PricingModel::LogNormal => BlackScholes::price(params, self.option_type, vol),
            PricingModel::Arithmetic => Bachelier::price(params, self.option_type, vol),
        }
    }

    /// Element-wise prices across a batch.
    ///
    /// `vols` must have one entry per batch element.
    pub fn price_batch(&self, batch: &MarketBatch, vols: &[f64]) -> Result<Vec<f64>> {
        batch.check_len(vols.len(), "volatility vector")?;
        Ok(batch
            .iter()
            .zip(vols)
            .map(|(params, &vol)| self.price(params, vol))
            .collect())
    }
}
