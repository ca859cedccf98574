//! # impliedvol-rs
//!
//! European option pricing under two models and implied volatility
//! inversion with a damped, vectorized Newton-Raphson solver.
//!
//! ## Modules
//!
//! - **`pricing`**: closed-form log-normal (Black-Scholes) and arithmetic
//!   (Bachelier-style) prices, scalar and batch.
//! - **`sensitivity`**: forward-difference vega and delta.
//! - **`objective`**: pricing residuals `price(σ) - observed`.
//! - **`solver`**: the Newton root finder. It consumes a residual closure
//!   and a derivative closure and never raises on non-convergence.
//! - **`implied_volatility`**: wires the above together for scalar, batch
//!   and independent multi-problem solves.
//!
//! ## Degenerate inputs
//!
//! Zero volatility, zero time to expiry, and (for the arithmetic model) a
//! zero rate all divide by zero inside the formulas. They are not trapped:
//! the non-finite result is returned for the caller to detect.
//!
//! ## Example
//!
//! ```
//! use impliedvol_rs::prelude::*;
//!
//! let params = MarketParams::new(100.0, 100.0, 0.25, 0.05);
//! let engine = PricingEngine::new(PricingModel::LogNormal, OptionType::Call);
//! let quote = engine.price(&params, 0.25);
//!
//! let calculator =
//!     ImpliedVolatility::new(PricingModel::LogNormal, OptionType::Call, SolverConfig::default());
//! let iv = calculator.solve(&params, quote, 0.5).unwrap();
//! assert!((iv.iv - 0.25).abs() < 1e-3);
//! ```

pub mod error;
pub mod implied_volatility;
pub mod objective;
pub mod pricing;
pub mod sensitivity;
pub mod solver;
pub mod types;

pub use error::{IVError, Result};
pub use implied_volatility::{DerivativeSource, ImpliedVolatility};
pub use pricing::PricingEngine;
pub use types::{BatchIVResult, IVResult, MarketBatch, MarketParams, OptionType, PricingModel};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::error::{IVError, Result};
    pub use crate::implied_volatility::{DerivativeSource, ImpliedVolatility};
    pub use crate::objective::{BatchObjective, ObjectiveFunction};
    pub use crate::pricing::{Bachelier, BlackScholes, LogNormalPrice, PricingEngine};
    pub use crate::sensitivity::{DEFAULT_BUMP, SensitivityEstimator};
    pub use crate::solver::{
        ConvergenceMetric, NewtonOutcome, NewtonSolver, SolverConfig, SolverStatus,
    };
    pub use crate::types::{
        BatchIVResult, IVResult, MarketBatch, MarketParams, OptionType, PricingModel,
    };
}
