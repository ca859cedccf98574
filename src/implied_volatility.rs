//! Implied volatility from observed option prices.
//!
//! Wires a [`PricingEngine`], an [`ObjectiveFunction`] and a vega supplier
//! into the [`NewtonSolver`]:
//!
//! ```text
//! σ_{n+1} = σ_n - (price(σ_n) - observed) / vega(σ_n)
//! ```
//!
//! Non-convergence does not produce an error. Check
//! [`IVResult::is_converged`] or the residual before using the volatility.
//!
//! # Example
//!
//! ```
//! use impliedvol_rs::prelude::*;
//!
//! let params = MarketParams::new(105.0, 105.0, 30.0 / 365.0, 0.01);
//! let engine = PricingEngine::new(PricingModel::Arithmetic, OptionType::Call);
//! let quote = engine.price(&params, 0.30 * 105.0);
//!
//! let solver = ImpliedVolatility::new(
//!     PricingModel::Arithmetic,
//!     OptionType::Call,
//!     SolverConfig::default(),
//! );
//! let result = solver.solve(&params, quote, 20.0).unwrap();
//!
//! assert!(result.is_converged());
//! assert!((result.iv - 31.5).abs() < 0.05);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::objective::{BatchObjective, ObjectiveFunction};
use crate::pricing::{BlackScholes, PricingEngine};
use crate::sensitivity::SensitivityEstimator;
use crate::solver::{NewtonSolver, SolverConfig};
use crate::types::{BatchIVResult, IVResult, MarketBatch, MarketParams, OptionType, PricingModel};

/// Where the solver's derivative comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeSource {
    /// Forward difference with the configured bump.
    #[default]
    FiniteDifference,
    /// Closed-form Black-Scholes vega. The arithmetic model has no
    /// closed-form vega here and falls back to the forward difference.
    Analytic,
}

/// Implied volatility calculator for one model and side.
#[derive(Debug, Clone)]
pub struct ImpliedVolatility {
    engine: PricingEngine,
    solver: NewtonSolver,
    derivative: DerivativeSource,
}

impl ImpliedVolatility {
    /// Creates a calculator using finite-difference vega.
    #[must_use]
    pub fn new(model: PricingModel, option_type: OptionType, config: SolverConfig) -> Self {
        Self {
            engine: PricingEngine::new(model, option_type),
            solver: NewtonSolver::new(config),
            derivative: DerivativeSource::default(),
        }
    }

    /// Selects the vega supplier.
    #[must_use]
    pub fn with_derivative(mut self, derivative: DerivativeSource) -> Self {
        self.derivative = derivative;
        self
    }

    /// Pricing engine the quotes are inverted against.
    #[must_use]
    pub fn engine(&self) -> PricingEngine {
        self.engine
    }

    /// Solver configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        self.solver.config()
    }

    /// Vega supplier actually used, after the arithmetic fallback.
    #[must_use]
    pub fn effective_derivative(&self) -> DerivativeSource {
        match (self.derivative, self.engine.model()) {
            (DerivativeSource::Analytic, PricingModel::LogNormal) => DerivativeSource::Analytic,
            _ => DerivativeSource::FiniteDifference,
        }
    }

    /// Starting point derived from the quote.
    ///
    /// Uses the Brenner-Subrahmanyam approximation `σ ≈ price / (0.4·S·√T)`,
    /// clamped to `[0.05, 2.0]`, floored at the inflection point of the
    /// log-normal price `√(2·|ln(S/K) + rT| / T)`. Away from the money a
    /// start below the inflection point sits on a flat stretch of the price
    /// curve and Newton overshoots. For the arithmetic model the result is
    /// scaled by spot to express it in price units.
    #[must_use]
    pub fn initial_guess(&self, params: &MarketParams, quote: f64) -> f64 {
        let time = params.time_to_expiry;
        let brenner = (quote / (0.4 * params.spot * time.sqrt())).clamp(0.05, 2.0);
        let log_moneyness = (params.spot / params.strike).ln() + params.risk_free_rate * time;
        let inflection = (2.0 * log_moneyness.abs() / time).sqrt();
        let guess = brenner.max(inflection);

        match self.engine.model() {
            PricingModel::LogNormal => guess,
            PricingModel::Arithmetic => guess * params.spot,
        }
    }

    /// Inverts one observed price.
    ///
    /// # Arguments
    /// - `params`: Market data (spot, strike, time, rate)
    /// - `quote`: Observed option price
    /// - `initial_guess`: Starting volatility in the model's units
    ///
    /// # Returns
    /// An [`IVResult`] carrying the volatility, diagnostics and, when the
    /// configuration asks for it, the per-iteration trace
    ///
    /// # Errors
    /// Configuration and guess errors from [`NewtonSolver::solve`].
    pub fn solve(&self, params: &MarketParams, quote: f64, initial_guess: f64) -> Result<IVResult> {
        trace!(
            "solving IV: model={:?}, type={:?}, quote={}, guess={}",
            self.engine.model(),
            self.engine.option_type(),
            quote,
            initial_guess
        );

        let objective = ObjectiveFunction::new(self.engine, *params, quote);
        let estimator = SensitivityEstimator::new(self.engine).with_bump(self.config().bump);
        let analytic = self.effective_derivative() == DerivativeSource::Analytic;

        let outcome = self.solver.solve_scalar(
            |vol| objective.residual(vol),
            |vol| {
                if analytic {
                    BlackScholes::vega(params, vol)
                } else {
                    estimator.vega(params, vol)
                }
            },
            initial_guess,
        )?;

        debug!(
            "IV solve finished: iv={}, iterations={}, status={:?}",
            outcome.root, outcome.iterations, outcome.status
        );

        Ok(IVResult {
            iv: outcome.root,
            iterations: outcome.iterations,
            epsilon: outcome.epsilon,
            residual: outcome.residual,
            vega: outcome.derivative,
            status: outcome.status,
            trace: outcome.trace,
        })
    }

    /// Inverts a batch of observed prices in one lockstep vector solve.
    ///
    /// # Arguments
    /// - `batch`: Market data per element
    /// - `quotes`: Observed prices, one per element
    /// - `initial_guess`: Starting volatilities, one per element
    ///
    /// # Returns
    /// A [`BatchIVResult`]. A non-finite element does not stop the others;
    /// it keeps the batch from reporting convergence.
    ///
    /// # Errors
    /// [`IVError::ShapeMismatch`](crate::IVError::ShapeMismatch) if `quotes`
    /// or `initial_guess` are not aligned with `batch`, plus the errors of
    /// [`NewtonSolver::solve`].
    pub fn solve_batch(
        &self,
        batch: &MarketBatch,
        quotes: &[f64],
        initial_guess: Vec<f64>,
    ) -> Result<BatchIVResult> {
        batch.check_len(initial_guess.len(), "initial guess")?;
        let objective = BatchObjective::new(self.engine, batch, quotes)?;
        let estimator = SensitivityEstimator::new(self.engine).with_bump(self.config().bump);
        let analytic = self.effective_derivative() == DerivativeSource::Analytic;

        trace!("solving IV batch of {} elements", objective.len());

        let outcome = self.solver.solve(
            |vols: &Vec<f64>| objective.residuals(vols),
            |vols: &Vec<f64>| {
                if analytic {
                    Ok(batch
                        .iter()
                        .zip(vols)
                        .map(|(params, &vol)| BlackScholes::vega(params, vol))
                        .collect())
                } else {
                    estimator.vega_batch(batch, vols)
                }
            },
            initial_guess,
        )?;

        debug!(
            "IV batch solve finished: iterations={}, status={:?}",
            outcome.iterations, outcome.status
        );

        Ok(BatchIVResult {
            ivs: outcome.root,
            iterations: outcome.iterations,
            epsilon: outcome.epsilon,
            residuals: outcome.residual,
            vegas: outcome.derivative,
            status: outcome.status,
            trace: outcome.trace,
        })
    }

    /// Inverts independent `(market, quote)` problems, one scalar solve each.
    ///
    /// # Arguments
    /// - `problems`: `(market data, observed price)` pairs
    /// - `initial_guess`: Shared starting volatility, or `None` for a per-problem heuristic
    ///
    /// # Returns
    /// One result per problem, in input order
    ///
    /// With the `parallel` feature the solves run on the rayon pool. A
    /// `None` guess uses [`ImpliedVolatility::initial_guess`] per problem.
    pub fn solve_many(
        &self,
        problems: &[(MarketParams, f64)],
        initial_guess: Option<f64>,
    ) -> Vec<Result<IVResult>> {
        let solve_one = |(params, quote): &(MarketParams, f64)| {
            let guess = initial_guess.unwrap_or_else(|| self.initial_guess(params, *quote));
            self.solve(params, *quote, guess)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            problems.par_iter().map(solve_one).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            problems.iter().map(solve_one).collect()
        }
    }
}
