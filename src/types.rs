//! Types for option pricing and IV calculation.

use serde::{Deserialize, Serialize};

use crate::error::{IVError, Result};
use crate::solver::{SolverStatus, SolverTrace};

/// Option type (side of the contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option (right to buy the underlying at strike price).
    Call,
    /// Put option (right to sell the underlying at strike price).
    Put,
}

/// Stochastic model used to price a contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingModel {
    /// Geometric Brownian motion, Black-Scholes closed form.
    #[default]
    LogNormal,
    /// Additive-noise dynamics, Bachelier-style closed form with a
    /// rate-adjusted variance. Volatility is quoted in price units.
    Arithmetic,
}

/// Market data for a single European contract.
///
/// Volatility is not part of the market data: it is either the unknown the
/// solver searches for or an explicit argument when pricing forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Underlying spot price in price units.
    pub spot: f64,
    /// Option strike price in price units.
    pub strike: f64,
    /// Time to expiration in years (e.g., 30 days = 30.0 / 365.0).
    pub time_to_expiry: f64,
    /// Risk-free interest rate (annualized, e.g., 0.05 for 5%).
    pub risk_free_rate: f64,
}

impl MarketParams {
    /// Creates new market parameters.
    ///
    /// # Arguments
    /// - `spot`: Underlying spot price in price units
    /// - `strike`: Option strike price in price units
    /// - `time_to_expiry`: Time to expiration in years
    /// - `risk_free_rate`: Risk-free interest rate (annualized)
    #[must_use]
    pub fn new(spot: f64, strike: f64, time_to_expiry: f64, risk_free_rate: f64) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
        }
    }

    /// Returns a copy with the spot replaced.
    #[must_use]
    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    /// Discount factor `e^(-rT)`.
    #[must_use]
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_expiry).exp()
    }

    /// Spot compounded to expiry, `S·e^(rT)`.
    #[must_use]
    pub fn forward(&self) -> f64 {
        self.spot * (self.risk_free_rate * self.time_to_expiry).exp()
    }

    /// Calculates the undiscounted intrinsic value of the option.
    ///
    /// For calls: max(0, spot - strike)
    /// For puts: max(0, strike - spot)
    #[must_use]
    pub fn intrinsic_value(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => (self.spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.spot).max(0.0),
        }
    }
}

/// Element-aligned batch of market data.
///
/// Every element advances through pricing and solving together; the batch
/// length is the shape every other vector input must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketBatch {
    rows: Vec<MarketParams>,
}

impl MarketBatch {
    /// Creates a batch from already aligned rows.
    #[must_use]
    pub fn new(rows: Vec<MarketParams>) -> Self {
        Self { rows }
    }

    /// Creates a batch from columns.
    ///
    /// A column of length 1 is broadcast to the longest column. Any other
    /// length disagreement is a shape mismatch.
    pub fn from_columns(
        spot: &[f64],
        strike: &[f64],
        time_to_expiry: &[f64],
        risk_free_rate: &[f64],
    ) -> Result<Self> {
        let len = [spot, strike, time_to_expiry, risk_free_rate]
            .iter()
            .map(|column| column.len())
            .max()
            .unwrap_or(0);

        let spot = broadcast(spot, len, "spot column")?;
        let strike = broadcast(strike, len, "strike column")?;
        let time_to_expiry = broadcast(time_to_expiry, len, "time column")?;
        let risk_free_rate = broadcast(risk_free_rate, len, "rate column")?;

        let rows = (0..len)
            .map(|i| MarketParams::new(spot[i], strike[i], time_to_expiry[i], risk_free_rate[i]))
            .collect();
        Ok(Self { rows })
    }

    /// Number of elements in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the batch has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the rows.
    #[must_use]
    pub fn rows(&self) -> &[MarketParams] {
        &self.rows
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, MarketParams> {
        self.rows.iter()
    }

    /// Fails with [`IVError::ShapeMismatch`] unless `actual` equals the batch length.
    pub fn check_len(&self, actual: usize, context: &'static str) -> Result<()> {
        if actual != self.rows.len() {
            return Err(IVError::ShapeMismatch {
                context,
                expected: self.rows.len(),
                actual,
            });
        }
        Ok(())
    }
}

impl From<Vec<MarketParams>> for MarketBatch {
    fn from(rows: Vec<MarketParams>) -> Self {
        Self::new(rows)
    }
}

impl<'a> IntoIterator for &'a MarketBatch {
    type Item = &'a MarketParams;
    type IntoIter = std::slice::Iter<'a, MarketParams>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn broadcast(column: &[f64], len: usize, context: &'static str) -> Result<Vec<f64>> {
    match column.len() {
        1 => Ok(vec![column[0]; len]),
        n if n == len => Ok(column.to_vec()),
        actual => Err(IVError::ShapeMismatch {
            context,
            expected: len,
            actual,
        }),
    }
}

/// Result of a scalar IV calculation.
///
/// The solver never raises on non-convergence, so callers check
/// [`IVResult::is_converged`] (or the residual) before trusting `iv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IVResult {
    /// Implied volatility. Decimal for the log-normal model (0.25 = 25%),
    /// price units for the arithmetic model.
    pub iv: f64,
    /// Number of solver iterations performed.
    pub iterations: u32,
    /// Convergence metric at termination.
    pub epsilon: f64,
    /// Pricing residual observed at the last iteration.
    pub residual: f64,
    /// Vega observed at the last iteration.
    pub vega: f64,
    /// How the solve terminated.
    pub status: SolverStatus,
    /// `(residual, vega)` per iteration, present when the solver
    /// configuration asked for a trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<SolverTrace<f64>>,
}

impl IVResult {
    /// Returns true if the solver met its tolerance.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// Result of a lockstep batch IV calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchIVResult {
    /// Implied volatility per element.
    pub ivs: Vec<f64>,
    /// Number of solver iterations, shared by every element.
    pub iterations: u32,
    /// Convergence metric at termination (across the whole batch).
    pub epsilon: f64,
    /// Pricing residual per element at the last iteration.
    pub residuals: Vec<f64>,
    /// Vega per element at the last iteration.
    pub vegas: Vec<f64>,
    /// How the solve terminated.
    pub status: SolverStatus,
    /// Per-iteration residual and vega vectors, present when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<SolverTrace<Vec<f64>>>,
}

impl BatchIVResult {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ivs.len()
    }

    /// Returns true if the batch was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ivs.is_empty()
    }

    /// Returns true if the solver met its tolerance.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    /// Largest absolute residual across the batch.
    #[must_use]
    pub fn max_abs_residual(&self) -> f64 {
        self.residuals.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()))
    }
}
