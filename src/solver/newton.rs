//! Damped, vectorized Newton-Raphson root finder.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::config::{ConvergenceMetric, SolverConfig};
use crate::error::{IVError, Result};

/// Shape of the quantity being solved for: a scalar or an element-aligned
/// vector. Residuals and derivatives share the estimate's shape.
pub trait Estimate: Clone {
    /// Metric used when the configuration does not override it.
    const DEFAULT_METRIC: ConvergenceMetric;

    /// Elements as a slice (length 1 for scalars).
    fn values(&self) -> &[f64];

    /// Mutable elements.
    fn values_mut(&mut self) -> &mut [f64];
}

impl Estimate for f64 {
    const DEFAULT_METRIC: ConvergenceMetric = ConvergenceMetric::RelativeChange;

    fn values(&self) -> &[f64] {
        std::slice::from_ref(self)
    }

    fn values_mut(&mut self) -> &mut [f64] {
        std::slice::from_mut(self)
    }
}

impl Estimate for Vec<f64> {
    const DEFAULT_METRIC: ConvergenceMetric = ConvergenceMetric::MaxAbsoluteChange;

    fn values(&self) -> &[f64] {
        self.as_slice()
    }

    fn values_mut(&mut self) -> &mut [f64] {
        self.as_mut_slice()
    }
}

/// Terminal state of a solve.
///
/// The loop itself is the iterating state; a returned outcome is always in
/// one of these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// The convergence metric dropped below the tolerance.
    Converged,
    /// The iteration cap was reached, or every element of the estimate became
    /// non-finite, before convergence. The outcome still carries the last
    /// estimate.
    Aborted,
}

/// One iteration's residual and derivative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry<E> {
    /// `f(R)` at the start of the iteration.
    pub residual: E,
    /// `f'(R)` at the start of the iteration.
    pub derivative: E,
}

/// Ordered per-iteration diagnostics. Consumed by iterating over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolverTrace<E> {
    entries: Vec<TraceEntry<E>>,
}

impl<E> SolverTrace<E> {
    /// Number of recorded iterations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> IntoIterator for SolverTrace<E> {
    type Item = TraceEntry<E>;
    type IntoIter = std::vec::IntoIter<TraceEntry<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Everything a solve returns.
///
/// `residual` and `derivative` are the values evaluated at the estimate the
/// final step started from, i.e. the ones that produced `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonOutcome<E> {
    /// Final estimate.
    pub root: E,
    /// Iterations performed.
    pub iterations: u32,
    /// Convergence metric of the final step.
    pub epsilon: f64,
    /// Last residual.
    pub residual: E,
    /// Last derivative.
    pub derivative: E,
    /// How the solve terminated.
    pub status: SolverStatus,
    /// Per-iteration diagnostics, present only when tracing was requested.
    pub trace: Option<SolverTrace<E>>,
}

impl<E> NewtonOutcome<E> {
    /// Returns true if the tolerance was met.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// Working set of one solve. Never shared between solves.
struct SolverState<E> {
    estimate: E,
    iterations: u32,
    trace: Option<Vec<TraceEntry<E>>>,
}

impl<E: Estimate> SolverState<E> {
    fn new(estimate: E, record_trace: bool) -> Self {
        Self {
            estimate,
            iterations: 0,
            trace: record_trace.then(Vec::new),
        }
    }

    fn record(&mut self, residual: &E, derivative: &E) {
        if let Some(entries) = self.trace.as_mut() {
            entries.push(TraceEntry {
                residual: residual.clone(),
                derivative: derivative.clone(),
            });
        }
    }

    fn finish(
        self,
        epsilon: f64,
        residual: E,
        derivative: E,
        status: SolverStatus,
    ) -> NewtonOutcome<E> {
        NewtonOutcome {
            root: self.estimate,
            iterations: self.iterations,
            epsilon,
            residual,
            derivative,
            status,
            trace: self.trace.map(|entries| SolverTrace { entries }),
        }
    }
}

/// Newton-Raphson root finder with damping on non-positive slopes.
///
/// Each iteration takes the raw step `R - f(R) / f'(R)`. Elements whose
/// derivative is not positive have that result scaled by 1.5 instead of
/// being trusted as is. Vector estimates advance in lockstep: every element
/// is stepped on every iteration until the metric over the whole vector
/// drops below the tolerance.
///
/// Non-convergence is not an error. The outcome reports
/// [`SolverStatus::Aborted`] with the last estimate and diagnostics.
///
/// # Example
///
/// ```
/// use impliedvol_rs::solver::{NewtonSolver, SolverConfig};
///
/// let solver = NewtonSolver::new(SolverConfig::new().with_tolerance(1e-10));
/// let outcome = solver
///     .solve_scalar(|x| x * x - 2.0, |x| 2.0 * x, 1.0)
///     .unwrap();
///
/// assert!(outcome.is_converged());
/// assert!((outcome.root - std::f64::consts::SQRT_2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    config: SolverConfig,
}

impl NewtonSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Creates a solver with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Returns a reference to the solver configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves a scalar problem from infallible closures.
    pub fn solve_scalar<F, G>(
        &self,
        mut f: F,
        mut f_prime: G,
        initial_guess: f64,
    ) -> Result<NewtonOutcome<f64>>
    where
        F: FnMut(f64) -> f64,
        G: FnMut(f64) -> f64,
    {
        self.solve(
            |r: &f64| Ok(f(*r)),
            |r: &f64| Ok(f_prime(*r)),
            initial_guess,
        )
    }

    /// Drives `f` to zero starting from `initial_guess`.
    ///
    /// # Arguments
    /// - `f`: Residual, same shape as the estimate
    /// - `f_prime`: Derivative of `f`, same shape as the estimate
    /// - `initial_guess`: Starting estimate; no element may be zero or non-finite
    ///
    /// # Returns
    /// A [`NewtonOutcome`] with status `Converged` or `Aborted`. Reaching
    /// the iteration cap is not an error.
    ///
    /// # Errors
    /// - [`IVError::InvalidConfig`] for an unusable configuration or an
    ///   empty guess vector.
    /// - [`IVError::InvalidGuess`] if any guess element is zero or
    ///   non-finite.
    /// - [`IVError::ShapeMismatch`] if `f` or `f_prime` return a different
    ///   number of elements than the estimate.
    /// - Any error returned by `f` or `f_prime`.
    pub fn solve<E, F, G>(
        &self,
        mut f: F,
        mut f_prime: G,
        initial_guess: E,
    ) -> Result<NewtonOutcome<E>>
    where
        E: Estimate,
        F: FnMut(&E) -> Result<E>,
        G: FnMut(&E) -> Result<E>,
    {
        self.config.validate()?;
        validate_guess(initial_guess.values())?;

        let metric = self.config.metric.unwrap_or(E::DEFAULT_METRIC);
        let mut state = SolverState::new(initial_guess, self.config.trace);

        loop {
            let residual = f(&state.estimate)?;
            check_shape(&state.estimate, &residual, "residual")?;
            let derivative = f_prime(&state.estimate)?;
            check_shape(&state.estimate, &derivative, "derivative")?;
            state.record(&residual, &derivative);

            let mut next = state.estimate.clone();
            let damped = newton_step(
                state.estimate.values(),
                residual.values(),
                derivative.values(),
                next.values_mut(),
            );
            let epsilon = metric.measure(state.estimate.values(), next.values());

            state.estimate = next;
            state.iterations += 1;
            trace!(
                "newton iteration {}: epsilon={:e}, damped={}",
                state.iterations, epsilon, damped
            );

            if epsilon < self.config.tolerance {
                debug!(
                    "newton converged after {} iterations (epsilon={:e})",
                    state.iterations, epsilon
                );
                return Ok(state.finish(epsilon, residual, derivative, SolverStatus::Converged));
            }

            // A lone non-finite element keeps the metric at NaN and rides along
            // to the cap; only a fully non-finite estimate has nothing left to solve.
            if state.estimate.values().iter().all(|v| !v.is_finite()) {
                warn!(
                    "newton estimate became non-finite after {} iterations",
                    state.iterations
                );
                return Ok(state.finish(epsilon, residual, derivative, SolverStatus::Aborted));
            }

            if state.iterations >= self.config.max_iterations {
                warn!(
                    "newton did not converge after {} iterations (epsilon={:e})",
                    state.iterations, epsilon
                );
                return Ok(state.finish(epsilon, residual, derivative, SolverStatus::Aborted));
            }
        }
    }
}

fn validate_guess(guess: &[f64]) -> Result<()> {
    if guess.is_empty() {
        return Err(IVError::InvalidConfig {
            message: "initial guess has no elements".to_string(),
        });
    }

    match guess.iter().position(|v| *v == 0.0 || !v.is_finite()) {
        Some(index) => Err(IVError::InvalidGuess {
            index,
            value: guess[index],
        }),
        None => Ok(()),
    }
}

fn check_shape<E: Estimate>(estimate: &E, value: &E, context: &'static str) -> Result<()> {
    let (expected, actual) = (estimate.values().len(), value.values().len());
    if expected != actual {
        return Err(IVError::ShapeMismatch {
            context,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Writes the next estimate into `next` and returns how many elements were damped.
fn newton_step(current: &[f64], residual: &[f64], derivative: &[f64], next: &mut [f64]) -> usize {
    let mut damped = 0;

    for (((out, &r), &fv), &dv) in next.iter_mut().zip(current).zip(residual).zip(derivative) {
        *out = r - fv / dv;

        if dv <= 0.0 {
            // A zero slope leaves the raw step undefined; escape from the current estimate.
            let base = if dv == 0.0 { r } else { *out };
            *out = base + 0.5 * base;
            damped += 1;
        }

        // Volatility divides the pricing formulas; never land on exactly zero.
        if *out == 0.0 {
            *out = 0.5 * r;
        }
    }

    damped
}
