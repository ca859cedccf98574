//! Newton-Raphson root finding for implied volatility.
//!
//! The solver only sees two closures, a residual `f` and its derivative
//! `f'`, plus an initial guess. It has no knowledge of how prices or vegas
//! are computed, so any drop-in derivative supplier works: the
//! finite-difference [`SensitivityEstimator`](crate::sensitivity::SensitivityEstimator),
//! the analytic Black-Scholes vega, or a caller's own closure.
//!
//! # Damping
//!
//! A non-positive derivative means the local slope cannot be trusted to
//! point at the root (for example a negative volatility guess, where vega
//! flips sign). For those elements the raw Newton result is scaled by 1.5
//! rather than used as is.
//!
//! # Convergence
//!
//! See [`ConvergenceMetric`]. Scalars default to the relative change of the
//! estimate, vectors to the infinity-norm of the absolute change.

mod config;
mod newton;

pub use config::{ConvergenceMetric, SolverConfig};
pub use newton::{Estimate, NewtonOutcome, NewtonSolver, SolverStatus, SolverTrace, TraceEntry};
