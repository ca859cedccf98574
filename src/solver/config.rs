//! Newton solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{IVError, Result};
use crate::sensitivity::DEFAULT_BUMP;

/// How the change between successive estimates is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceMetric {
    /// `max_i |R_next_i - R_i| / |R_i|`; for a scalar this is the plain
    /// relative change. Default for scalar solves.
    RelativeChange,
    /// `max_i |R_next_i - R_i|`, the infinity-norm of the absolute change.
    /// Default for vector solves.
    MaxAbsoluteChange,
}

impl ConvergenceMetric {
    /// Measures the step from `current` to `next`.
    ///
    /// NaN in any element makes the whole metric NaN, so a batch with a
    /// non-finite element can never report convergence.
    #[must_use]
    pub fn measure(self, current: &[f64], next: &[f64]) -> f64 {
        current
            .iter()
            .zip(next)
            .map(|(&r, &n)| match self {
                ConvergenceMetric::RelativeChange => (n - r).abs() / r.abs(),
                ConvergenceMetric::MaxAbsoluteChange => (n - r).abs(),
            })
            .fold(0.0, |acc, change| {
                if change.is_nan() || change > acc {
                    change
                } else {
                    acc
                }
            })
    }
}

/// Configuration for the Newton-Raphson solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iteration cap. Reaching it without convergence aborts the solve.
    pub max_iterations: u32,
    /// Convergence threshold on the metric.
    pub tolerance: f64,
    /// Record the `(residual, derivative)` pair of every iteration.
    pub trace: bool,
    /// Metric override. `None` picks by shape: relative change for scalars,
    /// infinity-norm for vectors.
    pub metric: Option<ConvergenceMetric>,
    /// Forward-difference step for the vega estimate.
    pub bump: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-3,
            trace: false,
            metric: None,
            bump: DEFAULT_BUMP,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enables or disables the diagnostic trace.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Forces a convergence metric regardless of shape.
    #[must_use]
    pub fn with_metric(mut self, metric: ConvergenceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Sets the forward-difference step.
    #[must_use]
    pub fn with_bump(mut self, bump: f64) -> Self {
        self.bump = bump;
        self
    }

    /// Parses a configuration from JSON and validates it.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    /// [`IVError::Serialization`] for malformed JSON, then any error from
    /// [`SolverConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    /// [`IVError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rejects settings that cannot drive a well-defined iteration.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(IVError::InvalidConfig {
                message: "max_iterations must be at least 1".to_string(),
            });
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(IVError::InvalidConfig {
                message: format!(
                    "tolerance must be positive and finite, got {}",
                    self.tolerance
                ),
            });
        }

        if !self.bump.is_finite() || self.bump <= 0.0 {
            return Err(IVError::InvalidConfig {
                message: format!("bump must be positive and finite, got {}", self.bump),
            });
        }

        Ok(())
    }
}
