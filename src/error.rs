//! Error types for option pricing and implied volatility calculation.
//!
//! Non-convergence is not an error: the Newton solver reports it
//! through [`SolverStatus::Aborted`](crate::solver::SolverStatus) on the
//! returned outcome. The variants here cover inputs that make the iteration
//! ill-defined before it starts.

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, IVError>;

/// Errors specific to pricing and IV calculation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IVError {
    /// Two element-aligned inputs disagree on their length.
    #[error("shape mismatch in {context}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Where the mismatch was detected.
        context: &'static str,
        /// Length the batch was built with.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Solver configuration cannot drive a well-defined iteration.
    #[error("invalid solver configuration: {message}")]
    InvalidConfig {
        /// Description of the offending setting.
        message: String,
    },

    /// An initial guess element is zero or non-finite.
    #[error("invalid initial guess at index {index}: {value}")]
    InvalidGuess {
        /// Element index within the guess vector (0 for scalars).
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Underlying serde error message.
        message: String,
    },
}

impl From<serde_json::Error> for IVError {
    fn from(error: serde_json::Error) -> Self {
        IVError::Serialization {
            message: error.to_string(),
        }
    }
}
