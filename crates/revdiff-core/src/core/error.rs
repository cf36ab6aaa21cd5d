//! Error types for the differentiation engine.
//!
//! Building expressions and propagating derivatives never fails: out of
//! domain arithmetic is left to the element type. Errors only arise at the
//! edges of the engine, in configuration, dense adapters, validation and the
//! checked derivative entry points.

use thiserror::Error;

/// Errors reported by the checked parts of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutodiffError {
    /// A configuration value is out of its valid range.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the invalid value
        reason: String,
    },

    /// Inputs of inconsistent lengths were supplied.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A function probed during validation produced a degenerate value.
    #[error("Non-finite evaluation: {reason}")]
    NonFiniteEvaluation {
        /// Description of the probe that failed
        reason: String,
    },

    /// The forward value of the output is degenerate, so no derivative was
    /// propagated.
    #[error("Output value {value} is poisoned, propagation skipped")]
    PoisonedOutput {
        /// Rendered forward value of the output
        value: String,
    },
}

impl AutodiffError {
    /// Create an InvalidParameter error with a custom reason.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NonFiniteEvaluation error with a custom reason.
    pub fn non_finite<S: Into<String>>(reason: S) -> Self {
        Self::NonFiniteEvaluation {
            reason: reason.into(),
        }
    }

    /// Create a PoisonedOutput error from the offending value.
    pub fn poisoned_output<V: std::fmt::Display>(value: V) -> Self {
        Self::PoisonedOutput {
            value: value.to_string(),
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, AutodiffError>;
