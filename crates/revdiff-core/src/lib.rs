//! Core traits and types for reverse-mode automatic differentiation.
//!
//! This crate holds everything the graph engine needs that is not the graph
//! itself: the capability contract an element type must satisfy, the error
//! types, the configuration of derivative queries and finite-difference
//! validation helpers.
//!
//! # Modules
//!
//! - [`core`]: the [`Scalar`] contract and [`AutodiffError`]
//! - [`config`]: propagation and validation configuration
//! - [`numerical`]: central-difference gradient checking

pub mod config;
pub mod core;
pub mod numerical;

// Re-export commonly used items at the crate root
pub use crate::config::{
    PropagationConfig, PropagationConfigBuilder, PropagationStrategy, ValidationConfig,
};
pub use crate::core::{constants, AutodiffError, Result, Scalar};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use revdiff_core::prelude::*;
///
/// let config = PropagationConfig::builder().skip_poisoned(true).build();
/// assert!(config.skip_poisoned);
/// assert!(<f64 as Scalar>::is_poisoned(&f64::NAN));
/// ```
pub mod prelude {
    pub use crate::config::{
        PropagationConfig, PropagationConfigBuilder, PropagationStrategy, ValidationConfig,
    };
    pub use crate::core::{AutodiffError, Result, Scalar};
    pub use crate::numerical::{central_difference, check_gradient, GradientCheckResult};
}
