//! Numerical utilities for validating derivatives.

pub mod validation;

pub use validation::{central_difference, check_gradient, GradientCheckResult};
