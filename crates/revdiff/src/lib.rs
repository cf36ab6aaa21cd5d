//! # revdiff
//!
//! Reverse-mode automatic differentiation over a dynamically built expression
//! graph, generic over the element type.
//!
//! This crate re-exports the public API of the workspace crates:
//!
//! - [`revdiff_core`]: the [`Scalar`] contract, errors, configuration and
//!   finite-difference validation
//! - [`revdiff_autodiff`]: the expression graph, derivative queries, the
//!   rewrite pass and the dense nalgebra helpers
//!
//! ## Quick Start
//!
//! ```
//! use revdiff::prelude::*;
//!
//! let x = Variable::new(2.0_f64);
//! let u = 1.0 + &x + &x * &x + 1.0 / &x + log(&x);
//!
//! let [ux] = derivatives(&u, &wrt([&x]));
//! assert!((ux - 5.25).abs() < 1e-12);
//! ```
//!
//! ## Higher order
//!
//! Symbolic derivatives are graph nodes themselves:
//!
//! ```
//! use revdiff::prelude::*;
//!
//! let x = Variable::new(0.5_f64);
//! let y = sin(&x) * cos(&x);
//!
//! let [yx] = derivativesx(&y, &wrt([&x]));
//! let [yxx] = derivatives(&yx, &wrt([&x]));
//! assert!((yxx + 2.0 * 1.0_f64.sin()).abs() < 1e-12);
//! ```

pub use revdiff_autodiff;
pub use revdiff_core;

pub use revdiff_autodiff::{
    derivatives, derivatives_dyn, derivatives_with, derivativesx, derivativesx_dyn, gradient,
    gradient_with, hessian, jacobian, try_derivatives, wrt, AsExpr, Expr, ExprKind, Variable,
    Wrt,
};
pub use revdiff_core::{
    AutodiffError, PropagationConfig, PropagationConfigBuilder, PropagationStrategy, Result,
    Scalar, ValidationConfig,
};

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use revdiff_autodiff::prelude::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_facade_reexports() {
        let x = Variable::new(3.0_f64);
        let y = revdiff_autodiff::sqrt(&x);
        let g = gradient(&y, std::slice::from_ref(&x));
        assert_relative_eq!(g[0], 0.5 / 3.0_f64.sqrt(), epsilon = 1e-15);
    }
}
