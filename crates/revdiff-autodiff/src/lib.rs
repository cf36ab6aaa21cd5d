//! Reverse-mode automatic differentiation over a shared expression graph.
//!
//! Arithmetic on [`Variable`]s and [`Expr`]s builds a directed acyclic graph
//! whose nodes hold eagerly evaluated values. A derivative query walks the
//! graph backwards from an output, applying the chain rule at every node.
//!
//! # Features
//!
//! - **Generic element type**: anything implementing [`Scalar`], including
//!   `f32`, `f64` and [`Expr`] itself
//! - **Numeric and symbolic passes**: derivatives as values, or as new graph
//!   nodes that can be differentiated again
//! - **Chain flattening**: long sums and products collapse into n-ary nodes
//! - **Dense helpers**: gradients, Hessians and Jacobians as nalgebra types
//!
//! # Example
//!
//! ```
//! use revdiff_autodiff::prelude::*;
//!
//! let x = Variable::new(2.0_f64);
//! let y = Variable::new(3.0_f64);
//! let z = &x * &y + sin(&x);
//!
//! let [dzdx, dzdy] = derivatives(&z, &wrt([&x, &y]));
//! assert_eq!(dzdx, 3.0 + 2.0_f64.cos());
//! assert_eq!(dzdy, 2.0);
//! ```

pub mod backward;
pub mod dense;
pub mod graph;
pub mod nested;
pub mod ops;
pub mod rewrite;
pub mod variable;

// Re-export key types
pub use dense::{gradient, gradient_with, hessian, jacobian};
pub use graph::{Expr, ExprKind};
pub use ops::{
    abs, abs2, acos, asin, atan, conj, cos, cosh, erf, exp, imag, log, log10, pow, pow_base,
    powf, product, real, relu, sigmoid, sin, sinh, sqrt, sum, tan, tanh, AsExpr,
};
pub use revdiff_core::{AutodiffError, PropagationConfig, PropagationStrategy, Result, Scalar};
pub use variable::{
    derivatives, derivatives_dyn, derivatives_with, derivativesx, derivativesx_dyn,
    try_derivatives, wrt, Variable, Wrt,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::dense::{gradient, hessian, jacobian};
    pub use crate::graph::{Expr, ExprKind};
    pub use crate::ops::*;
    pub use crate::variable::{
        derivatives, derivatives_dyn, derivatives_with, derivativesx, try_derivatives, Variable,
        Wrt,
    };
    // Both the function and the macro.
    pub use crate::wrt;
    pub use revdiff_core::prelude::*;
}
