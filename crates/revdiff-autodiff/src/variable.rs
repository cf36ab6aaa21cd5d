//! Variables and derivative queries.
//!
//! A [`Variable`] is a handle to a graph node that carries derivative
//! accumulators. Derivative queries seed the accumulators of the requested
//! variables, run one reverse pass from the output and read them back. The
//! variables not named in a query are never written to.

use crate::backward::{self, Listeners};
use crate::graph::{Expr, ExprKind, NodeKind};
use crate::ops::AsExpr;
use revdiff_core::{
    AutodiffError, PropagationConfig, PropagationStrategy, Result, Scalar,
};
use std::collections::HashSet;
use std::fmt::{self, Debug, Display};
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// A differentiable variable.
///
/// Created either from a value (an independent variable) or from an
/// expression (a dependent variable, which stays differentiable through the
/// expression it is bound to). Cloning aliases the same node.
pub struct Variable<T: Scalar> {
    expr: Expr<T>,
}

impl<T: Scalar> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
        }
    }
}

impl<T: Scalar> Variable<T> {
    /// Creates an independent variable.
    pub fn new(value: T) -> Self {
        Self {
            expr: Expr::independent(value),
        }
    }

    /// Creates a dependent variable bound to `expr`.
    pub fn bind(expr: Expr<T>) -> Self {
        Self {
            expr: Expr::dependent(expr),
        }
    }

    /// Forward value.
    pub fn value(&self) -> &T {
        self.expr.value()
    }

    /// Node handle of this variable.
    pub fn expr(&self) -> &Expr<T> {
        &self.expr
    }

    /// Whether this variable is bound to an expression.
    pub fn is_dependent(&self) -> bool {
        self.expr.kind() == ExprKind::DependentVariable
    }

    fn accumulators(&self) -> &crate::graph::Accumulator<T> {
        match &self.expr.node().kind {
            NodeKind::Independent(acc) | NodeKind::Dependent(acc, _) => acc,
            _ => unreachable!("variable handles always point at variable nodes"),
        }
    }

    /// Numeric derivative accumulated by the last propagation.
    pub fn grad(&self) -> T {
        self.accumulators().grad.borrow().clone()
    }

    /// Symbolic derivative accumulated by the last symbolic propagation.
    pub fn gradx(&self) -> Expr<T> {
        self.accumulators().gradx.borrow().clone()
    }

    /// Resets both accumulators to zero.
    pub fn seed(&self) {
        let acc = self.accumulators();
        acc.reset_grad();
        acc.reset_gradx();
    }

    /// Rebinds this handle to a fresh independent variable holding `value`.
    ///
    /// Expressions built from the previous node keep referring to it.
    pub fn update(&mut self, value: T) {
        self.expr = Expr::independent(value);
    }

    /// Rebinds this handle to a dependent variable bound to `expr`.
    pub fn assign<E: AsExpr<Elem = T>>(&mut self, expr: &E) {
        self.expr = Expr::dependent(expr.as_expr().clone());
    }

    /// Flattens associative chains in the expression this variable is bound
    /// to. Does nothing for independent variables.
    pub fn rewrite(&self) {
        // A variable node is never replaced itself; only its operand is.
        let _ = self.expr.rewrite();
    }
}

impl<T: Scalar> Default for Variable<T> {
    fn default() -> Self {
        Self::new(T::zero())
    }
}

macro_rules! variable_from_float {
    ($($float:ty),*) => {
        $(
            impl From<$float> for Variable<$float> {
                fn from(value: $float) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

variable_from_float!(f32, f64);

impl<T: Scalar> From<Expr<T>> for Variable<T> {
    fn from(expr: Expr<T>) -> Self {
        Self::bind(expr)
    }
}

impl<T: Scalar> From<&Expr<T>> for Variable<T> {
    fn from(expr: &Expr<T>) -> Self {
        Self::bind(expr.clone())
    }
}

impl<T: Scalar> From<Variable<T>> for Expr<T> {
    fn from(var: Variable<T>) -> Self {
        var.expr
    }
}

impl<T: Scalar> Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("kind", &self.expr.kind())
            .field("value", self.value())
            .field("grad", &self.grad())
            .finish()
    }
}

impl<T: Scalar> Display for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.value(), f)
    }
}

macro_rules! compound_assignment {
    ($Assign:ident, $Op:ident, $method:ident, $op:tt) => {
        impl<T: Scalar, R> $Assign<R> for Variable<T>
        where
            for<'a> &'a Variable<T>: std::ops::$Op<R, Output = Expr<T>>,
        {
            fn $method(&mut self, rhs: R) {
                let result = &*self $op rhs;
                self.expr = Expr::dependent(result);
            }
        }
    };
}

compound_assignment!(AddAssign, Add, add_assign, +);
compound_assignment!(SubAssign, Sub, sub_assign, -);
compound_assignment!(MulAssign, Mul, mul_assign, *);
compound_assignment!(DivAssign, Div, div_assign, /);

/// The ordered set of variables a derivative query is taken with respect to.
#[derive(Debug, Clone, Copy)]
pub struct Wrt<'a, T: Scalar, const N: usize> {
    vars: [&'a Variable<T>; N],
}

impl<'a, T: Scalar, const N: usize> Wrt<'a, T, N> {
    /// The variables, in query order.
    pub fn vars(&self) -> &[&'a Variable<T>; N] {
        &self.vars
    }
}

/// Groups variables for a derivative query.
pub fn wrt<T: Scalar, const N: usize>(vars: [&Variable<T>; N]) -> Wrt<'_, T, N> {
    Wrt { vars }
}

/// Shorthand for [`wrt`]: `wrt!(x, y)` is `wrt([&x, &y])`.
#[macro_export]
macro_rules! wrt {
    ($($var:expr),+ $(,)?) => {
        $crate::wrt([$(&$var),+])
    };
}

fn targets<T: Scalar>(vars: &[&Variable<T>]) -> HashSet<*const crate::graph::Node<T>> {
    vars.iter().map(|v| v.expr.as_ptr()).collect()
}

/// Seeds the numeric accumulators of `vars` and propagates from `y`.
///
/// Returns `false` when the poison guard skipped the pass.
fn run_numeric<T: Scalar>(y: &Expr<T>, vars: &[&Variable<T>], config: &PropagationConfig) -> bool {
    for v in vars {
        v.accumulators().reset_grad();
    }

    if config.skip_poisoned && y.value().is_poisoned() {
        log::debug!("output value {} is poisoned, skipping propagation", y.value());
        return false;
    }

    let root = if config.rewrite_before {
        y.rewrite().unwrap_or_else(|| y.clone())
    } else {
        y.clone()
    };

    let targets = targets(vars);
    let listeners = Listeners::Only(&targets);
    match config.strategy {
        PropagationStrategy::Recursive => backward::propagate(&root, T::one(), &listeners),
        PropagationStrategy::Topological => {
            backward::propagate_topological(&root, T::one(), &listeners)
        }
    }
    true
}

fn run_symbolic<T: Scalar>(y: &Expr<T>, vars: &[&Variable<T>]) {
    for v in vars {
        v.accumulators().reset_gradx();
    }
    let targets = targets(vars);
    backward::propagatex(y, &Expr::constant(T::one()), &Listeners::Only(&targets));
}

/// Numeric derivatives of `y` with respect to each variable in `wrt`.
///
/// Variables that `y` does not depend on get zero.
pub fn derivatives<E, const N: usize>(y: &E, wrt: &Wrt<'_, E::Elem, N>) -> [E::Elem; N]
where
    E: AsExpr,
{
    derivatives_with(y, wrt, &PropagationConfig::default())
}

/// Like [`derivatives`], with explicit propagation settings.
///
/// When the poison guard trips, every derivative is zero.
pub fn derivatives_with<E, const N: usize>(
    y: &E,
    wrt: &Wrt<'_, E::Elem, N>,
    config: &PropagationConfig,
) -> [E::Elem; N]
where
    E: AsExpr,
{
    run_numeric(y.as_expr(), &wrt.vars, config);
    std::array::from_fn(|i| wrt.vars[i].grad())
}

/// Like [`derivatives_with`], but reports a poisoned output as an error
/// instead of returning zeros.
pub fn try_derivatives<E, const N: usize>(
    y: &E,
    wrt: &Wrt<'_, E::Elem, N>,
    config: &PropagationConfig,
) -> Result<[E::Elem; N]>
where
    E: AsExpr,
{
    if run_numeric(y.as_expr(), &wrt.vars, config) {
        Ok(std::array::from_fn(|i| wrt.vars[i].grad()))
    } else {
        Err(AutodiffError::poisoned_output(y.as_expr().value()))
    }
}

/// Symbolic derivatives of `y` with respect to each variable in `wrt`.
///
/// Each result is a dependent variable bound to the derivative expression,
/// so it can be differentiated again.
pub fn derivativesx<E, const N: usize>(y: &E, wrt: &Wrt<'_, E::Elem, N>) -> [Variable<E::Elem>; N]
where
    E: AsExpr,
{
    run_symbolic(y.as_expr(), &wrt.vars);
    std::array::from_fn(|i| Variable::bind(wrt.vars[i].gradx()))
}

/// Numeric derivatives for a variable set whose size is only known at run time.
pub fn derivatives_dyn<E: AsExpr>(
    y: &E,
    vars: &[&Variable<E::Elem>],
    config: &PropagationConfig,
) -> Vec<E::Elem> {
    run_numeric(y.as_expr(), vars, config);
    vars.iter().map(|v| v.grad()).collect()
}

/// Symbolic derivatives for a variable set whose size is only known at run time.
pub fn derivativesx_dyn<E: AsExpr>(y: &E, vars: &[&Variable<E::Elem>]) -> Vec<Variable<E::Elem>> {
    run_symbolic(y.as_expr(), vars);
    vars.iter().map(|v| Variable::bind(v.gradx())).collect()
}
