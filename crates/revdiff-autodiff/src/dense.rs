//! Dense gradient, Hessian and Jacobian assembly on top of nalgebra.
//!
//! These helpers run one derivative query per output (or per Hessian row)
//! and collect the results into `DVector`/`DMatrix` values.

use crate::ops::AsExpr;
use crate::variable::{derivatives_dyn, derivativesx_dyn, Variable};
use nalgebra::{DMatrix, DVector};
use revdiff_core::{PropagationConfig, Scalar};

fn handles<T: Scalar>(xs: &[Variable<T>]) -> Vec<&Variable<T>> {
    xs.iter().collect()
}

/// Gradient of `y` with respect to `xs`.
pub fn gradient<E>(y: &E, xs: &[Variable<E::Elem>]) -> DVector<E::Elem>
where
    E: AsExpr,
{
    gradient_with(y, xs, &PropagationConfig::default())
}

/// Gradient of `y` with respect to `xs`, with explicit propagation settings.
pub fn gradient_with<E>(
    y: &E,
    xs: &[Variable<E::Elem>],
    config: &PropagationConfig,
) -> DVector<E::Elem>
where
    E: AsExpr,
{
    DVector::from_vec(derivatives_dyn(y, &handles(xs), config))
}

/// Hessian of `y` with respect to `xs`.
///
/// The first derivatives are built symbolically in one pass; each of them is
/// then differentiated numerically. Only the upper triangle is computed and
/// mirrored, so the result is exactly symmetric.
pub fn hessian<E>(y: &E, xs: &[Variable<E::Elem>]) -> DMatrix<E::Elem>
where
    E: AsExpr,
{
    let n = xs.len();
    let vars = handles(xs);
    let first = derivativesx_dyn(y, &vars);
    let config = PropagationConfig::default();

    let mut mat = DMatrix::from_element(n, n, <E::Elem as Scalar>::zero());
    for (i, dydxi) in first.iter().enumerate() {
        let row = derivatives_dyn(dydxi, &vars[i..], &config);
        for (k, value) in row.into_iter().enumerate() {
            let j = i + k;
            mat[(j, i)] = value.clone();
            mat[(i, j)] = value;
        }
    }
    mat
}

/// Jacobian of `ys` with respect to `xs`: row `i` is the gradient of `ys[i]`.
pub fn jacobian<E>(ys: &[E], xs: &[Variable<E::Elem>]) -> DMatrix<E::Elem>
where
    E: AsExpr,
{
    let vars = handles(xs);
    let config = PropagationConfig::default();

    let mut mat = DMatrix::from_element(ys.len(), xs.len(), <E::Elem as Scalar>::zero());
    for (i, y) in ys.iter().enumerate() {
        for (j, value) in derivatives_dyn(y, &vars, &config).into_iter().enumerate() {
            mat[(i, j)] = value;
        }
    }
    mat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Expr;
    use crate::ops::{exp, sin};
    use approx::assert_relative_eq;

    fn variables(values: &[f64]) -> Vec<Variable<f64>> {
        values.iter().copied().map(Variable::new).collect()
    }

    #[test]
    fn test_gradient_of_quadratic_form() {
        let xs = variables(&[1.0, 2.0, 3.0]);
        let y: Expr<f64> = crate::ops::sum(&xs.iter().map(|x| x * x).collect::<Vec<_>>());

        let g = gradient(&y, &xs);
        assert_eq!(g, DVector::from_vec(vec![2.0, 4.0, 6.0]));
    }

    #[test]
    fn test_hessian_is_symmetric() {
        let xs = variables(&[0.3, -0.7]);
        let y = sin(&(&xs[0] * &xs[1])) + exp(&xs[0]);

        let h = hessian(&y, &xs);
        let (a, b) = (0.3_f64, -0.7_f64);
        let p = a * b;
        assert_relative_eq!(h[(0, 0)], -b * b * p.sin() + a.exp(), epsilon = 1e-12);
        assert_relative_eq!(h[(1, 1)], -a * a * p.sin(), epsilon = 1e-12);
        assert_relative_eq!(h[(0, 1)], p.cos() - p * p.sin(), epsilon = 1e-12);
        assert_eq!(h[(0, 1)], h[(1, 0)]);
    }

    #[test]
    fn test_jacobian_rows_are_gradients() {
        let xs = variables(&[2.0, 5.0]);
        let ys = vec![&xs[0] * &xs[1], &xs[0] - &xs[1], Expr::constant(1.0)];

        let j = jacobian(&ys, &xs);
        assert_eq!(j.shape(), (3, 2));
        assert_eq!(j.row(0).iter().copied().collect::<Vec<_>>(), vec![5.0, 2.0]);
        assert_eq!(j.row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, -1.0]);
        assert_eq!(j.row(2).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0]);
    }
}
