//! Expressions as element types.
//!
//! `Expr<T>` satisfies [`Scalar`] itself, so a graph can be built over
//! expression-valued nodes: `Variable<Expr<f64>>`. Every arithmetic step of
//! such an outer graph records inner nodes, and the numeric derivatives it
//! returns are inner expressions that can be differentiated again. This is an
//! alternative to [`derivativesx`](crate::derivativesx) for higher orders.

use crate::graph::Expr;
use crate::ops;
use revdiff_core::Scalar;

impl<T: Scalar> Scalar for Expr<T> {
    fn zero() -> Self {
        Expr::constant(T::zero())
    }

    fn one() -> Self {
        Expr::constant(T::one())
    }

    fn from_f64(v: f64) -> Self {
        Expr::constant(T::from_f64(v))
    }

    fn ln(&self) -> Self {
        ops::log(self)
    }

    fn log10(&self) -> Self {
        ops::log10(self)
    }

    fn exp(&self) -> Self {
        ops::exp(self)
    }

    fn sin(&self) -> Self {
        ops::sin(self)
    }

    fn cos(&self) -> Self {
        ops::cos(self)
    }

    fn tan(&self) -> Self {
        ops::tan(self)
    }

    fn asin(&self) -> Self {
        ops::asin(self)
    }

    fn acos(&self) -> Self {
        ops::acos(self)
    }

    fn atan(&self) -> Self {
        ops::atan(self)
    }

    fn sinh(&self) -> Self {
        ops::sinh(self)
    }

    fn cosh(&self) -> Self {
        ops::cosh(self)
    }

    fn tanh(&self) -> Self {
        ops::tanh(self)
    }

    fn sqrt(&self) -> Self {
        ops::sqrt(self)
    }

    fn abs(&self) -> Self {
        ops::abs(self)
    }

    fn erf(&self) -> Self {
        ops::erf(self)
    }

    fn powf(&self, exponent: &Self) -> Self {
        if exponent.is_constant() {
            ops::powf(self, exponent.value().clone())
        } else {
            ops::pow(self, exponent)
        }
    }

    fn copysign(&self, sign: &Self) -> Self {
        // |x| times the constant sign of `sign`; the sign is locally flat.
        ops::abs(self) * T::one().copysign(sign.value())
    }

    fn is_poisoned(&self) -> bool {
        self.value().is_poisoned()
    }

    fn to_f64(&self) -> Option<f64> {
        self.value().to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ExprKind;
    use crate::ops::{cos, sin};
    use crate::variable::{derivatives, wrt, Variable};
    use approx::assert_relative_eq;

    #[test]
    fn test_literals_are_constants() {
        let one = <Expr<f64> as Scalar>::one();
        assert_eq!(one.kind(), ExprKind::Constant);
        assert_eq!(*one.value(), 1.0);
        assert_eq!(*<Expr<f64> as Scalar>::from_f64(2.5).value(), 2.5);
    }

    #[test]
    fn test_powf_picks_constant_exponent() {
        let x = Variable::new(2.0_f64);
        let c = Expr::constant(3.0);
        assert_eq!(x.expr().powf(&c).kind(), ExprKind::PowConstRight);
        assert_eq!(x.expr().powf(x.expr()).kind(), ExprKind::Pow);
    }

    #[test]
    fn test_poison_follows_value() {
        let x = Variable::new(-1.0_f64);
        assert!(Scalar::is_poisoned(&x.expr().sqrt()));
        assert_eq!(Scalar::to_f64(x.expr()), Some(-1.0));
    }

    #[test]
    fn test_nested_second_derivative() {
        let inner = Variable::new(0.5_f64);
        let outer = Variable::new(inner.expr().clone());

        let y = sin(&outer) * cos(&outer);
        let [dy] = derivatives(&y, &wrt([&outer]));
        assert_relative_eq!(*dy.value(), 1.0_f64.cos(), epsilon = 1e-12);

        let [d2y] = derivatives(&dy, &wrt([&inner]));
        assert_relative_eq!(d2y, -2.0 * 1.0_f64.sin(), epsilon = 1e-12);
    }
}
