//! Operator overloads and elementary functions.
//!
//! Every operation evaluates its forward value immediately and returns a new
//! graph node. Operands may be any mix of [`Expr`], [`Variable`] and plain
//! scalars, by value or by reference. Scalars are promoted to constant nodes.

use crate::graph::{BinaryOp, Expr, UnaryOp};
use crate::variable::Variable;
use revdiff_core::Scalar;
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Anything that can stand as an operand of a graph operation.
pub trait AsExpr {
    /// Element type of the graph.
    type Elem: Scalar;

    /// Borrows the node handle behind this operand.
    fn as_expr(&self) -> &Expr<Self::Elem>;
}

impl<T: Scalar> AsExpr for Expr<T> {
    type Elem = T;

    fn as_expr(&self) -> &Expr<T> {
        self
    }
}

impl<T: Scalar> AsExpr for Variable<T> {
    type Elem = T;

    fn as_expr(&self) -> &Expr<T> {
        self.expr()
    }
}

impl<E: AsExpr> AsExpr for &E {
    type Elem = E::Elem;

    fn as_expr(&self) -> &Expr<E::Elem> {
        (**self).as_expr()
    }
}

macro_rules! binary_operator {
    ($Trait:ident, $method:ident, $op:ident) => {
        binary_operator!(@rhs $Trait, $method, $op, Expr<T>);
        binary_operator!(@rhs $Trait, $method, $op, &Expr<T>);
        binary_operator!(@rhs $Trait, $method, $op, Variable<T>);
        binary_operator!(@rhs $Trait, $method, $op, &Variable<T>);
        binary_operator!(@scalar_left $Trait, $method, $op, f32);
        binary_operator!(@scalar_left $Trait, $method, $op, f64);
    };
    (@rhs $Trait:ident, $method:ident, $op:ident, $lhs:ty) => {
        binary_operator!(@pair $Trait, $method, $op, $lhs, Expr<T>);
        binary_operator!(@pair $Trait, $method, $op, $lhs, &Expr<T>);
        binary_operator!(@pair $Trait, $method, $op, $lhs, Variable<T>);
        binary_operator!(@pair $Trait, $method, $op, $lhs, &Variable<T>);

        impl<T: Scalar> $Trait<T> for $lhs {
            type Output = Expr<T>;

            fn $method(self, rhs: T) -> Expr<T> {
                Expr::binary(BinaryOp::$op, self.as_expr(), &Expr::constant(rhs))
            }
        }
    };
    (@pair $Trait:ident, $method:ident, $op:ident, $lhs:ty, $rhs:ty) => {
        impl<T: Scalar> $Trait<$rhs> for $lhs {
            type Output = Expr<T>;

            fn $method(self, rhs: $rhs) -> Expr<T> {
                Expr::binary(BinaryOp::$op, self.as_expr(), rhs.as_expr())
            }
        }
    };
    (@scalar_left $Trait:ident, $method:ident, $op:ident, $t:ty) => {
        binary_operator!(@scalar_pair $Trait, $method, $op, $t, Expr<$t>);
        binary_operator!(@scalar_pair $Trait, $method, $op, $t, &Expr<$t>);
        binary_operator!(@scalar_pair $Trait, $method, $op, $t, Variable<$t>);
        binary_operator!(@scalar_pair $Trait, $method, $op, $t, &Variable<$t>);
    };
    (@scalar_pair $Trait:ident, $method:ident, $op:ident, $t:ty, $rhs:ty) => {
        impl $Trait<$rhs> for $t {
            type Output = Expr<$t>;

            fn $method(self, rhs: $rhs) -> Expr<$t> {
                Expr::binary(BinaryOp::$op, &Expr::constant(self), rhs.as_expr())
            }
        }
    };
}

binary_operator!(Add, add, Add);
binary_operator!(Sub, sub, Sub);
binary_operator!(Mul, mul, Mul);
binary_operator!(Div, div, Div);

macro_rules! negation {
    ($($operand:ty),*) => {
        $(
            impl<T: Scalar> Neg for $operand {
                type Output = Expr<T>;

                fn neg(self) -> Expr<T> {
                    Expr::unary(UnaryOp::Negative, self.as_expr())
                }
            }
        )*
    };
}

negation!(Expr<T>, &Expr<T>, Variable<T>, &Variable<T>);

// Comparisons look at forward values only.
macro_rules! comparison {
    ($($operand:ty),*) => {
        $(
            impl<T: Scalar> PartialEq for $operand {
                fn eq(&self, other: &Self) -> bool {
                    self.value() == other.value()
                }
            }

            impl<T: Scalar> PartialOrd for $operand {
                fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                    self.value().partial_cmp(other.value())
                }
            }

            impl<T: Scalar> PartialEq<T> for $operand {
                fn eq(&self, other: &T) -> bool {
                    self.value() == other
                }
            }

            impl<T: Scalar> PartialOrd<T> for $operand {
                fn partial_cmp(&self, other: &T) -> Option<Ordering> {
                    self.value().partial_cmp(other)
                }
            }
        )*
    };
}

comparison!(Expr<T>, Variable<T>);

impl<T: Scalar> num_traits::Pow<&Expr<T>> for &Expr<T> {
    type Output = Expr<T>;

    fn pow(self, exponent: &Expr<T>) -> Expr<T> {
        Expr::pow(self, exponent)
    }
}

impl<T: Scalar> num_traits::Pow<T> for &Expr<T> {
    type Output = Expr<T>;

    fn pow(self, exponent: T) -> Expr<T> {
        powf(self, exponent)
    }
}

macro_rules! unary_function {
    ($($(#[$meta:meta])* $name:ident => $op:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name<E: AsExpr>(x: &E) -> Expr<E::Elem> {
                Expr::unary(UnaryOp::$op, x.as_expr())
            }
        )*
    };
}

unary_function! {
    /// Sine.
    sin => Sin;
    /// Cosine.
    cos => Cos;
    /// Tangent.
    tan => Tan;
    /// Hyperbolic sine.
    sinh => Sinh;
    /// Hyperbolic cosine.
    cosh => Cosh;
    /// Hyperbolic tangent.
    tanh => Tanh;
    /// Inverse sine.
    asin => ArcSin;
    /// Inverse cosine.
    acos => ArcCos;
    /// Inverse tangent.
    atan => ArcTan;
    /// Natural exponential.
    exp => Exp;
    /// Natural logarithm.
    log => Log;
    /// Base-10 logarithm.
    log10 => Log10;
    /// Square root.
    sqrt => Sqrt;
    /// Absolute value. Its derivative at zero is taken as +1.
    abs => Abs;
    /// Gauss error function.
    erf => Erf;
    /// Logistic function `1 / (1 + exp(-x))`.
    sigmoid => Sigmoid;
    /// Rectifier `max(x, 0)`. Its derivative at zero is taken as 1.
    relu => Relu;
}

/// Power with both base and exponent differentiable.
///
/// The derivative with respect to the base is `y * r / l`, which is not
/// finite at a zero base; use [`powf`] when the exponent is constant.
pub fn pow<L, R>(base: &L, exponent: &R) -> Expr<L::Elem>
where
    L: AsExpr,
    R: AsExpr<Elem = L::Elem>,
{
    Expr::pow(base.as_expr(), exponent.as_expr())
}

/// Power with a constant exponent.
pub fn powf<E: AsExpr>(base: &E, exponent: E::Elem) -> Expr<E::Elem> {
    Expr::binary(
        BinaryOp::PowConstRight,
        base.as_expr(),
        &Expr::constant(exponent),
    )
}

/// Power with a constant base.
pub fn pow_base<E: AsExpr>(base: E::Elem, exponent: &E) -> Expr<E::Elem> {
    Expr::binary(
        BinaryOp::PowConstLeft,
        &Expr::constant(base),
        exponent.as_expr(),
    )
}

/// Squared magnitude `x * x`.
pub fn abs2<E: AsExpr>(x: &E) -> Expr<E::Elem> {
    let x = x.as_expr();
    x * x
}

/// Complex conjugate; the identity on real element types.
pub fn conj<E: AsExpr>(x: &E) -> Expr<E::Elem> {
    x.as_expr().clone()
}

/// Real part; the identity on real element types.
pub fn real<E: AsExpr>(x: &E) -> Expr<E::Elem> {
    x.as_expr().clone()
}

/// Imaginary part; always a zero constant on real element types.
pub fn imag<E: AsExpr>(_x: &E) -> Expr<E::Elem> {
    Expr::constant(<E::Elem as Scalar>::zero())
}

/// N-ary sum as a single node.
pub fn sum<E: AsExpr>(terms: &[E]) -> Expr<E::Elem> {
    Expr::sum(terms.iter().map(|t| t.as_expr().clone()).collect())
}

/// N-ary product as a single node.
pub fn product<E: AsExpr>(factors: &[E]) -> Expr<E::Elem> {
    Expr::product(factors.iter().map(|t| t.as_expr().clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ExprKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_operator_forms() {
        let x = Variable::new(3.0_f64);
        let y = Variable::new(2.0_f64);

        assert_eq!(*(&x + &y).value(), 5.0);
        assert_eq!(*(&x - 1.0).value(), 2.0);
        assert_eq!(*(2.0 * &x).value(), 6.0);
        assert_eq!(*(x.clone() / y.clone()).value(), 1.5);
        assert_eq!(*(-&x).value(), -3.0);

        let e = &x * &y;
        assert_eq!(*(&e + &e).value(), 12.0);
        assert_eq!(*(e.clone() * &x).value(), 18.0);
        assert_eq!(*(1.0_f32 - Variable::new(0.25_f32)).value(), 0.75);
    }

    #[test]
    fn test_scalar_operands_become_constants() {
        let x = Variable::new(3.0_f64);
        let e = &x + 1.0;
        let operands = e.operands();
        assert_eq!(operands[0].kind(), ExprKind::IndependentVariable);
        assert_eq!(operands[1].kind(), ExprKind::Constant);

        let e = 1.0 + &x;
        assert_eq!(e.operands()[0].kind(), ExprKind::Constant);
    }

    #[test]
    fn test_comparisons_use_values() {
        let x = Variable::new(3.0_f64);
        let a = &x * 1.0;
        let b = &x + 0.0;

        assert!(a == b);
        assert!(!a.ptr_eq(&b));
        assert!(a > 2.0);
        assert!(a <= 3.0);
        assert!(x == 3.0);
        assert!(Variable::new(1.0_f64) < x);
    }

    #[test]
    fn test_pow_variants() {
        let x = Variable::new(2.0_f64);
        let y = Variable::new(3.0_f64);

        assert_eq!(pow(&x, &y).kind(), ExprKind::Pow);
        assert_eq!(*pow(&x, &y).value(), 8.0);
        assert_eq!(powf(&x, 3.0).kind(), ExprKind::PowConstRight);
        assert_eq!(pow_base(3.0, &x).kind(), ExprKind::PowConstLeft);
        assert_eq!(*pow_base(3.0, &x).value(), 9.0);

        use num_traits::Pow;
        assert_eq!(x.expr().pow(2.0).kind(), ExprKind::PowConstRight);
        assert_eq!(x.expr().pow(y.expr()).kind(), ExprKind::Pow);
    }

    #[test]
    fn test_real_number_helpers() {
        let x = Variable::new(-1.5_f64);

        assert_eq!(*abs2(&x).value(), 2.25);
        assert!(conj(&x).ptr_eq(x.expr()));
        assert!(real(&x).ptr_eq(x.expr()));
        assert_eq!(*imag(&x).value(), 0.0);
        assert_eq!(imag(&x).kind(), ExprKind::Constant);
    }

    #[test]
    fn test_elementary_functions() {
        let x = Variable::new(0.3_f64);

        assert_relative_eq!(*sin(&x).value(), 0.3_f64.sin());
        assert_relative_eq!(*atan(&x).value(), 0.3_f64.atan());
        assert_relative_eq!(*log10(&x).value(), 0.3_f64.log10());
        assert_relative_eq!(*sigmoid(&x).value(), 1.0 / (1.0 + (-0.3_f64).exp()));
        assert_eq!(*relu(&-&x).value(), 0.0);
    }

    #[test]
    fn test_nary_functions() {
        let xs: Vec<_> = (1..=4).map(|i| Variable::new(i as f64)).collect();

        let s = sum(&xs);
        assert_eq!(s.kind(), ExprKind::Sum);
        assert_eq!(*s.value(), 10.0);
        assert_eq!(*product(&xs).value(), 24.0);
    }
}
