//! A non-IEEE element type: saturating arithmetic with an explicit poison flag.

use revdiff_autodiff::prelude::*;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

const LIMIT: f64 = 1.0e4;

/// Value clamped to `[-LIMIT, LIMIT]`; reaching either bound poisons it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
struct Saturating(f64);

impl Saturating {
    fn new(v: f64) -> Self {
        if v.is_nan() {
            Self(LIMIT)
        } else {
            Self(v.clamp(-LIMIT, LIMIT))
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.0))
    }
}

impl fmt::Display for Saturating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

macro_rules! saturating_op {
    ($Trait:ident, $method:ident, $op:tt) => {
        impl $Trait for Saturating {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self::new(self.0 $op rhs.0)
            }
        }
    };
}

saturating_op!(Add, add, +);
saturating_op!(Sub, sub, -);
saturating_op!(Mul, mul, *);
saturating_op!(Div, div, /);

impl Neg for Saturating {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Scalar for Saturating {
    fn zero() -> Self {
        Self(0.0)
    }

    fn one() -> Self {
        Self(1.0)
    }

    fn from_f64(v: f64) -> Self {
        Self::new(v)
    }

    fn ln(&self) -> Self {
        self.map(f64::ln)
    }

    fn log10(&self) -> Self {
        self.map(f64::log10)
    }

    fn exp(&self) -> Self {
        self.map(f64::exp)
    }

    fn sin(&self) -> Self {
        self.map(f64::sin)
    }

    fn cos(&self) -> Self {
        self.map(f64::cos)
    }

    fn tan(&self) -> Self {
        self.map(f64::tan)
    }

    fn asin(&self) -> Self {
        self.map(f64::asin)
    }

    fn acos(&self) -> Self {
        self.map(f64::acos)
    }

    fn atan(&self) -> Self {
        self.map(f64::atan)
    }

    fn sinh(&self) -> Self {
        self.map(f64::sinh)
    }

    fn cosh(&self) -> Self {
        self.map(f64::cosh)
    }

    fn tanh(&self) -> Self {
        self.map(f64::tanh)
    }

    fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }

    fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    fn erf(&self) -> Self {
        self.map(libm::erf)
    }

    fn powf(&self, exponent: &Self) -> Self {
        Self::new(self.0.powf(exponent.0))
    }

    fn copysign(&self, sign: &Self) -> Self {
        Self(self.0.copysign(sign.0))
    }

    fn is_poisoned(&self) -> bool {
        self.0.abs() >= LIMIT
    }

    fn to_f64(&self) -> Option<f64> {
        Some(self.0)
    }
}

fn s(v: f64) -> Saturating {
    Saturating::new(v)
}

#[test]
fn test_saturating_graph_differentiates() {
    let x = Variable::new(s(2.0));
    let y = &x * &x + sin(&x);

    let [dx] = derivatives(&y, &wrt([&x]));
    assert!((dx.0 - (4.0 + 2.0_f64.cos())).abs() < 1e-12);
}

#[test]
fn test_guard_skips_saturated_output() {
    let x = Variable::new(s(20.0));
    let loss = exp(&x) * &x;
    assert!(loss.value().is_poisoned());

    let guarded = PropagationConfig::builder().skip_poisoned(true).build();
    let [dx] = derivatives_with(&loss, &wrt([&x]), &guarded);
    assert_eq!(dx, Saturating::zero());
    assert_eq!(x.grad(), Saturating::zero());

    let err = try_derivatives(&loss, &wrt([&x]), &guarded).unwrap_err();
    assert_eq!(
        err,
        AutodiffError::PoisonedOutput {
            value: "10000s".to_string()
        }
    );
}

#[test]
fn test_training_preset_on_healthy_output() {
    let xs: Vec<_> = [0.5, 1.0, 1.5].into_iter().map(|v| Variable::new(s(v))).collect();
    let loss = xs[1..]
        .iter()
        .fold(xs[0].expr().clone(), |acc, x| acc + &(x * x));

    let [d0, d1, d2] = try_derivatives(
        &loss,
        &wrt([&xs[0], &xs[1], &xs[2]]),
        &PropagationConfig::training(),
    )
    .unwrap();

    assert_eq!(d0, s(1.0));
    assert_eq!(d1, s(2.0));
    assert_eq!(d2, s(3.0));
}
