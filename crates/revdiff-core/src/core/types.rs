//! Element types accepted by the differentiation engine.
//!
//! The engine never inspects the numeric representation of the values it
//! carries. Everything it needs from an element type is collected in the
//! [`Scalar`] trait: ring arithmetic, ordering, the transcendental functions
//! used by the derivative rules, literal construction and an optional
//! introspection hook telling whether a value is degenerate.

use num_traits::Float;
use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Capability contract for the element type of a computation graph.
///
/// Transcendental functions take `&self` so that non-`Copy` element types
/// (including the engine's own expression handle, used for nested higher
/// order differentiation) can implement the trait without cloning.
pub trait Scalar:
    Clone
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Builds a value from a floating point literal.
    fn from_f64(v: f64) -> Self;

    /// Builds a value from an integer literal.
    fn from_i32(v: i32) -> Self {
        Self::from_f64(f64::from(v))
    }

    /// Natural logarithm.
    fn ln(&self) -> Self;

    /// Base 10 logarithm.
    fn log10(&self) -> Self;

    /// Exponential function.
    fn exp(&self) -> Self;

    /// Sine.
    fn sin(&self) -> Self;

    /// Cosine.
    fn cos(&self) -> Self;

    /// Tangent.
    fn tan(&self) -> Self;

    /// Inverse sine.
    fn asin(&self) -> Self;

    /// Inverse cosine.
    fn acos(&self) -> Self;

    /// Inverse tangent.
    fn atan(&self) -> Self;

    /// Hyperbolic sine.
    fn sinh(&self) -> Self;

    /// Hyperbolic cosine.
    fn cosh(&self) -> Self;

    /// Hyperbolic tangent.
    fn tanh(&self) -> Self;

    /// Square root.
    fn sqrt(&self) -> Self;

    /// Absolute value.
    fn abs(&self) -> Self;

    /// Gauss error function.
    fn erf(&self) -> Self;

    /// Raises `self` to the power `exponent`.
    fn powf(&self, exponent: &Self) -> Self;

    /// Magnitude of `self` with the sign of `sign`.
    fn copysign(&self, sign: &Self) -> Self;

    /// Whether the value is degenerate (NaN or infinite for IEEE types,
    /// saturated for fixed-point formats).
    ///
    /// Used by the poison guard to skip propagation from a blown-up output.
    fn is_poisoned(&self) -> bool {
        false
    }

    /// Lossy conversion for logging and diagnostics.
    fn to_f64(&self) -> Option<f64> {
        None
    }
}

macro_rules! impl_scalar_for_float {
    ($t:ty, $erf:path) => {
        impl Scalar for $t {
            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn ln(&self) -> Self {
                Float::ln(*self)
            }

            #[inline]
            fn log10(&self) -> Self {
                Float::log10(*self)
            }

            #[inline]
            fn exp(&self) -> Self {
                Float::exp(*self)
            }

            #[inline]
            fn sin(&self) -> Self {
                Float::sin(*self)
            }

            #[inline]
            fn cos(&self) -> Self {
                Float::cos(*self)
            }

            #[inline]
            fn tan(&self) -> Self {
                Float::tan(*self)
            }

            #[inline]
            fn asin(&self) -> Self {
                Float::asin(*self)
            }

            #[inline]
            fn acos(&self) -> Self {
                Float::acos(*self)
            }

            #[inline]
            fn atan(&self) -> Self {
                Float::atan(*self)
            }

            #[inline]
            fn sinh(&self) -> Self {
                Float::sinh(*self)
            }

            #[inline]
            fn cosh(&self) -> Self {
                Float::cosh(*self)
            }

            #[inline]
            fn tanh(&self) -> Self {
                Float::tanh(*self)
            }

            #[inline]
            fn sqrt(&self) -> Self {
                Float::sqrt(*self)
            }

            #[inline]
            fn abs(&self) -> Self {
                Float::abs(*self)
            }

            #[inline]
            fn erf(&self) -> Self {
                $erf(*self)
            }

            #[inline]
            fn powf(&self, exponent: &Self) -> Self {
                Float::powf(*self, *exponent)
            }

            #[inline]
            fn copysign(&self, sign: &Self) -> Self {
                Float::copysign(*self, *sign)
            }

            #[inline]
            fn is_poisoned(&self) -> bool {
                !Float::is_finite(*self)
            }

            #[inline]
            fn to_f64(&self) -> Option<f64> {
                Some(f64::from(*self))
            }
        }
    };
}

impl_scalar_for_float!(f32, libm::erff);
impl_scalar_for_float!(f64, libm::erf);

/// Numerical constants shared by the derivative rules.
pub mod constants {
    use super::Scalar;

    /// `ln(10)`, the scale factor in the derivative of `log10`.
    pub fn ln_10<T: Scalar>() -> T {
        T::from_f64(std::f64::consts::LN_10)
    }

    /// `2 / sqrt(pi)`, the scale factor in the derivative of `erf`.
    pub fn frac_2_sqrt_pi<T: Scalar>() -> T {
        T::from_f64(std::f64::consts::FRAC_2_SQRT_PI)
    }

    /// The literal `2`.
    pub fn two<T: Scalar>() -> T {
        T::from_f64(2.0)
    }
}
