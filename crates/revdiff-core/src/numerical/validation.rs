//! Finite-difference validation of computed derivatives.
//!
//! These helpers are independent of the graph engine: they only evaluate a
//! plain function at perturbed points and compare the central-difference
//! estimate against an analytical gradient.

use crate::{
    config::ValidationConfig,
    core::{
        error::{AutodiffError, Result},
        types::{constants, Scalar},
    },
};

/// Results from gradient checking.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheckResult<T> {
    /// Maximum relative error between analytical and numerical gradients
    pub max_relative_error: T,
    /// Average relative error
    pub avg_relative_error: T,
    /// Whether the check passed
    pub passed: bool,
    /// Central-difference estimates, one per component
    pub numerical: Vec<T>,
    /// Individual errors for each component
    pub component_errors: Vec<T>,
}

fn larger<T: Scalar>(a: T, b: T) -> T {
    if a > b {
        a
    } else {
        b
    }
}

/// Central-difference estimate of `∂f/∂x_index` at `point`.
///
/// Computes `(f(x + h e_i) - f(x - h e_i)) / 2h`.
///
/// # Panics
///
/// Panics if `index` is out of bounds for `point`. [`check_gradient`] only
/// calls it with valid indices.
pub fn central_difference<T, F>(f: F, point: &[T], index: usize, step: &T) -> T
where
    T: Scalar,
    F: Fn(&[T]) -> T,
{
    let mut probe = point.to_vec();

    probe[index] = point[index].clone() + step.clone();
    let f_plus = f(&probe);

    probe[index] = point[index].clone() - step.clone();
    let f_minus = f(&probe);

    (f_plus - f_minus) / (constants::two::<T>() * step.clone())
}

/// Checks an analytical gradient against central differences.
///
/// The relative error of a component is `|a - n| / max(|a|, |n|, 1)`.
pub fn check_gradient<T, F>(
    f: F,
    point: &[T],
    analytic: &[T],
    config: &ValidationConfig,
) -> Result<GradientCheckResult<T>>
where
    T: Scalar,
    F: Fn(&[T]) -> T,
{
    config.validate()?;
    if analytic.len() != point.len() {
        return Err(AutodiffError::dimension_mismatch(point.len(), analytic.len()));
    }

    let step = T::from_f64(config.step);
    let mut numerical = Vec::with_capacity(point.len());
    let mut component_errors = Vec::with_capacity(point.len());
    let mut sum_error = T::zero();

    for (i, a) in analytic.iter().enumerate() {
        let n = central_difference(&f, point, i, &step);
        if n.is_poisoned() {
            return Err(AutodiffError::non_finite(format!(
                "central difference along component {i} evaluated to {n}"
            )));
        }

        let scale = larger(larger(a.abs(), n.abs()), T::one());
        let error = (a.clone() - n.clone()).abs() / scale;
        if error.is_poisoned() {
            return Err(AutodiffError::non_finite(format!(
                "analytical component {i} is {a}"
            )));
        }

        sum_error = sum_error + error.clone();
        numerical.push(n);
        component_errors.push(error);
    }

    let max_relative_error = component_errors
        .iter()
        .cloned()
        .fold(T::zero(), larger);
    let avg_relative_error = if component_errors.is_empty() {
        T::zero()
    } else {
        sum_error / T::from_f64(component_errors.len() as f64)
    };
    let passed = max_relative_error <= T::from_f64(config.tolerance);

    if !passed {
        log::debug!(
            "gradient check failed: max relative error {max_relative_error} above tolerance {}",
            config.tolerance
        );
    }

    Ok(GradientCheckResult {
        max_relative_error,
        avg_relative_error,
        passed,
        numerical,
        component_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rosenbrock(x: &[f64]) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    }

    fn rosenbrock_grad(x: &[f64]) -> Vec<f64> {
        vec![
            -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
            200.0 * (x[1] - x[0] * x[0]),
        ]
    }

    #[test]
    fn test_central_difference_quadratic() {
        let d = central_difference(|x: &[f64]| x[0] * x[0], &[3.0], 0, &1e-4);
        assert_relative_eq!(d, 6.0, epsilon = 1e-8);
    }

    #[test]
    #[should_panic]
    fn test_central_difference_index_out_of_bounds() {
        central_difference(|x: &[f64]| x[0], &[1.0, 2.0], 2, &1e-4);
    }

    #[test]
    fn test_check_gradient_passes() {
        let point = [-1.2, 1.0];
        let config = ValidationConfig::new(1e-6, 1e-5);
        let result = check_gradient(rosenbrock, &point, &rosenbrock_grad(&point), &config).unwrap();

        assert!(result.passed);
        assert_eq!(result.numerical.len(), 2);
        assert!(result.max_relative_error < 1e-5);
    }

    #[test]
    fn test_check_gradient_detects_wrong_gradient() {
        let point = [0.5, 0.5];
        let mut wrong = rosenbrock_grad(&point);
        wrong[1] += 1.0;

        let result =
            check_gradient(rosenbrock, &point, &wrong, &ValidationConfig::default()).unwrap();
        assert!(!result.passed);
        assert!(result.component_errors[1] > result.component_errors[0]);
    }

    #[test]
    fn test_check_gradient_dimension_mismatch() {
        let err = check_gradient(rosenbrock, &[0.0, 0.0], &[0.0], &ValidationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AutodiffError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_check_gradient_non_finite() {
        let err = check_gradient(
            |x: &[f64]| x[0].ln(),
            &[0.0],
            &[0.0],
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AutodiffError::NonFiniteEvaluation { .. }));
    }
}
