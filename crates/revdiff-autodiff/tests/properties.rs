//! Property tests: reverse-mode derivatives against central differences.

use proptest::prelude::*;
use revdiff_autodiff::prelude::*;

fn model<E: AsExpr<Elem = f64>>(x: &E, y: &E) -> Expr<f64> {
    sin(&(x.as_expr() * y.as_expr())) + exp(y) / x.as_expr() + sqrt(x) * tanh(y)
        + pow(x, y)
        + sigmoid(&(x.as_expr() - y.as_expr()))
        + atan(&abs2(y))
}

fn eval(p: &[f64]) -> f64 {
    let x = Variable::new(p[0]);
    let y = Variable::new(p[1]);
    *model(&x, &y).value()
}

proptest! {
    #[test]
    fn prop_gradient_matches_central_difference(a in 0.2f64..2.0, b in -1.0f64..1.0) {
        let x = Variable::new(a);
        let y = Variable::new(b);
        let f = model(&x, &y);
        let [fx, fy] = derivatives(&f, &wrt([&x, &y]));

        let config = ValidationConfig::new(1e-6, 1e-5);
        let result = check_gradient(eval, &[a, b], &[fx, fy], &config).unwrap();
        prop_assert!(result.passed, "max relative error {}", result.max_relative_error);
    }

    #[test]
    fn prop_symbolic_matches_numeric(a in 0.2f64..2.0, b in -1.0f64..1.0) {
        let x = Variable::new(a);
        let y = Variable::new(b);
        let f = model(&x, &y);

        let [fx, fy] = derivatives(&f, &wrt([&x, &y]));
        let [gx, gy] = derivativesx(&f, &wrt([&x, &y]));

        let tol = 1e-10;
        prop_assert!((fx - gx.value()).abs() <= tol * fx.abs().max(1.0));
        prop_assert!((fy - gy.value()).abs() <= tol * fy.abs().max(1.0));
    }

    #[test]
    fn prop_topological_matches_recursive(a in 0.2f64..2.0, b in -1.0f64..1.0) {
        let x = Variable::new(a);
        let y = Variable::new(b);
        let m = model(&x, &y);
        let f = &m * sin(&m) + exp(&(&m * &x));

        let [rx, ry] = derivatives(&f, &wrt([&x, &y]));
        let topological = PropagationConfig::builder()
            .strategy(PropagationStrategy::Topological)
            .build();
        let [tx, ty] = derivatives_with(&f, &wrt([&x, &y]), &topological);

        prop_assert!((rx - tx).abs() <= 1e-10 * rx.abs().max(1.0));
        prop_assert!((ry - ty).abs() <= 1e-10 * ry.abs().max(1.0));
    }

    #[test]
    fn prop_rewrite_preserves_values_and_derivatives(values in prop::collection::vec(-2.0f64..2.0, 2..12)) {
        let xs: Vec<_> = values.iter().copied().map(Variable::new).collect();
        let sum_chain = xs[1..].iter().fold(xs[0].expr().clone(), |acc, x| acc + x);
        let mul_chain = xs[1..].iter().fold(xs[0].expr().clone(), |acc, x| acc * cos(x));
        let f = Variable::<f64>::bind(&sum_chain * &mul_chain + &sum_chain);

        let refs: Vec<&Variable<f64>> = xs.iter().collect();
        let before = derivatives_dyn(&f, &refs, &PropagationConfig::default());
        let value = *f.value();
        let nodes = f.expr().node_count();

        f.rewrite();
        let after = derivatives_dyn(&f, &refs, &PropagationConfig::default());

        prop_assert_eq!(*f.value(), value);
        prop_assert!(f.expr().node_count() <= nodes);
        for (b, a) in before.iter().zip(&after) {
            prop_assert!((b - a).abs() <= 1e-9 * b.abs().max(1.0));
        }

        // A second pass changes nothing.
        let mut once = String::new();
        f.expr().print_tree(&mut once).unwrap();
        f.rewrite();
        let mut twice = String::new();
        f.expr().print_tree(&mut twice).unwrap();
        prop_assert_eq!(once, twice);
    }
}
