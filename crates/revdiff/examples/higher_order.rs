//! Second derivatives, two ways: repeated symbolic passes and nested graphs.

use revdiff::prelude::*;

fn main() {
    let x = Variable::new(0.5_f64);
    let y = sin(&x) * cos(&x);

    // Symbolic first derivative, then a numeric pass over it.
    let [yx] = derivativesx(&y, &wrt([&x]));
    let [yxx] = derivatives(&yx, &wrt([&x]));
    println!("symbolic: y' = {yx}, y'' = {yxx}");

    // A graph whose element type is itself an expression.
    let outer: Variable<Expr<f64>> = Variable::new(x.expr().clone());
    let y = sin(&outer) * cos(&outer);
    let [yx] = derivatives(&y, &wrt([&outer]));
    let [yxx] = derivatives(&yx, &wrt([&x]));
    println!("nested:   y' = {yx}, y'' = {yxx}");

    let xs = vec![Variable::new(1.0_f64), Variable::new(2.0_f64)];
    let f = abs2(&xs[0]) * &xs[1] + powf(&xs[1], 3.0);
    println!("hessian:{}", hessian(&f, &xs));
}
