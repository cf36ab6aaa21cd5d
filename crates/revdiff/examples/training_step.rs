//! Gradient descent on a least-squares fit, using the training preset:
//! the poison guard, chain flattening and the topological pass.

use revdiff::prelude::*;

fn main() {
    let samples = [(0.0, 1.0), (1.0, 3.1), (2.0, 4.9), (3.0, 7.2)];
    let mut w = Variable::new(0.0_f64);
    let mut b = Variable::new(0.0_f64);
    let config = PropagationConfig::training();
    let rate = 0.02;

    for epoch in 0..500 {
        let residuals: Vec<Expr<f64>> = samples
            .iter()
            .map(|&(x, y)| abs2(&(&w * x + &b - y)))
            .collect();
        // Left-leaning chain; the rewrite pass turns it into one sum node.
        let loss = residuals[1..]
            .iter()
            .fold(residuals[0].clone(), |acc, r| acc + r);

        match try_derivatives(&loss, &wrt([&w, &b]), &config) {
            Ok([dw, db]) => {
                let (w_next, b_next) = (*w.value() - rate * dw, *b.value() - rate * db);
                w.update(w_next);
                b.update(b_next);
            }
            Err(err) => {
                eprintln!("epoch {epoch}: {err}");
                break;
            }
        }

        if epoch % 100 == 0 {
            println!("epoch {epoch:3}: loss = {loss:.6}");
        }
    }

    println!("fit: y = {w:.4} x + {b:.4}");
}
