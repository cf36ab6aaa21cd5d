//! Derivatives of a three-variable function.

use revdiff::prelude::*;

fn main() {
    let x = Variable::new(1.0_f64);
    let y = Variable::new(2.0_f64);
    let z = Variable::new(3.0_f64);

    let u = 1.0 + &x + &y + &z + &x * &y + &y * &z + &x * &z + &x * &y * &z
        + exp(&(&x / &y + &y / &z));

    let [ux, uy, uz] = derivatives(&u, &wrt!(x, y, z));
    println!("u      = {u}");
    println!("du/dx  = {ux}");
    println!("du/dy  = {uy}");
    println!("du/dz  = {uz}");

    let mut tree = String::new();
    if u.print_tree(&mut tree).is_ok() {
        println!("\n{} distinct nodes:\n{tree}", u.node_count());
    }
}
