//! Reverse pass through the computation graph.
//!
//! A propagation starts at an output node with a weight (usually one) and
//! applies the chain rule node by node: each node turns the weight it receives
//! into one weight per operand and passes it on. Variable nodes add every
//! weight that reaches them to their accumulator.
//!
//! Two numeric traversals are available:
//! - recursive: a node is re-entered once per path reaching it;
//! - topological: every node is processed once, after all of its parents,
//!   with the incoming weights summed in a side table.
//!
//! The symbolic pass always recurses and produces weights that are graph
//! nodes themselves, so the resulting derivatives can be differentiated again.

use crate::graph::{BinaryOp, Expr, Node, NodeKind, UnaryOp};
use crate::ops;
use revdiff_core::{constants, Scalar};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Selects which variable nodes accumulate during a pass.
pub(crate) enum Listeners<'a, T> {
    /// Every variable reached by the pass.
    All,
    /// Only the listed variable nodes; all others are left untouched.
    Only(&'a HashSet<*const Node<T>>),
}

impl<T: Scalar> Listeners<'_, T> {
    fn accepts(&self, expr: &Expr<T>) -> bool {
        match self {
            Self::All => true,
            Self::Only(targets) => targets.contains(&expr.as_ptr()),
        }
    }
}

/// Derivative of `|x|`, with +1 at zero.
fn abs_slope<T: Scalar>(x: &T) -> T {
    if *x == T::zero() {
        T::one()
    } else {
        T::one().copysign(x)
    }
}

/// Local numeric chain rule of a single-operand node.
///
/// Returns `None` when the operand receives no contribution.
fn unary_weight<T: Scalar>(op: UnaryOp, x: &T, value: &T, w: T) -> Option<T> {
    let weight = match op {
        UnaryOp::Negative => -w,
        UnaryOp::Sin => w * x.cos(),
        UnaryOp::Cos => -w * x.sin(),
        UnaryOp::Tan => {
            let aux = T::one() / x.cos();
            w * aux.clone() * aux
        }
        UnaryOp::Sinh => w * x.cosh(),
        UnaryOp::Cosh => w * x.sinh(),
        UnaryOp::Tanh => {
            let aux = T::one() / x.cosh();
            w * aux.clone() * aux
        }
        UnaryOp::ArcSin => w / (T::one() - x.clone() * x.clone()).sqrt(),
        UnaryOp::ArcCos => -w / (T::one() - x.clone() * x.clone()).sqrt(),
        UnaryOp::ArcTan => w / (T::one() + x.clone() * x.clone()),
        UnaryOp::Exp => w * value.clone(),
        UnaryOp::Log => w / x.clone(),
        UnaryOp::Log10 => w / (constants::ln_10::<T>() * x.clone()),
        UnaryOp::Sqrt => w / (constants::two::<T>() * value.clone()),
        UnaryOp::Abs => w * abs_slope(x),
        UnaryOp::Erf => {
            w * constants::frac_2_sqrt_pi::<T>() * (-(x.clone() * x.clone())).exp()
        }
        UnaryOp::Sigmoid => w * value.clone() * (T::one() - value.clone()),
        UnaryOp::Relu => {
            if *x >= T::zero() {
                w
            } else {
                return None;
            }
        }
    };
    Some(weight)
}

/// Local symbolic chain rule of a single-operand node. `this` is the node
/// itself, reused wherever the derivative involves its own value.
fn unary_weightx<T: Scalar>(
    op: UnaryOp,
    x: &Expr<T>,
    this: &Expr<T>,
    w: &Expr<T>,
) -> Option<Expr<T>> {
    let one = || Expr::constant(T::one());
    let weight = match op {
        UnaryOp::Negative => -w,
        UnaryOp::Sin => w * ops::cos(x),
        UnaryOp::Cos => -w * ops::sin(x),
        UnaryOp::Tan => {
            let aux = one() / ops::cos(x);
            w * &aux * &aux
        }
        UnaryOp::Sinh => w * ops::cosh(x),
        UnaryOp::Cosh => w * ops::sinh(x),
        UnaryOp::Tanh => {
            let aux = one() / ops::cosh(x);
            w * &aux * &aux
        }
        UnaryOp::ArcSin => w / ops::sqrt(&(one() - x * x)),
        UnaryOp::ArcCos => -w / ops::sqrt(&(one() - x * x)),
        UnaryOp::ArcTan => w / (one() + x * x),
        UnaryOp::Exp => w * this,
        UnaryOp::Log => w / x,
        UnaryOp::Log10 => w / (x * constants::ln_10::<T>()),
        UnaryOp::Sqrt => w / (this * constants::two::<T>()),
        UnaryOp::Abs => w * abs_slope(x.value()),
        UnaryOp::Erf => w * constants::frac_2_sqrt_pi::<T>() * ops::exp(&-(x * x)),
        UnaryOp::Sigmoid => w * this * (one() - this),
        UnaryOp::Relu => {
            if *x.value() >= T::zero() {
                w.clone()
            } else {
                return None;
            }
        }
    };
    Some(weight)
}

impl<T: Scalar> Expr<T> {
    /// Numeric chain rule: emits one weight per operand.
    fn pullback(&self, w: &T, emit: &mut dyn FnMut(&Expr<T>, T)) {
        let Node { value, kind } = self.node();
        match kind {
            NodeKind::Constant | NodeKind::Independent(_) => {}
            NodeKind::Dependent(_, x) => emit(&x.borrow(), w.clone()),
            NodeKind::Unary(op, x) => {
                let x = x.borrow();
                if let Some(weight) = unary_weight(*op, x.value(), value, w.clone()) {
                    emit(&x, weight);
                }
            }
            NodeKind::Binary(op, l, r) => {
                let (l, r) = (l.borrow(), r.borrow());
                match op {
                    BinaryOp::Add => {
                        emit(&l, w.clone());
                        emit(&r, w.clone());
                    }
                    BinaryOp::Sub => {
                        emit(&l, w.clone());
                        emit(&r, -w.clone());
                    }
                    BinaryOp::Mul => {
                        emit(&l, w.clone() * r.value().clone());
                        emit(&r, w.clone() * l.value().clone());
                    }
                    BinaryOp::Div => {
                        let aux1 = T::one() / r.value().clone();
                        let aux2 = -l.value().clone() * aux1.clone() * aux1.clone();
                        emit(&l, w.clone() * aux1);
                        emit(&r, w.clone() * aux2);
                    }
                    BinaryOp::PowConstLeft => {
                        emit(&r, w.clone() * value.clone() * l.value().ln());
                    }
                    BinaryOp::PowConstRight => {
                        let c = r.value();
                        let slope = c.clone() * l.value().powf(&(c.clone() - T::one()));
                        emit(&l, w.clone() * slope);
                    }
                }
            }
            NodeKind::Pow {
                base,
                exponent,
                log_base,
            } => {
                let (b, e) = (base.borrow(), exponent.borrow());
                let aux = w.clone() * value.clone();
                emit(&b, aux.clone() * e.value().clone() / b.value().clone());
                emit(&e, aux * log_base.clone());
            }
            NodeKind::Sum(terms) => {
                for t in terms.borrow().iter() {
                    emit(t, w.clone());
                }
            }
            NodeKind::Product(factors) => {
                let factors = factors.borrow();
                for (i, f) in factors.iter().enumerate() {
                    let weight = factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .fold(w.clone(), |acc, (_, g)| acc * g.value().clone());
                    emit(f, weight);
                }
            }
        }
    }

    /// Symbolic chain rule: emits one weight expression per operand.
    fn pullbackx(&self, w: &Expr<T>, emit: &mut dyn FnMut(&Expr<T>, Expr<T>)) {
        match &self.node().kind {
            NodeKind::Constant | NodeKind::Independent(_) => {}
            NodeKind::Dependent(_, x) => emit(&x.borrow(), w.clone()),
            NodeKind::Unary(op, x) => {
                let x = x.borrow().clone();
                if let Some(weight) = unary_weightx(*op, &x, self, w) {
                    emit(&x, weight);
                }
            }
            NodeKind::Binary(op, l, r) => {
                let (l, r) = (l.borrow().clone(), r.borrow().clone());
                match op {
                    BinaryOp::Add => {
                        emit(&l, w.clone());
                        emit(&r, w.clone());
                    }
                    BinaryOp::Sub => {
                        emit(&l, w.clone());
                        emit(&r, -w);
                    }
                    BinaryOp::Mul => {
                        emit(&l, w * &r);
                        emit(&r, w * &l);
                    }
                    BinaryOp::Div => {
                        let aux1 = Expr::constant(T::one()) / &r;
                        let aux2 = -&l * &aux1 * &aux1;
                        emit(&l, w * &aux1);
                        emit(&r, w * &aux2);
                    }
                    BinaryOp::PowConstLeft => {
                        emit(&r, w * self * ops::log(&l));
                    }
                    BinaryOp::PowConstRight => {
                        let c = r.value().clone();
                        emit(&l, w * ops::powf(&l, c - T::one()) * &r);
                    }
                }
            }
            NodeKind::Pow { base, exponent, .. } => {
                let (b, e) = (base.borrow().clone(), exponent.borrow().clone());
                let aux = w * ops::pow(&b, &(&e - T::one()));
                emit(&b, &aux * &e);
                emit(&e, &aux * &b * ops::log(&b));
            }
            NodeKind::Sum(terms) => {
                for t in terms.borrow().iter() {
                    emit(t, w.clone());
                }
            }
            NodeKind::Product(factors) => {
                let factors = factors.borrow();
                for (i, f) in factors.iter().enumerate() {
                    let others = factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, g)| g.clone())
                        .collect();
                    emit(f, w * Expr::product(others));
                }
            }
        }
    }

    /// Numeric reverse pass from this node with incoming weight `wprime`.
    ///
    /// Every variable reached adds its contributions to its numeric
    /// accumulator. Accumulators are not reset here; seed them first.
    pub fn propagate(&self, wprime: T) {
        propagate(self, wprime, &Listeners::All);
    }

    /// Symbolic reverse pass from this node with incoming weight `wprime`.
    ///
    /// Every variable reached adds its contributions to its symbolic
    /// accumulator.
    pub fn propagatex(&self, wprime: &Expr<T>) {
        propagatex(self, wprime, &Listeners::All);
    }

    /// Numeric reverse pass that processes every reachable node exactly once.
    ///
    /// Produces the same accumulated derivatives as [`Expr::propagate`] up to
    /// floating-point summation order.
    pub fn propagate_topological(&self, wprime: T) {
        propagate_topological(self, wprime, &Listeners::All);
    }
}

pub(crate) fn propagate<T: Scalar>(expr: &Expr<T>, wprime: T, listeners: &Listeners<'_, T>) {
    if let Some(acc) = expr.accumulator() {
        if listeners.accepts(expr) {
            acc.accumulate(wprime.clone());
        }
    }
    expr.pullback(&wprime, &mut |operand, weight| {
        propagate(operand, weight, listeners)
    });
}

pub(crate) fn propagatex<T: Scalar>(
    expr: &Expr<T>,
    wprime: &Expr<T>,
    listeners: &Listeners<'_, T>,
) {
    if let Some(acc) = expr.accumulator() {
        if listeners.accepts(expr) {
            acc.accumulatex(wprime);
        }
    }
    expr.pullbackx(wprime, &mut |operand, weight| {
        propagatex(operand, &weight, listeners)
    });
}

pub(crate) fn propagate_topological<T: Scalar>(
    root: &Expr<T>,
    wprime: T,
    listeners: &Listeners<'_, T>,
) {
    let order = root.topological_order();
    let mut adjoints: HashMap<*const Node<T>, T> = HashMap::with_capacity(order.len());
    adjoints.insert(root.as_ptr(), wprime);

    for expr in &order {
        // Unreached nodes: every path to them was cut by a zero-slope rule.
        let Some(w) = adjoints.remove(&expr.as_ptr()) else {
            continue;
        };
        if let Some(acc) = expr.accumulator() {
            if listeners.accepts(expr) {
                acc.accumulate(w.clone());
            }
        }
        expr.pullback(&w, &mut |operand, weight| match adjoints.entry(operand.as_ptr()) {
            Entry::Occupied(mut entry) => {
                let total = entry.get().clone() + weight;
                entry.insert(total);
            }
            Entry::Vacant(entry) => {
                entry.insert(weight);
            }
        });
    }

    log::trace!("topological pass visited {} nodes", order.len());
}
