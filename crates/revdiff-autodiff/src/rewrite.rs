//! Flattening of associative chains.
//!
//! A left-leaning chain such as `((a + b) + c) + d` makes the reverse pass
//! walk one binary node per term. The rewrite pass replaces every `Add` whose
//! operands are themselves additions by a single n-ary `Sum`, and likewise
//! every `Mul` chain by a `Product`. Replacement nodes keep the value of the
//! node they replace; the graph is rewritten bottom-up by splicing the new
//! nodes into their parents' operand slots.
//!
//! Running the pass twice is the same as running it once.

use crate::graph::{BinaryOp, Expr, Node, NodeKind};
use revdiff_core::Scalar;
use std::collections::HashMap;

/// Which associative operation a flattened node aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Sum,
    Product,
}

impl Chain {
    /// Whether `expr` belongs to this chain and should be absorbed.
    fn absorbs<T: Scalar>(self, expr: &Expr<T>) -> bool {
        matches!(
            (self, &expr.node().kind),
            (Self::Sum, NodeKind::Binary(BinaryOp::Add, ..))
                | (Self::Sum, NodeKind::Sum(_))
                | (Self::Product, NodeKind::Binary(BinaryOp::Mul, ..))
                | (Self::Product, NodeKind::Product(_))
        )
    }

    /// Appends the leaves of the chain rooted at `expr` to `out`.
    fn collect<T: Scalar>(self, expr: &Expr<T>, out: &mut Vec<Expr<T>>) {
        if !self.absorbs(expr) {
            out.push(expr.clone());
            return;
        }
        match &expr.node().kind {
            NodeKind::Binary(_, l, r) => {
                self.collect(&l.borrow(), out);
                self.collect(&r.borrow(), out);
            }
            NodeKind::Sum(terms) | NodeKind::Product(terms) => {
                for t in terms.borrow().iter() {
                    self.collect(t, out);
                }
            }
            _ => out.push(expr.clone()),
        }
    }

    fn build<T: Scalar>(self, value: T, operands: Vec<Expr<T>>) -> Expr<T> {
        let operands = std::cell::RefCell::new(operands);
        match self {
            Self::Sum => Expr::from_node(value, NodeKind::Sum(operands)),
            Self::Product => Expr::from_node(value, NodeKind::Product(operands)),
        }
    }
}

/// Memoizing rewriter. Visited nodes are pinned in the memo so that their
/// addresses stay unique for the duration of the pass.
struct Rewriter<T> {
    memo: HashMap<*const Node<T>, (Expr<T>, Option<Expr<T>>)>,
    flattened: usize,
}

impl<T: Scalar> Rewriter<T> {
    fn new() -> Self {
        Self {
            memo: HashMap::new(),
            flattened: 0,
        }
    }

    /// Rewrites the operands of `expr` in place and returns the replacement
    /// for `expr` itself, if any.
    fn visit(&mut self, expr: &Expr<T>) -> Option<Expr<T>> {
        if let Some((_, done)) = self.memo.get(&expr.as_ptr()) {
            return done.clone();
        }

        let chain = match &expr.node().kind {
            NodeKind::Constant | NodeKind::Independent(_) => None,
            NodeKind::Dependent(_, x) | NodeKind::Unary(_, x) => {
                self.splice(x);
                None
            }
            NodeKind::Binary(op, l, r) => {
                self.splice(l);
                self.splice(r);
                match op {
                    BinaryOp::Add => Some(Chain::Sum),
                    BinaryOp::Mul => Some(Chain::Product),
                    _ => None,
                }
            }
            NodeKind::Pow { base, exponent, .. } => {
                self.splice(base);
                self.splice(exponent);
                None
            }
            NodeKind::Sum(terms) => {
                self.splice_all(terms);
                Some(Chain::Sum)
            }
            NodeKind::Product(factors) => {
                self.splice_all(factors);
                Some(Chain::Product)
            }
        };

        let replacement = chain.and_then(|chain| {
            let nested = expr.operands().iter().any(|x| chain.absorbs(x));
            nested.then(|| {
                let mut operands = Vec::new();
                expr.for_each_operand(|x| chain.collect(x, &mut operands));
                self.flattened += 1;
                chain.build(expr.value().clone(), operands)
            })
        });

        self.memo
            .insert(expr.as_ptr(), (expr.clone(), replacement.clone()));
        replacement
    }

    fn splice(&mut self, slot: &std::cell::RefCell<Expr<T>>) {
        let child = slot.borrow().clone();
        if let Some(replacement) = self.visit(&child) {
            *slot.borrow_mut() = replacement;
        }
    }

    fn splice_all(&mut self, slots: &std::cell::RefCell<Vec<Expr<T>>>) {
        let children = slots.borrow().clone();
        for (i, child) in children.iter().enumerate() {
            if let Some(replacement) = self.visit(child) {
                slots.borrow_mut()[i] = replacement;
            }
        }
    }
}

impl<T: Scalar> Expr<T> {
    /// Flattens associative chains below and at this node.
    ///
    /// Operands are rewritten in place. The return value is the replacement
    /// for this node itself, which only the caller can splice in; `None` means
    /// this node stays as it is. Values are unchanged everywhere, and so are
    /// the derivatives any later propagation computes up to floating-point
    /// summation order.
    pub fn rewrite(&self) -> Option<Expr<T>> {
        let mut rewriter = Rewriter::new();
        let replacement = rewriter.visit(self);
        if rewriter.flattened > 0 {
            log::debug!(
                "rewrite flattened {} chains over {} nodes",
                rewriter.flattened,
                rewriter.memo.len()
            );
        }
        replacement
    }
}
