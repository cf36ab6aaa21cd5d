//! Expression graph for reverse-mode automatic differentiation.
//!
//! Every arithmetic operation allocates a new immutable node that holds its
//! forward value, computed eagerly at construction, together with shared
//! references to its operands. Operands always exist before the node that
//! references them, so the graph is acyclic by construction. Nodes are
//! reference counted and a node may be shared by any number of parents.
//!
//! The only mutable state in a node lives in:
//! - the derivative accumulators of variable nodes, written by propagation;
//! - the operand slots of composite nodes, written by the rewrite pass.

use revdiff_core::Scalar;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

/// Enumeration of node kinds for easier matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// A fixed value that never receives derivatives.
    Constant,
    /// A variable created from a value.
    IndependentVariable,
    /// A variable bound to an expression.
    DependentVariable,
    /// `-x`.
    Negative,
    /// `l + r`.
    Add,
    /// `l - r`.
    Sub,
    /// `l * r`.
    Mul,
    /// `l / r`.
    Div,
    /// `l^r` with both operands tracked.
    Pow,
    /// `c^r` with a constant base.
    PowConstLeft,
    /// `l^c` with a constant exponent.
    PowConstRight,
    /// `sin(x)`.
    Sin,
    /// `cos(x)`.
    Cos,
    /// `tan(x)`.
    Tan,
    /// `sinh(x)`.
    Sinh,
    /// `cosh(x)`.
    Cosh,
    /// `tanh(x)`.
    Tanh,
    /// `asin(x)`.
    ArcSin,
    /// `acos(x)`.
    ArcCos,
    /// `atan(x)`.
    ArcTan,
    /// `exp(x)`.
    Exp,
    /// Natural logarithm.
    Log,
    /// Base-10 logarithm.
    Log10,
    /// `sqrt(x)`.
    Sqrt,
    /// `|x|`.
    Abs,
    /// Error function.
    Erf,
    /// Logistic function `1 / (1 + exp(-x))`.
    Sigmoid,
    /// `max(x, 0)`.
    Relu,
    /// N-ary sum.
    Sum,
    /// N-ary product.
    Product,
}

impl ExprKind {
    /// Whether nodes of this kind carry derivative accumulators.
    pub fn is_variable(self) -> bool {
        matches!(self, Self::IndependentVariable | Self::DependentVariable)
    }
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Single-operand node operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Negative,
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    ArcSin,
    ArcCos,
    ArcTan,
    Exp,
    Log,
    Log10,
    Sqrt,
    Abs,
    Erf,
    Sigmoid,
    Relu,
}

impl UnaryOp {
    /// Forward value of the operation applied to `x`.
    pub(crate) fn eval<T: Scalar>(self, x: &T) -> T {
        match self {
            Self::Negative => -x.clone(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::ArcSin => x.asin(),
            Self::ArcCos => x.acos(),
            Self::ArcTan => x.atan(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Log10 => x.log10(),
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Erf => x.erf(),
            Self::Sigmoid => T::one() / (T::one() + (-x.clone()).exp()),
            Self::Relu => {
                if *x > T::zero() {
                    x.clone()
                } else {
                    T::zero()
                }
            }
        }
    }

    fn kind(self) -> ExprKind {
        match self {
            Self::Negative => ExprKind::Negative,
            Self::Sin => ExprKind::Sin,
            Self::Cos => ExprKind::Cos,
            Self::Tan => ExprKind::Tan,
            Self::Sinh => ExprKind::Sinh,
            Self::Cosh => ExprKind::Cosh,
            Self::Tanh => ExprKind::Tanh,
            Self::ArcSin => ExprKind::ArcSin,
            Self::ArcCos => ExprKind::ArcCos,
            Self::ArcTan => ExprKind::ArcTan,
            Self::Exp => ExprKind::Exp,
            Self::Log => ExprKind::Log,
            Self::Log10 => ExprKind::Log10,
            Self::Sqrt => ExprKind::Sqrt,
            Self::Abs => ExprKind::Abs,
            Self::Erf => ExprKind::Erf,
            Self::Sigmoid => ExprKind::Sigmoid,
            Self::Relu => ExprKind::Relu,
        }
    }
}

/// Two-operand node operations.
///
/// The general power `l^r` is not listed here: it caches `ln(l)` and has its
/// own node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `c^r` with a constant base.
    PowConstLeft,
    /// `l^c` with a constant exponent.
    PowConstRight,
}

impl BinaryOp {
    pub(crate) fn eval<T: Scalar>(self, l: &T, r: &T) -> T {
        match self {
            Self::Add => l.clone() + r.clone(),
            Self::Sub => l.clone() - r.clone(),
            Self::Mul => l.clone() * r.clone(),
            Self::Div => l.clone() / r.clone(),
            Self::PowConstLeft | Self::PowConstRight => l.powf(r),
        }
    }

    fn kind(self) -> ExprKind {
        match self {
            Self::Add => ExprKind::Add,
            Self::Sub => ExprKind::Sub,
            Self::Mul => ExprKind::Mul,
            Self::Div => ExprKind::Div,
            Self::PowConstLeft => ExprKind::PowConstLeft,
            Self::PowConstRight => ExprKind::PowConstRight,
        }
    }
}

/// Derivative accumulators of a variable node.
pub(crate) struct Accumulator<T> {
    /// Numeric accumulator.
    pub(crate) grad: RefCell<T>,
    /// Symbolic accumulator.
    pub(crate) gradx: RefCell<Expr<T>>,
}

impl<T: Scalar> Accumulator<T> {
    fn new() -> Self {
        Self {
            grad: RefCell::new(T::zero()),
            gradx: RefCell::new(Expr::constant(T::zero())),
        }
    }

    pub(crate) fn reset_grad(&self) {
        *self.grad.borrow_mut() = T::zero();
    }

    pub(crate) fn reset_gradx(&self) {
        *self.gradx.borrow_mut() = Expr::constant(T::zero());
    }

    pub(crate) fn accumulate(&self, wprime: T) {
        let mut grad = self.grad.borrow_mut();
        *grad = grad.clone() + wprime;
    }

    pub(crate) fn accumulatex(&self, wprime: &Expr<T>) {
        let mut gradx = self.gradx.borrow_mut();
        *gradx = &*gradx + wprime;
    }
}

/// Operand slot of a composite node. The rewrite pass may splice a
/// replacement into it; nothing else writes to it.
pub(crate) type Slot<T> = RefCell<Expr<T>>;

/// Structure of a node: its kind plus operand references.
pub(crate) enum NodeKind<T> {
    Constant,
    Independent(Accumulator<T>),
    /// A variable bound to an expression: accumulates, then forwards.
    Dependent(Accumulator<T>, Slot<T>),
    Unary(UnaryOp, Slot<T>),
    Binary(BinaryOp, Slot<T>, Slot<T>),
    /// General power; `log_base` is `ln(base)` evaluated once at construction.
    Pow {
        base: Slot<T>,
        exponent: Slot<T>,
        log_base: T,
    },
    Sum(RefCell<Vec<Expr<T>>>),
    Product(RefCell<Vec<Expr<T>>>),
}

/// A node in the computation graph.
pub(crate) struct Node<T> {
    /// Forward value, written once at construction
    pub(crate) value: T,
    /// Kind and operands
    pub(crate) kind: NodeKind<T>,
}

/// Shared handle to a graph node.
///
/// Cloning is cheap and aliases the same node. Comparison operators compare
/// forward values, never node identity; use [`Expr::ptr_eq`] for identity.
pub struct Expr<T>(Rc<Node<T>>);

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Scalar> Expr<T> {
    pub(crate) fn from_node(value: T, kind: NodeKind<T>) -> Self {
        Self(Rc::new(Node { value, kind }))
    }

    /// Creates a constant (non-differentiable) node.
    pub fn constant(value: T) -> Self {
        Self::from_node(value, NodeKind::Constant)
    }

    pub(crate) fn independent(value: T) -> Self {
        Self::from_node(value, NodeKind::Independent(Accumulator::new()))
    }

    pub(crate) fn dependent(expr: Self) -> Self {
        let value = expr.value().clone();
        Self::from_node(
            value,
            NodeKind::Dependent(Accumulator::new(), RefCell::new(expr)),
        )
    }

    pub(crate) fn unary(op: UnaryOp, x: &Self) -> Self {
        let value = op.eval(x.value());
        Self::from_node(value, NodeKind::Unary(op, RefCell::new(x.clone())))
    }

    pub(crate) fn binary(op: BinaryOp, l: &Self, r: &Self) -> Self {
        let value = op.eval(l.value(), r.value());
        Self::from_node(
            value,
            NodeKind::Binary(op, RefCell::new(l.clone()), RefCell::new(r.clone())),
        )
    }

    pub(crate) fn pow(base: &Self, exponent: &Self) -> Self {
        let value = base.value().powf(exponent.value());
        let log_base = base.value().ln();
        Self::from_node(
            value,
            NodeKind::Pow {
                base: RefCell::new(base.clone()),
                exponent: RefCell::new(exponent.clone()),
                log_base,
            },
        )
    }

    /// Creates an n-ary sum node. The value of an empty sum is zero.
    pub fn sum(terms: Vec<Self>) -> Self {
        let value = match terms.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(first.value().clone(), |acc, t| acc + t.value().clone()),
            None => T::zero(),
        };
        Self::from_node(value, NodeKind::Sum(RefCell::new(terms)))
    }

    /// Creates an n-ary product node. The value of an empty product is one.
    pub fn product(factors: Vec<Self>) -> Self {
        let value = match factors.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(first.value().clone(), |acc, t| acc * t.value().clone()),
            None => T::one(),
        };
        Self::from_node(value, NodeKind::Product(RefCell::new(factors)))
    }

    /// Forward value of this node.
    pub fn value(&self) -> &T {
        &self.0.value
    }

    /// Kind of this node.
    pub fn kind(&self) -> ExprKind {
        match &self.0.kind {
            NodeKind::Constant => ExprKind::Constant,
            NodeKind::Independent(_) => ExprKind::IndependentVariable,
            NodeKind::Dependent(..) => ExprKind::DependentVariable,
            NodeKind::Unary(op, _) => op.kind(),
            NodeKind::Binary(op, ..) => op.kind(),
            NodeKind::Pow { .. } => ExprKind::Pow,
            NodeKind::Sum(_) => ExprKind::Sum,
            NodeKind::Product(_) => ExprKind::Product,
        }
    }

    /// Checks if this node is a leaf (has no operands).
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.0.kind,
            NodeKind::Constant | NodeKind::Independent(_)
        )
    }

    /// Whether this node is a constant.
    pub fn is_constant(&self) -> bool {
        matches!(self.0.kind, NodeKind::Constant)
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const Node<T> {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn node(&self) -> &Node<T> {
        &self.0
    }

    pub(crate) fn accumulator(&self) -> Option<&Accumulator<T>> {
        match &self.0.kind {
            NodeKind::Independent(acc) | NodeKind::Dependent(acc, _) => Some(acc),
            _ => None,
        }
    }

    /// Calls `f` on each operand, in order.
    pub(crate) fn for_each_operand(&self, mut f: impl FnMut(&Self)) {
        match &self.0.kind {
            NodeKind::Constant | NodeKind::Independent(_) => {}
            NodeKind::Dependent(_, x) | NodeKind::Unary(_, x) => f(&x.borrow()),
            NodeKind::Binary(_, l, r)
            | NodeKind::Pow {
                base: l,
                exponent: r,
                ..
            } => {
                f(&l.borrow());
                f(&r.borrow());
            }
            NodeKind::Sum(terms) | NodeKind::Product(terms) => {
                for t in terms.borrow().iter() {
                    f(t);
                }
            }
        }
    }

    /// Snapshot of the operand references of this node.
    pub fn operands(&self) -> Vec<Self> {
        let mut operands = Vec::new();
        self.for_each_operand(|x| operands.push(x.clone()));
        operands
    }

    /// Nodes reachable from this one, each listed once and before all of
    /// its operands.
    ///
    /// Reverse of a depth-first post-order, walked with an explicit stack so
    /// that deep graphs do not exhaust the call stack.
    pub(crate) fn topological_order(&self) -> Vec<Self> {
        let mut visited: HashSet<*const Node<T>> = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(self.clone(), false)];

        while let Some((expr, expanded)) = stack.pop() {
            if expanded {
                order.push(expr);
                continue;
            }
            if !visited.insert(expr.as_ptr()) {
                continue;
            }
            let operands = expr.operands();
            stack.push((expr, true));
            // Reversed so the first operand is explored first.
            for x in operands.into_iter().rev() {
                if !visited.contains(&x.as_ptr()) {
                    stack.push((x, false));
                }
            }
        }

        order.reverse();
        order
    }

    /// Number of distinct nodes reachable from this one, itself included.
    pub fn node_count(&self) -> usize {
        self.topological_order().len()
    }

    /// Writes an indented dump of the expression tree, one node per line.
    ///
    /// Shared nodes are printed once per path that reaches them.
    pub fn print_tree<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        fn visit<T: Scalar, W: fmt::Write>(
            expr: &Expr<T>,
            depth: usize,
            out: &mut W,
        ) -> fmt::Result {
            writeln!(out, "{:indent$}{} = {}", "", expr.kind(), expr.value(), indent = 2 * depth)?;
            let mut result = Ok(());
            expr.for_each_operand(|x| {
                if result.is_ok() {
                    result = visit(x, depth + 1, out);
                }
            });
            result
        }

        visit(self, 0, out)
    }
}

impl<T: Scalar> Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("kind", &self.kind())
            .field("value", self.value())
            .finish()
    }
}

impl<T: Scalar> Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.value(), f)
    }
}
