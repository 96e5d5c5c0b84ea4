//! Expression-graph nodes: what a series is, and its coefficient cache.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::coeffs::CoeffStore;
use crate::taylor_var::TaylorVar;
use crate::Float;

/// Single-operand operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Identity,
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Square,
}

impl UnaryOp {
    /// Short lowercase name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Identity => "identity",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Ln => "ln",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Square => "square",
        }
    }

    /// Number of auxiliary series advanced alongside the result.
    pub(crate) fn aux_count(self) -> usize {
        match self {
            // cos (resp. sin) partner, 1 + tan², sqrt(1 - a²), 1 + a²
            UnaryOp::Sin | UnaryOp::Cos | UnaryOp::Tan => 1,
            UnaryOp::Asin | UnaryOp::Acos | UnaryOp::Atan => 1,
            _ => 0,
        }
    }
}

/// Two-operand operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// Short lowercase name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Pow => "pow",
        }
    }
}

/// One side of a binary operation: a shared series or a bare scalar.
///
/// A scalar behaves as a constant series `[x, 0, 0, ...]` but is never
/// wrapped in a node of its own.
#[derive(Clone, Debug)]
pub enum Operand<F: Float> {
    Series(TaylorVar<F>),
    Scalar(F),
}

impl<F: Float> From<TaylorVar<F>> for Operand<F> {
    fn from(v: TaylorVar<F>) -> Self {
        Operand::Series(v)
    }
}

impl<F: Float> From<&TaylorVar<F>> for Operand<F> {
    fn from(v: &TaylorVar<F>) -> Self {
        Operand::Series(v.clone())
    }
}

impl<F: Float> Operand<F> {
    /// A constant node becomes a bare scalar, so it takes the scalar paths
    /// of the evaluator (integer `pow` in particular).
    pub(crate) fn normalized(self) -> Self {
        if let Operand::Series(v) = &self {
            if let NodeKind::Constant(x) = &v.node.kind {
                return Operand::Scalar(*x);
            }
        }
        self
    }
}

/// How a series was produced.
#[derive(Debug)]
pub(crate) enum NodeKind<F: Float> {
    /// `[value, 0, 0, ...]`, valid at every order.
    Constant(F),
    /// Leaf whose coefficients are seeded by the caller.
    Variable,
    Unary(UnaryOp, TaylorVar<F>),
    Binary(BinaryOp, Operand<F>, Operand<F>),
    /// The cosine series kept alongside a `sin` node, read without recomputation.
    CosPartner(TaylorVar<F>),
}

impl<F: Float> NodeKind<F> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "constant",
            NodeKind::Variable => "variable",
            NodeKind::Unary(op, _) => op.name(),
            NodeKind::Binary(op, _, _) => op.name(),
            NodeKind::CosPartner(_) => UnaryOp::Cos.name(),
        }
    }

    /// Move the series operands out, leaving a leaf behind.
    fn take_operands(&mut self, out: &mut Vec<TaylorVar<F>>) {
        match std::mem::replace(self, NodeKind::Variable) {
            NodeKind::Unary(_, a) | NodeKind::CosPartner(a) => out.push(a),
            NodeKind::Binary(_, lhs, rhs) => {
                for operand in [lhs, rhs] {
                    if let Operand::Series(v) = operand {
                        out.push(v);
                    }
                }
            }
            NodeKind::Constant(_) | NodeKind::Variable => {}
        }
    }
}

/// Mutable state of a node.
#[derive(Debug)]
pub(crate) struct NodeCache<F: Float> {
    pub(crate) coeffs: CoeffStore<F>,
    /// Helper series advanced in lock-step with `coeffs`.
    pub(crate) aux: Vec<Vec<F>>,
    /// Bumped every time previously valid coefficients are discarded.
    pub(crate) generation: u64,
    /// Operand generations the cached coefficients were computed from.
    pub(crate) operand_gens: [u64; 2],
    /// Seed clock value at the last staleness check.
    pub(crate) checked_at: u64,
}

impl<F: Float> NodeCache<F> {
    pub(crate) fn with_coeffs(coeffs: CoeffStore<F>) -> Self {
        NodeCache {
            coeffs,
            aux: Vec::new(),
            generation: 0,
            operand_gens: [0; 2],
            checked_at: u64::MAX,
        }
    }

    /// Discard all coefficients (primary and auxiliary), keeping allocations.
    pub(crate) fn clear(&mut self) {
        self.coeffs.reset();
        for series in &mut self.aux {
            series.clear();
        }
        self.generation += 1;
    }
}

/// A node in the expression DAG.
#[derive(Debug)]
pub(crate) struct Node<F: Float> {
    pub(crate) kind: NodeKind<F>,
    pub(crate) cache: RefCell<NodeCache<F>>,
}

impl<F: Float> Node<F> {
    pub(crate) fn new(kind: NodeKind<F>) -> Self {
        let coeffs = match &kind {
            NodeKind::Constant(v) => CoeffStore::from_slice(&[*v]),
            _ => CoeffStore::new(),
        };
        Node {
            kind,
            cache: RefCell::new(NodeCache::with_coeffs(coeffs)),
        }
    }

    pub(crate) fn leaf(coeffs: &[F]) -> Self {
        Node {
            kind: NodeKind::Variable,
            cache: RefCell::new(NodeCache::with_coeffs(CoeffStore::from_slice(coeffs))),
        }
    }

    /// Current generation of this node's cache.
    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.cache.borrow().generation
    }
}

impl<F: Float> Drop for Node<F> {
    /// Unlinks operand chains with an explicit worklist; the default drop
    /// recurses once per graph level.
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.kind.take_operands(&mut pending);
        while let Some(var) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(var.node) {
                node.kind.take_operands(&mut pending);
            }
        }
    }
}

// ── Seed clock ──
//
// Advanced whenever a leaf is re-seeded or any cache is reset. A node whose
// staleness was checked at the current clock value cannot have stale
// operands, so repeated visits of a shared subgraph are O(1).

thread_local! {
    static SEED_CLOCK: Cell<u64> = const { Cell::new(0) };
}

#[inline]
pub(crate) fn seed_clock() -> u64 {
    SEED_CLOCK.with(|c| c.get())
}

#[inline]
pub(crate) fn advance_seed_clock() {
    SEED_CLOCK.with(|c| c.set(c.get().wrapping_add(1)));
}
