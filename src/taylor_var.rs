//! Lazily evaluated Taylor series handle: `TaylorVar<F>`.
//!
//! A `TaylorVar` is a cheap, shared handle to a node of an expression DAG.
//! Building an expression only records operations; coefficients are computed
//! on demand, once per node and order, and cached inside the node.
//!
//! `coeff[k]` = f^(k)(t₀) / k! (scaled Taylor coefficient), so
//! [`derivative`](TaylorVar::derivative) multiplies by `k!`.

use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use tracing::debug;

use crate::config::EvalConfig;
use crate::error::SeriesError;
use crate::eval;
use crate::node::{advance_seed_clock, BinaryOp, Node, NodeKind, Operand, UnaryOp};
use crate::Float;

/// Shared handle to a lazily evaluated truncated Taylor series.
///
/// Cloning shares the underlying node; a subexpression used twice is
/// evaluated once. The handle is not `Send`: a graph belongs to one thread.
#[derive(Clone)]
pub struct TaylorVar<F: Float> {
    pub(crate) node: Rc<Node<F>>,
}

impl<F: Float> Debug for TaylorVar<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.node.cache.borrow();
        f.debug_struct("TaylorVar")
            .field("op", &self.node.kind.name())
            .field("coeffs", &cache.coeffs.as_slice())
            .finish()
    }
}

impl<F: Float> Display for TaylorVar<F> {
    /// Prints the currently valid coefficients without forcing evaluation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.node.cache.borrow();
        let coeffs = cache.coeffs.as_slice();
        match coeffs.first() {
            None => write!(f, "<unevaluated {}>", self.node.kind.name()),
            Some(c0) => {
                write!(f, "{}", c0)?;
                for (i, c) in coeffs.iter().enumerate().skip(1) {
                    write!(f, " + {}·t^{}", c, i)?;
                }
                Ok(())
            }
        }
    }
}

impl<F: Float> From<F> for TaylorVar<F> {
    #[inline]
    fn from(val: F) -> Self {
        TaylorVar::constant(val)
    }
}

impl<F: Float> TaylorVar<F> {
    fn from_node(node: Node<F>) -> Self {
        TaylorVar {
            node: Rc::new(node),
        }
    }

    // ── Leaves ──

    /// Constant series `[val, 0, 0, ...]`, valid at every order.
    #[inline]
    pub fn constant(val: F) -> Self {
        Self::from_node(Node::new(NodeKind::Constant(val)))
    }

    /// Variable seeded with the standard single-variable seeding `[val, 1]`.
    ///
    /// Represents the identity function `t ↦ val + (t - t₀)`.
    #[inline]
    pub fn variable(val: F) -> Self {
        Self::from_coeffs(&[val, F::one()])
    }

    /// Variable whose only seeded coefficient is the value at order 0.
    ///
    /// Higher orders read as zero until seeded with
    /// [`set_coefficient`](Self::set_coefficient).
    #[inline]
    pub fn leaf(val: F) -> Self {
        Self::from_coeffs(&[val])
    }

    /// Variable seeded with the given coefficients.
    pub fn from_coeffs(coeffs: &[F]) -> Self {
        Self::from_node(Node::leaf(coeffs))
    }

    /// Identity node over `self` (unary plus).
    #[inline]
    pub fn wrap(&self) -> Self {
        self.unary(UnaryOp::Identity)
    }

    // ── Graph construction ──

    /// Record `op(self)`. Nothing is computed until a coefficient is requested.
    pub fn unary(&self, op: UnaryOp) -> Self {
        Self::from_node(Node::new(NodeKind::Unary(op, self.clone())))
    }

    /// Record `op(lhs, rhs)`. Either side may be a bare scalar.
    ///
    /// Constant series are recorded as bare scalars.
    pub fn binary(op: BinaryOp, lhs: impl Into<Operand<F>>, rhs: impl Into<Operand<F>>) -> Self {
        let lhs = lhs.into().normalized();
        let rhs = rhs.into().normalized();
        Self::from_node(Node::new(NodeKind::Binary(op, lhs, rhs)))
    }

    // ── Introspection ──

    /// Whether this is a constant leaf.
    pub fn is_constant(&self) -> bool {
        matches!(self.node.kind, NodeKind::Constant(_))
    }

    /// Whether this is a caller-seeded variable leaf.
    pub fn is_variable(&self) -> bool {
        matches!(self.node.kind, NodeKind::Variable)
    }

    /// Name of the operation that produced this series (`"variable"` for leaves).
    pub fn op_name(&self) -> &'static str {
        self.node.kind.name()
    }

    /// Whether two handles share the same node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.node, &b.node)
    }

    // ── Coefficients ──

    /// Seed coefficient `order` of a variable leaf.
    ///
    /// Orders may be written in any sequence; skipped orders read as zero.
    /// Every series computed from this leaf is recomputed on next use.
    pub fn set_coefficient(&self, order: usize, value: F) -> Result<(), SeriesError> {
        if !self.is_variable() {
            return Err(SeriesError::NotALeaf);
        }
        let mut cache = self.node.cache.borrow_mut();
        cache.coeffs.seed(order, value);
        cache.generation += 1;
        advance_seed_clock();
        Ok(())
    }

    /// Coefficient `order`, without forcing evaluation.
    ///
    /// Fails with [`SeriesError::OrderNotComputed`] if `order` has not been
    /// evaluated yet. Constants answer every order.
    pub fn coefficient(&self, order: usize) -> Result<F, SeriesError> {
        if let NodeKind::Constant(v) = &self.node.kind {
            return Ok(if order == 0 { *v } else { F::zero() });
        }
        eval::sync(&self.node);
        self.node.cache.borrow().coeffs.get(order)
    }

    /// Evaluate through `order` (idempotent). Returns the number of valid orders.
    ///
    /// This reports a count, not a value: use [`coefficient`](Self::coefficient)
    /// or [`derivative`](Self::derivative) to read results.
    pub fn evaluate(&self, order: usize) -> Result<usize, SeriesError> {
        self.evaluate_with(order, &EvalConfig::default())
    }

    /// [`evaluate`](Self::evaluate) with explicit limits.
    pub fn evaluate_with(&self, order: usize, config: &EvalConfig) -> Result<usize, SeriesError> {
        eval::evaluate(&self.node, order, config)
    }

    /// Number of currently valid orders (`0` if nothing is valid). Never forces evaluation.
    pub fn valid_count(&self) -> usize {
        eval::sync(&self.node);
        self.node.cache.borrow().coeffs.valid_count()
    }

    /// Highest currently valid order, or `None`. Never forces evaluation.
    pub fn highest_valid_order(&self) -> Option<usize> {
        self.valid_count().checked_sub(1)
    }

    /// Value at the expansion point (coefficient 0), forcing evaluation.
    pub fn value(&self) -> Result<F, SeriesError> {
        self.evaluate(0)?;
        self.coefficient(0)
    }

    /// Coefficients `0..=order`, forcing evaluation.
    pub fn coefficients(&self, order: usize) -> Result<Vec<F>, SeriesError> {
        self.evaluate(order)?;
        let cache = self.node.cache.borrow();
        Ok(cache.coeffs.as_slice()[..=order].to_vec())
    }

    // ── Derivatives ──

    /// The `n`-th derivative at the expansion point: `n! × coeff[n]`.
    pub fn derivative(&self, n: usize) -> Result<F, SeriesError> {
        self.derivative_with(n, &EvalConfig::default())
    }

    /// [`derivative`](Self::derivative) with explicit limits.
    pub fn derivative_with(&self, n: usize, config: &EvalConfig) -> Result<F, SeriesError> {
        self.evaluate_with(n, config)?;
        let mut value = self.coefficient(n)?;
        // Multiply the factorial in one factor at a time.
        for i in 2..=n {
            value = value * F::from_order(i);
        }
        Ok(value)
    }

    /// All derivatives `0..=n` at the expansion point.
    pub fn derivatives(&self, n: usize) -> Result<Vec<F>, SeriesError> {
        let coeffs = self.coefficients(n)?;
        let mut factorial = F::one();
        Ok(coeffs
            .into_iter()
            .enumerate()
            .map(|(k, c)| {
                if k >= 2 {
                    factorial = factorial * F::from_order(k);
                }
                c * factorial
            })
            .collect())
    }

    /// Discard every cached coefficient of this node (a no-op on constants).
    ///
    /// Operation and operand links are kept, so the same graph can be
    /// re-evaluated after re-seeding its variables. A reset variable must be
    /// seeded again before use.
    pub fn reset(&self) {
        if self.is_constant() {
            return;
        }
        let mut cache = self.node.cache.borrow_mut();
        debug!(
            op = self.node.kind.name(),
            discarded = cache.coeffs.valid_count(),
            "reset series cache"
        );
        cache.clear();
        advance_seed_clock();
    }

    // ── Elementary functions ──

    #[inline]
    pub fn sqrt(&self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    #[inline]
    pub fn exp(&self) -> Self {
        self.unary(UnaryOp::Exp)
    }

    /// Natural logarithm.
    #[inline]
    pub fn ln(&self) -> Self {
        self.unary(UnaryOp::Ln)
    }

    #[inline]
    pub fn sin(&self) -> Self {
        self.unary(UnaryOp::Sin)
    }

    #[inline]
    pub fn cos(&self) -> Self {
        self.unary(UnaryOp::Cos)
    }

    /// `(sin(self), cos(self))` from a single joint recurrence: the cosine
    /// reads the partner series the sine node already maintains.
    pub fn sin_cos(&self) -> (Self, Self) {
        let sin = self.sin();
        let cos = Self::from_node(Node::new(NodeKind::CosPartner(sin.clone())));
        (sin, cos)
    }

    #[inline]
    pub fn tan(&self) -> Self {
        self.unary(UnaryOp::Tan)
    }

    #[inline]
    pub fn asin(&self) -> Self {
        self.unary(UnaryOp::Asin)
    }

    #[inline]
    pub fn acos(&self) -> Self {
        self.unary(UnaryOp::Acos)
    }

    #[inline]
    pub fn atan(&self) -> Self {
        self.unary(UnaryOp::Atan)
    }

    /// `self * self`, reading the operand once per order.
    #[inline]
    pub fn square(&self) -> Self {
        self.unary(UnaryOp::Square)
    }

    /// `self^exponent` for a series exponent.
    #[inline]
    pub fn powf(&self, exponent: &Self) -> Self {
        Self::binary(BinaryOp::Pow, self, exponent)
    }

    /// `self^exponent` for a scalar exponent.
    ///
    /// Non-negative integer exponents also work when `self` starts at zero.
    #[inline]
    pub fn powf_scalar(&self, exponent: F) -> Self {
        Self::binary(BinaryOp::Pow, self, Operand::Scalar(exponent))
    }

    #[inline]
    pub fn powi(&self, n: i32) -> Self {
        self.powf_scalar(F::from_i32(n).unwrap_or_else(F::nan))
    }
}

/// `base^exponent` for a scalar base and a series exponent.
pub fn scalar_powf<F: Float>(base: F, exponent: &TaylorVar<F>) -> TaylorVar<F> {
    TaylorVar::binary(BinaryOp::Pow, Operand::Scalar(base), exponent)
}
