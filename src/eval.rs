//! Demand-driven evaluation of an expression graph.
//!
//! Evaluation runs in two passes. [`sync`] walks the graph iteratively and
//! discards caches whose operands changed generation since they were built
//! (a leaf was re-seeded or some node was reset). [`compute`] then recurses
//! from the requested node to the leaves and advances every cache one order
//! at a time, operands first.

use std::cell::Ref;

use tracing::{debug, trace, warn};

use crate::coeffs::CoeffStore;
use crate::config::EvalConfig;
use crate::error::SeriesError;
use crate::node::{seed_clock, BinaryOp, Node, NodeCache, NodeKind, Operand, UnaryOp};
use crate::taylor_ops::{
    div_at, exp_at, mul_at, powf_at, quotient_integral_at, scalar_at, sin_cos_at, sqr_at,
    sqrt_at, tan_at,
};
use crate::Float;

/// Ensure `node` is valid through `order`. Returns the resulting valid count.
pub(crate) fn evaluate<F: Float>(
    node: &Node<F>,
    order: usize,
    config: &EvalConfig,
) -> Result<usize, SeriesError> {
    if order > config.max_order {
        return Err(SeriesError::OrderLimit {
            order,
            max: config.max_order,
        });
    }
    sync(node);
    compute(node, order, config, 0)?;
    Ok(node.cache.borrow().coeffs.valid_count())
}

// ══════════════════════════════════════════════
//  Staleness
// ══════════════════════════════════════════════

fn operand_nodes<F: Float>(kind: &NodeKind<F>) -> [Option<&Node<F>>; 2] {
    fn series<F: Float>(op: &Operand<F>) -> Option<&Node<F>> {
        match op {
            Operand::Series(v) => Some(&*v.node),
            Operand::Scalar(_) => None,
        }
    }
    match kind {
        NodeKind::Constant(_) | NodeKind::Variable => [None, None],
        NodeKind::Unary(_, a) | NodeKind::CosPartner(a) => [Some(&*a.node), None],
        NodeKind::Binary(_, lhs, rhs) => [series(lhs), series(rhs)],
    }
}

fn is_leaf<F: Float>(node: &Node<F>) -> bool {
    matches!(node.kind, NodeKind::Constant(_) | NodeKind::Variable)
}

/// Discard every cache in the graph below `root` that was built from an
/// operand generation that no longer exists.
///
/// Iterative post-order walk; each node is checked at most once per seed
/// clock value, so shared subgraphs cost nothing on revisits.
pub(crate) fn sync<F: Float>(root: &Node<F>) {
    let clock = seed_clock();
    let mut stack: Vec<(&Node<F>, bool)> = vec![(root, false)];
    while let Some((node, expanded)) = stack.pop() {
        if is_leaf(node) || node.cache.borrow().checked_at == clock {
            continue;
        }
        let operands = operand_nodes(&node.kind);
        if !expanded {
            stack.push((node, true));
            stack.extend(operands.into_iter().flatten().map(|n| (n, false)));
            continue;
        }
        let gens = operands.map(|n| n.map_or(0, Node::generation));
        let mut cache = node.cache.borrow_mut();
        if cache.operand_gens != gens {
            if cache.coeffs.valid_count() > 0 {
                debug!(
                    op = node.kind.name(),
                    discarded = cache.coeffs.valid_count(),
                    "operand changed; discarding cached coefficients"
                );
                cache.clear();
            }
            cache.operand_gens = gens;
        }
        cache.checked_at = clock;
    }
}

// ══════════════════════════════════════════════
//  Computation
// ══════════════════════════════════════════════

/// Borrowed coefficients of one operand.
#[derive(Clone, Copy)]
enum ArgView<'a, F: Float> {
    Series(&'a [F]),
    Scalar(F),
}

impl<F: Float> ArgView<'_, F> {
    #[inline]
    fn at(&self, k: usize) -> F {
        match self {
            ArgView::Series(a) => a[k],
            ArgView::Scalar(x) => scalar_at(*x, k),
        }
    }
}

/// Keeps an operand's cache borrowed while its coefficients are read.
enum OperandGuard<'a, F: Float> {
    Series(Ref<'a, NodeCache<F>>),
    Scalar(F),
}

impl<'a, F: Float> OperandGuard<'a, F> {
    fn new(op: &'a Operand<F>) -> Self {
        match op {
            Operand::Series(v) => OperandGuard::Series(v.node.cache.borrow()),
            Operand::Scalar(x) => OperandGuard::Scalar(*x),
        }
    }

    fn view(&self) -> ArgView<'_, F> {
        match self {
            OperandGuard::Series(cache) => ArgView::Series(cache.coeffs.as_slice()),
            OperandGuard::Scalar(x) => ArgView::Scalar(*x),
        }
    }
}

fn compute<F: Float>(
    node: &Node<F>,
    order: usize,
    config: &EvalConfig,
    depth: usize,
) -> Result<(), SeriesError> {
    if node.cache.borrow().coeffs.is_valid(order) {
        return Ok(());
    }
    if depth > config.max_depth {
        return Err(SeriesError::DepthLimit {
            max: config.max_depth,
        });
    }

    match &node.kind {
        NodeKind::Constant(_) => {
            node.cache.borrow_mut().coeffs.fill_zeros_to(order);
            Ok(())
        }
        NodeKind::Variable => {
            let mut cache = node.cache.borrow_mut();
            // Unseeded orders above a seeded point are zero.
            if cache.coeffs.valid_count() == 0 {
                return Err(SeriesError::OrderNotComputed {
                    order: 0,
                    valid_count: 0,
                });
            }
            cache.coeffs.fill_zeros_to(order);
            Ok(())
        }
        NodeKind::Unary(op, a) => {
            compute(&a.node, order, config, depth + 1)?;
            let a_cache = a.node.cache.borrow();
            let mut cache = node.cache.borrow_mut();
            advance_unary(*op, a_cache.coeffs.as_slice(), &mut cache, order)
        }
        NodeKind::CosPartner(sin) => {
            compute(&sin.node, order, config, depth + 1)?;
            let sin_cache = sin.node.cache.borrow();
            let partner = sin_cache.aux.first().map_or(&[][..], Vec::as_slice);
            let mut cache = node.cache.borrow_mut();
            for k in cache.coeffs.valid_count()..=order {
                let value = partner
                    .get(k)
                    .copied()
                    .ok_or(SeriesError::OrderNotComputed {
                        order: k,
                        valid_count: partner.len(),
                    })?;
                cache.coeffs.push(value);
            }
            Ok(())
        }
        NodeKind::Binary(op, lhs, rhs) => {
            for operand in [lhs, rhs] {
                if let Operand::Series(v) = operand {
                    compute(&v.node, order, config, depth + 1)?;
                }
            }
            let lhs_guard = OperandGuard::new(lhs);
            let rhs_guard = OperandGuard::new(rhs);
            let mut cache = node.cache.borrow_mut();
            advance_binary(*op, lhs_guard.view(), rhs_guard.view(), &mut cache, order)
        }
    }
}

fn report(op: &'static str, err: SeriesError) -> SeriesError {
    warn!(op, error = %err, "series evaluation failed");
    err
}

fn prepare_aux<F: Float>(aux: &mut Vec<Vec<F>>, count: usize) {
    if aux.len() != count {
        aux.clear();
        aux.resize_with(count, Vec::new);
    }
}

// ── Unary ──

fn advance_unary<F: Float>(
    op: UnaryOp,
    a: &[F],
    cache: &mut NodeCache<F>,
    order: usize,
) -> Result<(), SeriesError> {
    let NodeCache { coeffs, aux, .. } = cache;
    prepare_aux(aux, op.aux_count());
    for k in coeffs.valid_count()..=order {
        unary_step(op, a, coeffs, aux, k).map_err(|e| report(op.name(), e))?;
        trace!(op = op.name(), order = k, "advanced series");
    }
    Ok(())
}

fn unary_step<F: Float>(
    op: UnaryOp,
    a: &[F],
    coeffs: &mut CoeffStore<F>,
    aux: &mut [Vec<F>],
    k: usize,
) -> Result<(), SeriesError> {
    let a0 = a[0];
    let c = coeffs.as_slice();
    let value = match op {
        UnaryOp::Neg => -a[k],
        UnaryOp::Identity => a[k],
        UnaryOp::Square => sqr_at(a, k),
        UnaryOp::Sqrt => {
            if k == 0 {
                if a0 < F::zero() {
                    return Err(SeriesError::domain("sqrt", a0));
                }
                a0.sqrt()
            } else {
                if c[0] == F::zero() {
                    return Err(SeriesError::singular("sqrt", k));
                }
                sqrt_at(a[k], c, k)
            }
        }
        UnaryOp::Exp => {
            if k == 0 {
                a0.exp()
            } else {
                exp_at(a, c, k)
            }
        }
        UnaryOp::Ln => {
            if k == 0 {
                if a0 <= F::zero() {
                    return Err(SeriesError::domain("ln", a0));
                }
                a0.ln()
            } else {
                quotient_integral_at(a[k], a, c, k)
            }
        }
        UnaryOp::Sin | UnaryOp::Cos => {
            // The partner series lives in aux[0].
            let (s_k, co_k) = if k == 0 {
                a0.sin_cos()
            } else if op == UnaryOp::Sin {
                sin_cos_at(a, c, &aux[0], k)
            } else {
                sin_cos_at(a, &aux[0], c, k)
            };
            if op == UnaryOp::Sin {
                aux[0].push(co_k);
                s_k
            } else {
                aux[0].push(s_k);
                co_k
            }
        }
        UnaryOp::Tan => {
            let t_k = if k == 0 {
                a0.tan()
            } else {
                tan_at(a, &aux[0], k)
            };
            coeffs.push(t_k);
            // aux[0] = 1 + tan²
            let sec2_k = sqr_at(coeffs.as_slice(), k) + scalar_at(F::one(), k);
            aux[0].push(sec2_k);
            return Ok(());
        }
        UnaryOp::Asin | UnaryOp::Acos => {
            let name = op.name();
            // aux[0] = sqrt(1 - a²)
            if k == 0 {
                if a0.abs() > F::one() {
                    return Err(SeriesError::domain(name, a0));
                }
                aux[0].push((F::one() - a0 * a0).sqrt());
                if op == UnaryOp::Asin {
                    a0.asin()
                } else {
                    a0.acos()
                }
            } else {
                if aux[0][0] == F::zero() {
                    return Err(SeriesError::singular(name, k));
                }
                let r_k = sqrt_at(-sqr_at(a, k), &aux[0], k);
                aux[0].push(r_k);
                let a_k = if op == UnaryOp::Asin { a[k] } else { -a[k] };
                quotient_integral_at(a_k, &aux[0], c, k)
            }
        }
        UnaryOp::Atan => {
            // aux[0] = 1 + a²
            aux[0].push(sqr_at(a, k) + scalar_at(F::one(), k));
            if k == 0 {
                a0.atan()
            } else {
                quotient_integral_at(a[k], &aux[0], c, k)
            }
        }
    };
    coeffs.push(value);
    Ok(())
}

// ── Binary ──

/// How a `pow` node propagates its coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PowPlan<F: Float> {
    /// Series base, non-negative integer exponent: repeated squaring.
    Natural(u32),
    /// Series base, other scalar exponent: power recurrence.
    Real(F),
    /// Series exponent: `exp(b * ln a)`.
    LogExp,
    /// Scalar base, series exponent: `exp(ln(s) * b)`.
    ScalarBase(F),
    /// Both scalar.
    Constant(F, F),
}

impl<F: Float> PowPlan<F> {
    fn of(lhs: ArgView<'_, F>, rhs: ArgView<'_, F>) -> Self {
        match (lhs, rhs) {
            (ArgView::Series(_), ArgView::Scalar(p)) => match p.to_u32() {
                Some(n) if p.is_natural() => PowPlan::Natural(n),
                _ => PowPlan::Real(p),
            },
            (ArgView::Series(_), ArgView::Series(_)) => PowPlan::LogExp,
            (ArgView::Scalar(s), ArgView::Series(_)) => PowPlan::ScalarBase(s),
            (ArgView::Scalar(x), ArgView::Scalar(y)) => PowPlan::Constant(x, y),
        }
    }

    fn aux_count(self) -> usize {
        match self {
            PowPlan::Natural(n) if n >= 2 => {
                // squares a^2, a^4, ... plus one partial product per extra set bit
                let high_bit = (u32::BITS - 1 - n.leading_zeros()) as usize;
                high_bit + n.count_ones() as usize - 1
            }
            PowPlan::LogExp => 2,
            PowPlan::ScalarBase(_) => 1,
            _ => 0,
        }
    }
}

fn advance_binary<F: Float>(
    op: BinaryOp,
    lhs: ArgView<'_, F>,
    rhs: ArgView<'_, F>,
    cache: &mut NodeCache<F>,
    order: usize,
) -> Result<(), SeriesError> {
    let NodeCache { coeffs, aux, .. } = cache;
    let plan = PowPlan::of(lhs, rhs);
    if op == BinaryOp::Pow {
        prepare_aux(aux, plan.aux_count());
    }
    for k in coeffs.valid_count()..=order {
        let result = if op == BinaryOp::Pow {
            pow_step(plan, lhs, rhs, coeffs, aux, k)
        } else {
            arith_step(op, lhs, rhs, coeffs, k)
        };
        result.map_err(|e| report(op.name(), e))?;
        trace!(op = op.name(), order = k, "advanced series");
    }
    Ok(())
}

fn arith_step<F: Float>(
    op: BinaryOp,
    lhs: ArgView<'_, F>,
    rhs: ArgView<'_, F>,
    coeffs: &mut CoeffStore<F>,
    k: usize,
) -> Result<(), SeriesError> {
    let value = match op {
        BinaryOp::Add => lhs.at(k) + rhs.at(k),
        BinaryOp::Sub => lhs.at(k) - rhs.at(k),
        BinaryOp::Mul => match (lhs, rhs) {
            (ArgView::Series(a), ArgView::Series(b)) => mul_at(a, b, k),
            (ArgView::Series(a), ArgView::Scalar(y)) | (ArgView::Scalar(y), ArgView::Series(a)) => {
                a[k] * y
            }
            (ArgView::Scalar(x), ArgView::Scalar(y)) => scalar_at(x * y, k),
        },
        BinaryOp::Div => match rhs {
            ArgView::Series(b) => {
                if b[0] == F::zero() {
                    return Err(SeriesError::singular("div", k));
                }
                div_at(lhs.at(k), b, coeffs.as_slice(), k)
            }
            ArgView::Scalar(y) => {
                if y == F::zero() {
                    return Err(SeriesError::singular("div", k));
                }
                lhs.at(k) / y
            }
        },
        BinaryOp::Pow => unreachable!("pow is advanced by pow_step"),
    };
    coeffs.push(value);
    Ok(())
}

/// `a^(2^bit)` within the repeated-squaring ladder.
fn ladder<'s, F>(a: &'s [F], aux: &'s [Vec<F>], bit: usize) -> &'s [F] {
    if bit == 0 {
        a
    } else {
        &aux[bit - 1]
    }
}

fn pow_step<F: Float>(
    plan: PowPlan<F>,
    lhs: ArgView<'_, F>,
    rhs: ArgView<'_, F>,
    coeffs: &mut CoeffStore<F>,
    aux: &mut [Vec<F>],
    k: usize,
) -> Result<(), SeriesError> {
    let c = coeffs.as_slice();
    let value = match (plan, lhs, rhs) {
        (PowPlan::Natural(0), _, _) => scalar_at(F::one(), k),
        (PowPlan::Natural(1), ArgView::Series(a), _) => a[k],
        (PowPlan::Natural(n), ArgView::Series(a), _) => {
            // aux[0..high] hold a^2, a^4, ..., aux[high..] the partial products.
            let high = (u32::BITS - 1 - n.leading_zeros()) as usize;
            for bit in 1..=high {
                let v = sqr_at(ladder(a, aux, bit - 1), k);
                aux[bit - 1].push(v);
            }
            let mut bits = (0..=high).filter(|&b| (n >> b) & 1 == 1);
            let first = bits.next().unwrap_or(high);
            let mut acc: Option<usize> = None;
            let mut slot = high;
            for bit in bits {
                let v = {
                    let partial: &[F] = match acc {
                        Some(i) => &aux[i],
                        None => ladder(a, aux, first),
                    };
                    mul_at(partial, ladder(a, aux, bit), k)
                };
                aux[slot].push(v);
                acc = Some(slot);
                slot += 1;
            }
            match acc {
                Some(i) => aux[i][k],
                None => ladder(a, aux, first)[k],
            }
        }
        (PowPlan::Real(p), ArgView::Series(a), _) => {
            let a0 = a[0];
            if k == 0 {
                if a0 < F::zero() && p.fract() != F::zero() {
                    return Err(SeriesError::domain("pow", a0));
                }
                if a0 == F::zero() && p < F::zero() {
                    return Err(SeriesError::singular("pow", k));
                }
                a0.powf(p)
            } else {
                if a0 == F::zero() {
                    return Err(SeriesError::singular("pow", k));
                }
                powf_at(a, p, c, k)
            }
        }
        (PowPlan::LogExp, ArgView::Series(a), ArgView::Series(b)) => {
            // aux[0] = ln(a), aux[1] = b * ln(a)
            let a0 = a[0];
            if k == 0 {
                check_log_base(a0)?;
                aux[0].push(a0.ln());
                aux[1].push(b[0] * aux[0][0]);
                a0.powf(b[0])
            } else {
                let l_k = quotient_integral_at(a[k], a, &aux[0], k);
                aux[0].push(l_k);
                let m_k = mul_at(b, &aux[0], k);
                aux[1].push(m_k);
                exp_at(&aux[1], c, k)
            }
        }
        (PowPlan::ScalarBase(s), _, ArgView::Series(b)) => {
            // aux[0] = ln(s) * b
            if k == 0 {
                check_log_base(s)?;
            }
            aux[0].push(s.ln() * b[k]);
            if k == 0 {
                s.powf(b[0])
            } else {
                exp_at(&aux[0], c, k)
            }
        }
        (PowPlan::Constant(x, y), _, _) => scalar_at(x.powf(y), k),
        _ => unreachable!("pow plan does not match its operands"),
    };
    coeffs.push(value);
    Ok(())
}

fn check_log_base<F: Float>(base: F) -> Result<(), SeriesError> {
    if base < F::zero() {
        Err(SeriesError::domain("pow", base))
    } else if base == F::zero() {
        Err(SeriesError::singular("pow", 0))
    } else {
        Ok(())
    }
}
