//! Errors raised while building, seeding or evaluating a series.

use thiserror::Error;

/// Errors that can occur while working with a [`TaylorVar`](crate::TaylorVar).
///
/// Every error is scoped to the call that triggered it: the faulting node
/// keeps the coefficients it had already validated, and unrelated nodes are
/// unaffected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SeriesError {
    /// A coefficient was read before it was evaluated.
    #[error("coefficient of order {order} not computed (valid orders: {valid_count})")]
    OrderNotComputed {
        /// Requested order.
        order: usize,
        /// Number of coefficients currently valid.
        valid_count: usize,
    },

    /// A recurrence would divide by a zero leading coefficient.
    #[error("singular expansion in `{op}` at order {order}: leading coefficient is zero")]
    SingularExpansion {
        /// Operation whose recurrence failed.
        op: &'static str,
        /// Order being computed when the division by zero was detected.
        order: usize,
    },

    /// The order-0 argument of an elementary function lies outside its real domain.
    #[error("`{op}` is undefined at {value}")]
    DomainError {
        /// Operation whose domain was violated.
        op: &'static str,
        /// Offending order-0 argument.
        value: f64,
    },

    /// The requested order exceeds the configured limit.
    #[error("requested order {order} exceeds the configured maximum {max}")]
    OrderLimit {
        /// Requested order.
        order: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The expression graph is deeper than the configured recursion limit.
    #[error("expression graph deeper than the configured maximum depth {max}")]
    DepthLimit {
        /// Configured maximum depth.
        max: usize,
    },

    /// Coefficients can only be written on a variable leaf.
    #[error("coefficients can only be seeded on a variable leaf")]
    NotALeaf,
}

impl SeriesError {
    pub(crate) fn domain<F: num_traits::ToPrimitive>(op: &'static str, value: F) -> Self {
        SeriesError::DomainError {
            op,
            value: value.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub(crate) fn singular(op: &'static str, order: usize) -> Self {
        SeriesError::SingularExpansion { op, order }
    }
}
