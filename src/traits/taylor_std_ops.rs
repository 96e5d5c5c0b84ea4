//! `std::ops` implementations for `TaylorVar<F>`.
//!
//! Every operator records a node; nothing is evaluated here. Scalars stay
//! bare operands instead of being lifted to constant nodes.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::float::Float;
use crate::node::{BinaryOp, Operand, UnaryOp};
use crate::taylor_var::TaylorVar;

// ══════════════════════════════════════════════
//  TaylorVar<F> ↔ TaylorVar<F>
// ══════════════════════════════════════════════

macro_rules! impl_series_binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<F: Float> $trait for TaylorVar<F> {
            type Output = TaylorVar<F>;
            #[inline]
            fn $method(self, rhs: TaylorVar<F>) -> TaylorVar<F> {
                TaylorVar::binary($op, self, rhs)
            }
        }

        impl<F: Float> $trait<&TaylorVar<F>> for TaylorVar<F> {
            type Output = TaylorVar<F>;
            #[inline]
            fn $method(self, rhs: &TaylorVar<F>) -> TaylorVar<F> {
                TaylorVar::binary($op, self, rhs)
            }
        }

        impl<F: Float> $trait<TaylorVar<F>> for &TaylorVar<F> {
            type Output = TaylorVar<F>;
            #[inline]
            fn $method(self, rhs: TaylorVar<F>) -> TaylorVar<F> {
                TaylorVar::binary($op, self, rhs)
            }
        }

        impl<F: Float> $trait<&TaylorVar<F>> for &TaylorVar<F> {
            type Output = TaylorVar<F>;
            #[inline]
            fn $method(self, rhs: &TaylorVar<F>) -> TaylorVar<F> {
                TaylorVar::binary($op, self, rhs)
            }
        }
    };
}

impl_series_binop!(Add, add, BinaryOp::Add);
impl_series_binop!(Sub, sub, BinaryOp::Sub);
impl_series_binop!(Mul, mul, BinaryOp::Mul);
impl_series_binop!(Div, div, BinaryOp::Div);

impl<F: Float> Neg for TaylorVar<F> {
    type Output = TaylorVar<F>;
    #[inline]
    fn neg(self) -> TaylorVar<F> {
        self.unary(UnaryOp::Neg)
    }
}

impl<F: Float> Neg for &TaylorVar<F> {
    type Output = TaylorVar<F>;
    #[inline]
    fn neg(self) -> TaylorVar<F> {
        self.unary(UnaryOp::Neg)
    }
}

// ══════════════════════════════════════════════
//  Mixed ops: TaylorVar<F> with primitive floats
// ══════════════════════════════════════════════

macro_rules! impl_scalar_binop {
    ($f:ty, $trait:ident, $method:ident, $op:expr) => {
        impl $trait<$f> for TaylorVar<$f> {
            type Output = TaylorVar<$f>;
            #[inline]
            fn $method(self, rhs: $f) -> TaylorVar<$f> {
                TaylorVar::binary($op, self, Operand::Scalar(rhs))
            }
        }

        impl $trait<$f> for &TaylorVar<$f> {
            type Output = TaylorVar<$f>;
            #[inline]
            fn $method(self, rhs: $f) -> TaylorVar<$f> {
                TaylorVar::binary($op, self, Operand::Scalar(rhs))
            }
        }

        impl $trait<TaylorVar<$f>> for $f {
            type Output = TaylorVar<$f>;
            #[inline]
            fn $method(self, rhs: TaylorVar<$f>) -> TaylorVar<$f> {
                TaylorVar::binary($op, Operand::Scalar(self), rhs)
            }
        }

        impl $trait<&TaylorVar<$f>> for $f {
            type Output = TaylorVar<$f>;
            #[inline]
            fn $method(self, rhs: &TaylorVar<$f>) -> TaylorVar<$f> {
                TaylorVar::binary($op, Operand::Scalar(self), rhs)
            }
        }
    };
}

macro_rules! impl_taylor_scalar_ops {
    ($f:ty) => {
        impl_scalar_binop!($f, Add, add, BinaryOp::Add);
        impl_scalar_binop!($f, Sub, sub, BinaryOp::Sub);
        impl_scalar_binop!($f, Mul, mul, BinaryOp::Mul);
        impl_scalar_binop!($f, Div, div, BinaryOp::Div);
    };
}

impl_taylor_scalar_ops!(f32);
impl_taylor_scalar_ops!(f64);
