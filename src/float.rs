use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

/// Marker trait for the coefficient type of a series (`f32`, `f64`).
///
/// Only primitive float types implement this. Series handles do not, since
/// a coefficient is always a plain fixed-precision number.
pub trait Float:
    NumFloat + FloatConst + FromPrimitive + Copy + Default + Debug + Display + 'static
{
    /// Convert an order index (or any small count) to `Self`.
    #[inline]
    fn from_order(k: usize) -> Self {
        // Every primitive float can represent a usize approximately.
        <Self as FromPrimitive>::from_usize(k).unwrap_or_else(Self::infinity)
    }

    /// Whether this value is a non-negative integer (exact, finite).
    #[inline]
    fn is_natural(self) -> bool {
        self.is_finite() && self >= Self::zero() && self.fract() == Self::zero()
    }
}

impl Float for f32 {}
impl Float for f64 {}
