//! Growable coefficient storage with a validity watermark.
//!
//! Convention: `c[k] = f^(k)(t₀) / k!` (scaled Taylor coefficients). Only
//! the first `valid` entries are meaningful; storage past the watermark is
//! kept allocated so that reseeding a node does not reallocate.

use crate::error::SeriesError;
use crate::Float;

/// Ordered Taylor coefficients `c[0..valid]`.
#[derive(Clone, Debug, Default)]
pub struct CoeffStore<F: Float> {
    data: Vec<F>,
    valid: usize,
}

impl<F: Float> CoeffStore<F> {
    /// Empty store: no order is valid.
    pub fn new() -> Self {
        CoeffStore {
            data: Vec::new(),
            valid: 0,
        }
    }

    /// Store whose coefficients `0..coeffs.len()` are all valid.
    pub fn from_slice(coeffs: &[F]) -> Self {
        CoeffStore {
            data: coeffs.to_vec(),
            valid: coeffs.len(),
        }
    }

    /// Number of valid coefficients (orders `0..valid_count()`).
    #[inline]
    pub fn valid_count(&self) -> usize {
        self.valid
    }

    /// Highest valid order, or `None` when nothing is valid.
    #[inline]
    pub fn highest_valid_order(&self) -> Option<usize> {
        self.valid.checked_sub(1)
    }

    /// Whether `order` has been computed.
    #[inline]
    pub fn is_valid(&self, order: usize) -> bool {
        order < self.valid
    }

    /// Read coefficient `order`.
    #[inline]
    pub fn get(&self, order: usize) -> Result<F, SeriesError> {
        if order < self.valid {
            Ok(self.data[order])
        } else {
            Err(SeriesError::OrderNotComputed {
                order,
                valid_count: self.valid,
            })
        }
    }

    /// The valid prefix as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[F] {
        &self.data[..self.valid]
    }

    /// Append the coefficient for order `valid_count()`.
    ///
    /// This is the only way a derived series grows: strictly one order at a time.
    #[inline]
    pub fn push(&mut self, value: F) {
        if self.valid < self.data.len() {
            self.data[self.valid] = value;
        } else {
            self.data.push(value);
        }
        self.valid += 1;
    }

    /// Write coefficient `order` directly, in any sequence.
    ///
    /// Used for variable seeding. Orders skipped over are filled with zero,
    /// and the watermark advances to the highest order ever written.
    pub fn seed(&mut self, order: usize, value: F) {
        if order >= self.valid {
            self.fill_zeros_to(order);
        }
        self.data[order] = value;
    }

    /// Extend the valid prefix with zero coefficients up to and including `order`.
    pub fn fill_zeros_to(&mut self, order: usize) {
        while self.valid <= order {
            self.push(F::zero());
        }
    }

    /// Forget every coefficient, keeping the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.valid = 0;
    }
}
