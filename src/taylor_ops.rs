//! Per-order Taylor coefficient recurrences.
//!
//! Convention: `c[k] = f^(k)(t₀) / k!` (scaled/normalized Taylor coefficients).
//! Every function computes a single coefficient `c[k]` of a result from the
//! operand coefficients `a[0..=k]` (and `b[0..=k]`) and the result's own
//! already-known coefficients `c[0..k]`. None of them involve `k!`, so
//! propagation never overflows a factorial.
//!
//! Slices are indexed directly; callers guarantee the required prefixes are
//! valid. Division by a zero leading coefficient is the caller's check.

use crate::Float;

// ══════════════════════════════════════════════
//  Arithmetic
// ══════════════════════════════════════════════

/// `(a * b)[k]`, the Cauchy product.
///
/// `c[k] = Σ_{j=0}^{k} a[j] * b[k-j]`
#[inline]
pub fn mul_at<F: Float>(a: &[F], b: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 0..=k {
        sum = sum + a[j] * b[k - j];
    }
    sum
}

/// `(a²)[k]`, folding the symmetric terms of the Cauchy product.
#[inline]
pub fn sqr_at<F: Float>(a: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 0..(k + 1) / 2 {
        sum = sum + a[j] * a[k - j];
    }
    sum = sum + sum;
    if k % 2 == 0 {
        sum = sum + a[k / 2] * a[k / 2];
    }
    sum
}

/// `(a / b)[k]` by recursive Taylor division, given `a[k]` only.
///
/// `c[k] = (a[k] - Σ_{j=1}^{k} b[j] * c[k-j]) / b[0]`
#[inline]
pub fn div_at<F: Float>(a_k: F, b: &[F], c: &[F], k: usize) -> F {
    let mut sum = a_k;
    for j in 1..=k {
        sum = sum - b[j] * c[k - j];
    }
    sum / b[0]
}

// ══════════════════════════════════════════════
//  Transcendentals (logarithmic derivative technique)
// ══════════════════════════════════════════════

/// `sqrt(a)[k]` for `k ≥ 1`, given `a[k]`.
///
/// `c[k] = (a[k] - Σ_{j=1}^{k-1} c[j] * c[k-j]) / (2 * c[0])`
#[inline]
pub fn sqrt_at<F: Float>(a_k: F, c: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 1..k {
        sum = sum + c[j] * c[k - j];
    }
    (a_k - sum) / (c[0] + c[0])
}

/// `exp(a)[k]` for `k ≥ 1`.
///
/// `c[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * c[k-j]`
#[inline]
pub fn exp_at<F: Float>(a: &[F], c: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 1..=k {
        sum = sum + F::from_order(j) * a[j] * c[k - j];
    }
    sum / F::from_order(k)
}

/// Coefficient `k ≥ 1` of a series `c` defined by `r * c' = a'`, given `a[k]`.
///
/// `c[k] = (a[k] - (1/k) * Σ_{j=1}^{k-1} j * c[j] * r[k-j]) / r[0]`
///
/// With `r = a` this is `ln(a)`; with `r = sqrt(1 - a²)` it is `asin(a)`
/// (and `acos(a)` for `-a[k]`); with `r = 1 + a²` it is `atan(a)`.
#[inline]
pub fn quotient_integral_at<F: Float>(a_k: F, r: &[F], c: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 1..k {
        sum = sum + F::from_order(j) * c[j] * r[k - j];
    }
    (a_k - sum / F::from_order(k)) / r[0]
}

/// `(sin(a)[k], cos(a)[k])` for `k ≥ 1` (coupled recurrence).
///
/// `s[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * co[k-j]`
/// `co[k] = -(1/k) * Σ_{j=1}^{k} j * a[j] * s[k-j]`
#[inline]
pub fn sin_cos_at<F: Float>(a: &[F], s: &[F], co: &[F], k: usize) -> (F, F) {
    let inv_k = F::one() / F::from_order(k);
    let mut sum_s = F::zero();
    let mut sum_c = F::zero();
    for j in 1..=k {
        let ja = F::from_order(j) * a[j];
        sum_s = sum_s + ja * co[k - j];
        sum_c = sum_c + ja * s[k - j];
    }
    (sum_s * inv_k, -sum_c * inv_k)
}

/// `tan(a)[k]` for `k ≥ 1`, via `c' = a' * (1 + c²)`.
///
/// `sec2` holds `1 + c²` through order `k - 1`; the caller extends it with
/// [`sqr_at`] once `c[k]` is known.
#[inline]
pub fn tan_at<F: Float>(a: &[F], sec2: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 1..=k {
        sum = sum + F::from_order(j) * a[j] * sec2[k - j];
    }
    sum / F::from_order(k)
}

/// `(a^p)[k]` for `k ≥ 1` and a real scalar exponent `p`, via `a * c' = p * a' * c`.
///
/// `c[k] = Σ_{j=0}^{k-1} (p*(k-j) - j) * a[k-j] * c[j] / (k * a[0])`
#[inline]
pub fn powf_at<F: Float>(a: &[F], p: F, c: &[F], k: usize) -> F {
    let mut sum = F::zero();
    for j in 0..k {
        let weight = p * F::from_order(k - j) - F::from_order(j);
        sum = sum + weight * a[k - j] * c[j];
    }
    sum / (F::from_order(k) * a[0])
}

/// Coefficient `k` of a constant series `[x, 0, 0, ...]`.
#[inline]
pub fn scalar_at<F: Float>(x: F, k: usize) -> F {
    if k == 0 {
        x
    } else {
        F::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Drive a per-order recurrence to fill a full coefficient vector.
    fn fill(n: usize, c0: f64, mut step: impl FnMut(&[f64], usize) -> f64) -> Vec<f64> {
        let mut c = vec![c0];
        for k in 1..n {
            let v = step(&c, k);
            c.push(v);
        }
        c
    }

    #[test]
    fn sqr_matches_mul() {
        let a = [1.5, -2.0, 0.25, 3.0, 0.5];
        for k in 0..a.len() {
            assert_relative_eq!(sqr_at(&a, k), mul_at(&a, &a, k), epsilon = 1e-14);
        }
    }

    #[test]
    fn geometric_series_by_division() {
        // 1 / (1 - t) = 1 + t + t² + ...
        let b = [1.0, -1.0, 0.0, 0.0, 0.0, 0.0];
        let c = fill(6, 1.0, |c, k| div_at(scalar_at(1.0, k), &b, c, k));
        for ck in c {
            assert_relative_eq!(ck, 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn exp_of_identity() {
        let a = [0.0, 1.0, 0.0, 0.0, 0.0];
        let c = fill(5, 1.0, |c, k| exp_at(&a, c, k));
        let expected = [1.0, 1.0, 0.5, 1.0 / 6.0, 1.0 / 24.0];
        for (ck, ek) in c.iter().zip(expected) {
            assert_relative_eq!(*ck, ek, epsilon = 1e-14);
        }
    }

    #[test]
    fn ln_one_plus_t() {
        let a = [1.0, 1.0, 0.0, 0.0, 0.0];
        let c = fill(5, 0.0, |c, k| quotient_integral_at(a[k], &a, c, k));
        let expected = [0.0, 1.0, -0.5, 1.0 / 3.0, -0.25];
        for (ck, ek) in c.iter().zip(expected) {
            assert_relative_eq!(*ck, ek, epsilon = 1e-14);
        }
    }

    #[test]
    fn sqrt_of_square_recovers_operand() {
        // (2 + t)² = 4 + 4t + t²
        let a = [4.0, 4.0, 1.0, 0.0, 0.0];
        let c = fill(5, 2.0, |c, k| sqrt_at(a[k], c, k));
        let expected = [2.0, 1.0, 0.0, 0.0, 0.0];
        for (ck, ek) in c.iter().zip(expected) {
            assert_relative_eq!(*ck, ek, epsilon = 1e-14);
        }
    }

    #[test]
    fn sin_cos_at_zero() {
        let a = [0.0, 1.0, 0.0, 0.0, 0.0];
        let mut s = vec![0.0];
        let mut co = vec![1.0];
        for k in 1..5 {
            let (sk, ck) = sin_cos_at(&a, &s, &co, k);
            s.push(sk);
            co.push(ck);
        }
        assert_relative_eq!(s[1], 1.0, epsilon = 1e-14);
        assert_relative_eq!(s[3], -1.0 / 6.0, epsilon = 1e-14);
        assert_relative_eq!(co[2], -0.5, epsilon = 1e-14);
        assert_relative_eq!(co[4], 1.0 / 24.0, epsilon = 1e-14);
    }

    #[test]
    fn powf_cubic() {
        // (1 + t)^3 = 1 + 3t + 3t² + t³
        let a = [1.0, 1.0, 0.0, 0.0, 0.0];
        let c = fill(5, 1.0, |c, k| powf_at(&a, 3.0, c, k));
        let expected = [1.0, 3.0, 3.0, 1.0, 0.0];
        for (ck, ek) in c.iter().zip(expected) {
            assert_relative_eq!(*ck, ek, epsilon = 1e-13);
        }
    }
}
