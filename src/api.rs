use crate::error::SeriesError;
use crate::float::Float;
use crate::taylor_var::TaylorVar;

/// Taylor coefficients `c[0..=order]` of `f` expanded about `x0`.
///
/// ```
/// let c = lazytaylor::taylor_coefficients(|x| x.exp(), 0.0_f64, 3).unwrap();
/// assert!((c[3] - 1.0 / 6.0).abs() < 1e-12);
/// ```
pub fn taylor_coefficients<F: Float>(
    f: impl FnOnce(&TaylorVar<F>) -> TaylorVar<F>,
    x0: F,
    order: usize,
) -> Result<Vec<F>, SeriesError> {
    let x = TaylorVar::variable(x0);
    f(&x).coefficients(order)
}

/// Derivatives `f(x0), f'(x0), ..., f^(order)(x0)`.
///
/// ```
/// let d = lazytaylor::derivatives(|x| x * x * x, 2.0, 3).unwrap();
/// assert_eq!(d, vec![8.0, 12.0, 12.0, 6.0]);
/// ```
pub fn derivatives<F: Float>(
    f: impl FnOnce(&TaylorVar<F>) -> TaylorVar<F>,
    x0: F,
    order: usize,
) -> Result<Vec<F>, SeriesError> {
    let x = TaylorVar::variable(x0);
    f(&x).derivatives(order)
}

/// An expression recorded once and re-expanded at many points.
///
/// Each expansion resets and re-seeds the input variable; every node of the
/// recorded graph is then recomputed on demand, without rebuilding the graph.
#[derive(Clone, Debug)]
pub struct Expansion<F: Float> {
    input: TaylorVar<F>,
    output: TaylorVar<F>,
}

impl<F: Float> Expansion<F> {
    /// Record `f` applied to a fresh variable seeded at `x0`.
    pub fn record(f: impl FnOnce(&TaylorVar<F>) -> TaylorVar<F>, x0: F) -> Self {
        let input = TaylorVar::variable(x0);
        let output = f(&input);
        Expansion { input, output }
    }

    /// The input variable.
    pub fn input(&self) -> &TaylorVar<F> {
        &self.input
    }

    /// The recorded output series.
    pub fn output(&self) -> &TaylorVar<F> {
        &self.output
    }

    /// Re-seed the input with `[x0, direction]`.
    pub fn seed(&self, x0: F, direction: F) -> Result<(), SeriesError> {
        self.input.reset();
        self.input.set_coefficient(0, x0)?;
        self.input.set_coefficient(1, direction)
    }

    /// Taylor coefficients `0..=order` about `x0`.
    pub fn coefficients_at(&self, x0: F, order: usize) -> Result<Vec<F>, SeriesError> {
        self.seed(x0, F::one())?;
        self.output.coefficients(order)
    }

    /// Derivatives `0..=order` at `x0`.
    pub fn derivatives_at(&self, x0: F, order: usize) -> Result<Vec<F>, SeriesError> {
        self.seed(x0, F::one())?;
        self.output.derivatives(order)
    }
}
