//! Lazy Taylor-mode automatic differentiation for scalar functions of one
//! real variable.
//!
//! Build an expression from [`TaylorVar`] handles with ordinary operators and
//! elementary functions; request coefficients or derivatives of any order
//! and only what is needed gets computed.
//!
//! ```
//! use lazytaylor::TaylorVar;
//!
//! let x = TaylorVar::variable(2.0);
//! let y = x.square();
//! assert_eq!(y.derivative(0).unwrap(), 4.0);
//! assert_eq!(y.derivative(1).unwrap(), 4.0);
//! assert_eq!(y.derivative(2).unwrap(), 2.0);
//! assert_eq!(y.derivative(3).unwrap(), 0.0);
//! ```

pub mod api;
pub mod coeffs;
pub mod config;
pub mod error;
mod eval;
pub mod float;
pub mod node;
pub mod taylor_ops;
pub mod taylor_var;
mod traits;

pub use api::{derivatives, taylor_coefficients, Expansion};
pub use config::EvalConfig;
pub use error::SeriesError;
pub use float::Float;
pub use node::{BinaryOp, Operand, UnaryOp};
pub use taylor_var::{scalar_powf, TaylorVar};

/// Type alias for lazily evaluated series over `f64`.
pub type TaylorVar64 = TaylorVar<f64>;
/// Type alias for lazily evaluated series over `f32`.
pub type TaylorVar32 = TaylorVar<f32>;
