//! Demand-driven evaluation, caching and cache invalidation.

use approx::assert_relative_eq;
use lazytaylor::{EvalConfig, SeriesError, TaylorVar};

#[test]
fn building_computes_nothing() {
    let x = TaylorVar::variable(1.0);
    let y = x.exp() * x.sin();
    assert_eq!(y.valid_count(), 0);
    assert_eq!(y.highest_valid_order(), None);
    assert_eq!(
        y.coefficient(0),
        Err(SeriesError::OrderNotComputed {
            order: 0,
            valid_count: 0
        })
    );
    assert_eq!(y.to_string(), "<unevaluated mul>");
}

#[test]
fn evaluate_reports_count_and_is_idempotent() {
    let x = TaylorVar::variable(0.5);
    let y = x.cos();
    assert_eq!(y.evaluate(4), Ok(5));
    assert_eq!(y.highest_valid_order(), Some(4));
    // Asking for less keeps everything already valid.
    assert_eq!(y.evaluate(2), Ok(5));
    assert_eq!(y.evaluate(6), Ok(7));
    assert!(y.coefficient(6).is_ok());
    assert!(y.coefficient(7).is_err());
}

#[test]
fn operands_evaluated_on_demand() {
    let x = TaylorVar::variable(0.3);
    let s = x.sin();
    let y = s.exp();
    y.evaluate(5).unwrap();
    // The operand was advanced to the same order as the result.
    assert_eq!(s.valid_count(), 6);
    assert_relative_eq!(s.coefficient(1).unwrap(), 0.3f64.cos(), epsilon = 1e-14);
}

#[test]
fn shared_subexpression_is_one_node() {
    let x = TaylorVar::variable(0.8);
    let s = x.sin();
    let y = &s * &s + s.clone();
    y.evaluate(4).unwrap();
    assert_eq!(s.valid_count(), 5);

    let t = s.clone();
    assert!(TaylorVar::ptr_eq(&s, &t));
    assert_eq!(t.valid_count(), 5);
}

#[test]
fn deep_diamond_graph_stays_cheap() {
    // Each level uses the previous one twice: 2^60 paths, 60 nodes.
    let x = TaylorVar::variable(0.999);
    let mut y = x.clone();
    for _ in 0..60 {
        y = (&y * &y).sqrt();
    }
    let c = y.coefficients(3).unwrap();
    assert_relative_eq!(c[0], 0.999, epsilon = 1e-12);
    assert_relative_eq!(c[1], 1.0, epsilon = 1e-9);

    x.set_coefficient(0, 0.5).unwrap();
    assert_relative_eq!(y.value().unwrap(), 0.5, epsilon = 1e-12);
}

#[test]
fn leaf_seeding_out_of_sequence() {
    let x = TaylorVar::leaf(1.0);
    assert_eq!(x.valid_count(), 1);
    x.set_coefficient(3, 2.0).unwrap();
    assert_eq!(x.valid_count(), 4);
    assert_eq!(x.coefficient(1), Ok(0.0));
    assert_eq!(x.coefficient(3), Ok(2.0));
}

#[test]
fn leaf_without_direction_has_zero_derivatives() {
    let x = TaylorVar::leaf(3.0);
    let y = x.square();
    assert_eq!(y.coefficients(3).unwrap(), vec![9.0, 0.0, 0.0, 0.0]);
    x.set_coefficient(1, 1.0).unwrap();
    assert_eq!(y.coefficients(3).unwrap(), vec![9.0, 6.0, 1.0, 0.0]);
}

#[test]
fn reseeding_direction_rescales_coefficients() {
    let x = TaylorVar::variable(0.0);
    let y = x.exp();
    y.evaluate(4).unwrap();
    x.set_coefficient(1, 2.0).unwrap();
    // exp(2t): c[k] = 2^k / k!
    let c = y.coefficients(4).unwrap();
    let expected = [1.0, 2.0, 2.0, 4.0 / 3.0, 2.0 / 3.0];
    for k in 0..=4 {
        assert_relative_eq!(c[k], expected[k], epsilon = 1e-14);
    }
}

#[test]
fn reseeding_invalidates_non_forcing_reads() {
    let x = TaylorVar::variable(1.0);
    let y = x.exp();
    y.evaluate(2).unwrap();
    x.set_coefficient(0, 2.0).unwrap();
    // The cached coefficients were built from the old seed.
    assert_eq!(y.valid_count(), 0);
    assert!(y.coefficient(0).is_err());
    assert_relative_eq!(y.value().unwrap(), 2.0f64.exp(), epsilon = 1e-14);
}

#[test]
fn reset_variable_must_be_reseeded() {
    let x = TaylorVar::variable(1.0);
    let y = x.sin();
    y.evaluate(3).unwrap();
    x.reset();
    assert_eq!(x.valid_count(), 0);
    assert_eq!(
        y.evaluate(3),
        Err(SeriesError::OrderNotComputed {
            order: 0,
            valid_count: 0
        })
    );
    x.set_coefficient(0, 0.0).unwrap();
    x.set_coefficient(1, 1.0).unwrap();
    assert_relative_eq!(y.derivative(1).unwrap(), 1.0, epsilon = 1e-14);
}

#[test]
fn reset_derived_node_recomputes_same_values() {
    let x = TaylorVar::variable(0.4);
    let y = x.tan();
    let before = y.coefficients(5).unwrap();
    y.reset();
    assert_eq!(y.valid_count(), 0);
    // Operands keep their caches.
    assert_eq!(x.valid_count(), 6);
    assert_eq!(y.coefficients(5).unwrap(), before);
}

#[test]
fn reset_constant_is_noop() {
    let c = TaylorVar::constant(5.0);
    c.reset();
    assert_eq!(c.coefficient(0), Ok(5.0));
    assert_eq!(c.coefficient(9), Ok(0.0));
}

#[test]
fn seeding_requires_variable_leaf() {
    let x = TaylorVar::variable(1.0);
    assert_eq!(x.exp().set_coefficient(0, 1.0), Err(SeriesError::NotALeaf));
    assert_eq!(
        TaylorVar::constant(1.0).set_coefficient(1, 1.0),
        Err(SeriesError::NotALeaf)
    );
}

#[test]
fn order_limit_is_enforced() {
    let x = TaylorVar::variable(1.0);
    let config = EvalConfig::with_max_order(5);
    assert_eq!(
        x.exp().evaluate_with(10, &config),
        Err(SeriesError::OrderLimit { order: 10, max: 5 })
    );
    assert_eq!(x.exp().evaluate_with(5, &config), Ok(6));
}

#[test]
fn depth_limit_is_enforced() {
    let x = TaylorVar::variable(1.0);
    let mut y = x.clone();
    for _ in 0..50 {
        y = y.wrap();
    }
    let config = EvalConfig {
        max_order: 16,
        max_depth: 10,
    };
    assert_eq!(
        y.evaluate_with(2, &config),
        Err(SeriesError::DepthLimit { max: 10 })
    );
    assert_eq!(y.evaluate(2), Ok(3));
}

#[test]
fn very_deep_graph_fails_and_drops_cleanly() {
    let x = TaylorVar::variable(1.0);
    let mut y = x.clone();
    for _ in 0..200_000 {
        y = y.wrap();
    }
    assert_eq!(y.evaluate(1), Err(SeriesError::DepthLimit { max: 2048 }));
    drop(y);
    // The leaf outlives the chain built on top of it.
    assert_eq!(x.value(), Ok(1.0));
}

#[test]
fn deep_binary_graph_drops_cleanly() {
    let x = TaylorVar::variable(0.5);
    let mut y = x.exp();
    for i in 0..100_000 {
        y = if i % 2 == 0 { &y + &x } else { 1.0 * y };
    }
    drop(y);
    assert_eq!(x.value(), Ok(0.5));
}

#[test]
fn display_lists_valid_coefficients() {
    let x = TaylorVar::variable(2.0);
    let y = x.square();
    y.evaluate(2).unwrap();
    assert_eq!(y.to_string(), "4 + 4·t^1 + 1·t^2");
}
