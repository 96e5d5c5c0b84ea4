/// Limits applied while evaluating a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Highest order that may be requested (default: 1024).
    pub max_order: usize,
    /// Maximum recursion depth through the expression graph (default: 2048).
    ///
    /// Evaluation recurses once per graph level, so very deep graphs would
    /// otherwise exhaust the stack.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_order: 1024,
            max_depth: 2048,
        }
    }
}

impl EvalConfig {
    /// Config with the given order limit and the default depth limit.
    pub fn with_max_order(max_order: usize) -> Self {
        EvalConfig {
            max_order,
            ..EvalConfig::default()
        }
    }
}
