//! Solver configuration.

/// Tuning knobs for a `linea_solver::LinearSystem`.
///
/// The defaults suit interactive layout: pools start small and grow by
/// doubling, metrics are collected, and the pivot budget is derived from
/// the tableau size.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Variable slots reserved up front.
    pub initial_variable_capacity: usize,
    /// Row slots reserved up front.
    pub initial_row_capacity: usize,
    /// Hard cap on simplex iterations per optimization. `None` derives a
    /// budget from the current number of rows and variables.
    pub max_iterations: Option<usize>,
    /// Whether to update solver metrics.
    pub collect_metrics: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_variable_capacity: 64,
            initial_row_capacity: 32,
            max_iterations: None,
            collect_metrics: true,
        }
    }
}

impl SolverConfig {
    /// Set the number of variable slots reserved up front.
    pub fn with_variable_capacity(mut self, capacity: usize) -> Self {
        self.initial_variable_capacity = capacity;
        self
    }

    /// Set the number of row slots reserved up front.
    pub fn with_row_capacity(mut self, capacity: usize) -> Self {
        self.initial_row_capacity = capacity;
        self
    }

    /// Cap simplex iterations per optimization.
    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    /// Enable or disable metrics collection.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.collect_metrics = enabled;
        self
    }

    /// Iteration budget for a tableau of the given size.
    pub fn iteration_limit(&self, rows: usize, variables: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| {
            let size = rows.saturating_add(1).saturating_mul(variables.saturating_add(1));
            size.saturating_mul(2).max(256)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.initial_variable_capacity, 64);
        assert_eq!(config.max_iterations, None);
        assert!(config.collect_metrics);
    }

    #[test]
    fn test_iteration_limit() {
        let config = SolverConfig::default();
        assert_eq!(config.iteration_limit(0, 0), 256);
        assert_eq!(config.iteration_limit(20, 30), 21 * 31 * 2);

        let capped = config.with_max_iterations(5);
        assert_eq!(capped.iteration_limit(100, 100), 5);
    }

    #[test]
    fn test_builder_setters() {
        let config = SolverConfig::default()
            .with_variable_capacity(8)
            .with_row_capacity(4)
            .with_metrics(false);
        assert_eq!(config.initial_variable_capacity, 8);
        assert_eq!(config.initial_row_capacity, 4);
        assert!(!config.collect_metrics);
    }
}
