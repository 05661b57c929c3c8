//! Optimizer configuration.

/// Configuration for [`optimize`](crate::optimize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Maximum number of rounds over the registered passes.
    pub max_iterations: usize,
    /// Optimization level the default passes are registered at and applied with.
    pub level: u32,
    /// Move Gather and GatherND nodes upstream.
    pub enable_gather_propagation: bool,
    /// Move Reshape nodes upstream.
    pub enable_reshape_propagation: bool,
    /// Merge duplicated nodes after propagation.
    pub enable_cse: bool,
    /// Validate the graph structure after every pass.
    pub validate_each_pass: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            level: 1,
            enable_gather_propagation: true,
            enable_reshape_propagation: true,
            enable_cse: true,
            validate_each_pass: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_gather_propagation(mut self, enabled: bool) -> Self {
        self.enable_gather_propagation = enabled;
        self
    }

    pub fn with_reshape_propagation(mut self, enabled: bool) -> Self {
        self.enable_reshape_propagation = enabled;
        self
    }

    pub fn with_cse(mut self, enabled: bool) -> Self {
        self.enable_cse = enabled;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_each_pass = enabled;
        self
    }
}
