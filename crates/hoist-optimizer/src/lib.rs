//! Upstream slice and reshape propagation for tensor graphs.
//!
//! Moves `Gather`, `GatherND` and `Reshape` nodes above the operators
//! producing their data (MatMul, LayerNormalization, elementwise operators, ...) so the
//! expensive producers run on less data. Per-operator semantics come from a
//! `RuleRegistry` (see `hoist_ops::default_rule_registry`).
//!
//! # Example
//!
//! ```no_run
//! use hoist_core::IrGraph;
//! use hoist_optimizer::{OptimizerConfig, optimize};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut graph = IrGraph::new();
//! let report = optimize(&mut graph, &OptimizerConfig::default())?;
//! println!("converged after {} rounds", report.iterations);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod manager;
pub mod passes;

pub use config::OptimizerConfig;
pub use engine::{UpstreamActor, UpstreamEngine};
pub use manager::{ApplyReport, PassManager};
pub use passes::{CommonSubexpressionPass, UpstreamGatherPass, UpstreamReshapePass};

// Re-export commonly used types from hoist-core
pub use hoist_core::{Error, IrGraph, Pass, Result, RuleRegistry};

/// Optimize a graph with the built-in passes and rules.
///
/// Builds a `PassManager` from `config` and applies it at `config.level`
/// with `hoist_ops::default_rule_registry()`.
#[tracing::instrument(skip_all, fields(level = config.level))]
pub fn optimize(graph: &mut IrGraph, config: &OptimizerConfig) -> Result<ApplyReport> {
    let rules = hoist_ops::default_rule_registry();
    let manager = PassManager::from_config(config)?;
    let report = manager.apply(graph, config.level, &rules)?;

    tracing::info!(
        iterations = report.iterations,
        changed = report.changed,
        converged = report.converged,
        "optimization finished"
    );
    Ok(report)
}
