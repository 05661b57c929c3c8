//! Graph transformer trait.

use crate::Result;
use crate::ir::IrGraph;
use crate::registry::RuleRegistry;

/// Trait for implementing graph transformers.
///
/// A pass rewrites the graph in place. Passes are registered with a pass
/// manager at an optimization level and run repeatedly until none of them
/// reports a change.
///
/// # Return Value
///
/// `run()` returns `Ok(true)` if the pass changed the graph and `Ok(false)`
/// otherwise, which is how the manager detects a fixed point.
///
/// # Example
///
/// ```ignore
/// struct DropIdentityPass;
///
/// impl Pass for DropIdentityPass {
///     fn name(&self) -> &str {
///         "drop_identity"
///     }
///
///     fn run(&self, graph: &mut IrGraph, rules: &RuleRegistry) -> Result<bool> {
///         let mut changed = false;
///         // Bypass Identity nodes...
///         Ok(changed)
///     }
/// }
/// ```
pub trait Pass: Send + Sync {
    /// Get the pass name (used for logging and duplicate detection).
    fn name(&self) -> &str;

    /// Run the pass on the given graph.
    ///
    /// # Arguments
    ///
    /// * `graph` - The IR graph to transform (mutable).
    /// * `rules` - Per-operator propagation rules.
    fn run(&self, graph: &mut IrGraph, rules: &RuleRegistry) -> Result<bool>;
}
