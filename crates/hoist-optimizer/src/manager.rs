//! Pass manager: runs registered passes to a fixed point.

use std::collections::BTreeMap;

use hoist_core::{Error, IrGraph, Pass, Result, RuleRegistry};
use tracing::{debug, error, warn};

use crate::config::OptimizerConfig;
use crate::passes::{CommonSubexpressionPass, UpstreamGatherPass, UpstreamReshapePass};

/// Summary of one `PassManager::apply` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Number of rounds over the level's passes.
    pub iterations: usize,

    /// Whether any pass changed the graph.
    pub changed: bool,

    /// Whether the last round made no change.
    pub converged: bool,

    /// Number of rounds in which each pass changed the graph, by pass name.
    pub pass_changes: BTreeMap<String, usize>,
}

impl ApplyReport {
    /// Number of rounds in which `pass` changed the graph.
    pub fn changes(&self, pass: &str) -> usize {
        self.pass_changes.get(pass).copied().unwrap_or(0)
    }
}

/// Runs graph transformers registered at optimization levels.
///
/// Within a level, passes run in registration order. A round runs every pass
/// once; rounds repeat until a full round changes nothing or the iteration
/// cap is reached.
pub struct PassManager {
    /// Passes by optimization level, in registration order.
    levels: BTreeMap<u32, Vec<Box<dyn Pass>>>,

    /// Maximum number of rounds per `apply`.
    max_iterations: usize,

    /// Validate the graph after every pass. The result of `apply` is
    /// validated either way.
    validate_each_pass: bool,
}

impl PassManager {
    /// Create an empty manager.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            levels: BTreeMap::new(),
            max_iterations,
            validate_each_pass: true,
        }
    }

    /// Create a manager with the built-in passes enabled in `config`,
    /// registered at `config.level`.
    ///
    /// The built-in passes are, in order:
    /// - `UpstreamGatherPass`
    /// - `UpstreamReshapePass`
    /// - `CommonSubexpressionPass`
    pub fn from_config(config: &OptimizerConfig) -> Result<Self> {
        let mut manager = Self::new(config.max_iterations);
        manager.validate_each_pass = config.validate_each_pass;

        if config.enable_gather_propagation {
            manager.register(UpstreamGatherPass::new(), config.level)?;
        }
        if config.enable_reshape_propagation {
            manager.register(UpstreamReshapePass::new(), config.level)?;
        }
        if config.enable_cse {
            manager.register(CommonSubexpressionPass::new(), config.level)?;
        }

        Ok(manager)
    }

    /// Enable or disable validation after every pass.
    pub fn set_validate_each_pass(&mut self, enabled: bool) -> &mut Self {
        self.validate_each_pass = enabled;
        self
    }

    /// Register a pass at an optimization level.
    ///
    /// Fails if a pass with the same name is already registered at that level.
    pub fn register(&mut self, pass: impl Pass + 'static, level: u32) -> Result<()> {
        let passes = self.levels.entry(level).or_default();
        if passes.iter().any(|p| p.name() == pass.name()) {
            return Err(Error::Registration(format!(
                "Pass '{}' is already registered at level {}",
                pass.name(),
                level
            )));
        }
        passes.push(Box::new(pass));
        Ok(())
    }

    /// Names of the passes registered at `level`, in run order.
    pub fn pass_names(&self, level: u32) -> Vec<&str> {
        self.levels
            .get(&level)
            .map(|passes| passes.iter().map(|p| p.name()).collect())
            .unwrap_or_default()
    }

    /// Apply the passes registered at `level` until a fixed point.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pass` if a pass fails and `Error::InvalidGraph` if the
    /// graph is structurally broken after a pass, or at the end of the run
    /// when per-pass validation is off.
    #[tracing::instrument(skip_all, fields(level = level, num_nodes = graph.node_count()))]
    pub fn apply(
        &self,
        graph: &mut IrGraph,
        level: u32,
        rules: &RuleRegistry,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let Some(passes) = self.levels.get(&level).filter(|p| !p.is_empty()) else {
            report.converged = true;
            return Ok(report);
        };

        for iteration in 1..=self.max_iterations {
            report.iterations = iteration;
            let mut round_changed = false;

            for pass in passes {
                let _span = tracing::debug_span!("pass", name = pass.name(), iteration).entered();

                let changed = pass.run(graph, rules).map_err(|e| Error::Pass {
                    pass: pass.name().to_string(),
                    source: Box::new(e),
                })?;
                if self.validate_each_pass {
                    self.check(graph, &format!("after pass '{}'", pass.name()))?;
                }

                debug!(changed, num_nodes = graph.node_count(), "pass finished");
                if changed {
                    *report.pass_changes.entry(pass.name().to_string()).or_insert(0) += 1;
                    round_changed = true;
                }
            }

            report.changed |= round_changed;
            if !round_changed {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            warn!(
                max_iterations = self.max_iterations,
                "pass manager stopped before reaching a fixed point"
            );
        }
        if !self.validate_each_pass {
            let names: Vec<&str> = passes.iter().map(|p| p.name()).collect();
            self.check(
                graph,
                &format!("after level {} passes [{}]", level, names.join(", ")),
            )?;
        }
        Ok(report)
    }

    fn check(&self, graph: &IrGraph, context: &str) -> Result<()> {
        graph.validate().map_err(|e| {
            error!(context, error = %e, "graph is invalid");
            match e {
                Error::InvalidGraph(msg) => Error::InvalidGraph(format!("{}: {}", context, msg)),
                other => other,
            }
        })
    }
}
