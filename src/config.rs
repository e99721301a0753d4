//! Engine configuration (spec §2 "config"): everything a CLI front-end or
//! test harness needs to gather before it can start a [`PathGroup`].

use z3::Context;

use crate::consts::ACTIVE_FANOUT_THRESHOLD;
use crate::memory::Memory;
use crate::pathgroup::PathGroup;
use crate::solver::PredicateCache;
use crate::state::State;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub entry: u16,
    pub avoid: Vec<u16>,
    pub enable_unsound_optimizations: bool,
    pub fanout_threshold: usize,
    pub step_budget: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry: 0,
            avoid: Vec::new(),
            enable_unsound_optimizations: cfg!(feature = "unsound-opt"),
            fanout_threshold: ACTIVE_FANOUT_THRESHOLD,
            step_budget: None,
        }
    }
}

impl EngineConfig {
    pub fn new(entry: u16) -> Self {
        Self { entry, ..Self::default() }
    }

    pub fn avoid(mut self, addresses: impl IntoIterator<Item = u16>) -> Self {
        self.avoid.extend(addresses);
        self
    }

    pub fn with_unsound_optimizations(mut self, enabled: bool) -> Self {
        self.enable_unsound_optimizations = enabled;
        self
    }

    pub fn with_fanout_threshold(mut self, threshold: usize) -> Self {
        self.fanout_threshold = threshold;
        self
    }

    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = Some(budget);
        self
    }

    /// Build the initial [`State`] from this configuration and wrap it in a
    /// fresh [`PathGroup`], ready to step.
    pub fn start<'ctx>(&self, ctx: &'ctx Context, memory: Memory<'ctx>) -> PathGroup<'ctx> {
        let cache = PredicateCache::new();
        let mut state = State::new(ctx, memory, self.entry, cache);
        state.enable_unsound_optimizations = self.enable_unsound_optimizations;
        tracing::debug!(
            target: "msp430_symex::config",
            entry = self.entry,
            avoid = ?self.avoid,
            unsound_opt = self.enable_unsound_optimizations,
            "starting path group"
        );
        PathGroup::with_fanout_threshold(state, self.avoid.clone(), self.fanout_threshold)
    }
}
