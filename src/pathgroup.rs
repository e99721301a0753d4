//! The outer exploration loop (spec §4.6 "PathGroup").
//!
//! A `PathGroup` owns every state reachable so far, bucketed by outcome:
//! `active` ones are still being stepped, `unsat` ones hit an infeasible
//! path (including the `avoid`-set short-circuit below), `unlocked` ones
//! reached the win condition, and `symbolic` ones have a non-constant PC
//! the engine declines to fork over (spec Non-goals).

use rand::Rng;

use crate::consts::ACTIVE_FANOUT_THRESHOLD;
use crate::error::ExecError;
use crate::state::State;

pub struct PathGroup<'ctx> {
    pub active: Vec<State<'ctx>>,
    pub unsat: Vec<State<'ctx>>,
    pub unlocked: Vec<State<'ctx>>,
    pub symbolic: Vec<State<'ctx>>,
    pub errored: Vec<(State<'ctx>, ExecError)>,
    avoid: Vec<u16>,
    fanout_threshold: usize,
}

impl<'ctx> PathGroup<'ctx> {
    pub fn new(initial: State<'ctx>, avoid: Vec<u16>) -> Self {
        Self::with_fanout_threshold(initial, avoid, ACTIVE_FANOUT_THRESHOLD)
    }

    pub fn with_fanout_threshold(initial: State<'ctx>, avoid: Vec<u16>, fanout_threshold: usize) -> Self {
        Self {
            active: vec![initial],
            unsat: Vec::new(),
            unlocked: Vec::new(),
            symbolic: Vec::new(),
            errored: Vec::new(),
            avoid,
            fanout_threshold,
        }
    }

    /// Index into `active` to step next: above the fanout threshold prefer
    /// the deepest state (max `ticks`, depth-first), at or below it prefer
    /// the shallowest (min `ticks`, breadth-first), ties broken uniformly
    /// at random (spec §4.6).
    fn select_index(&self) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }
        let prefer_deepest = self.active.len() > self.fanout_threshold;
        let extreme = if prefer_deepest {
            self.active.iter().map(|s| s.ticks).max()
        } else {
            self.active.iter().map(|s| s.ticks).min()
        }?;
        let candidates: Vec<usize> = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, s)| s.ticks == extreme)
            .map(|(i, _)| i)
            .collect();
        let pick = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[pick])
    }

    /// Pop one active state, step it, and bucket every successor.
    pub fn step(&mut self) -> Result<(), ExecError> {
        let Some(idx) = self.select_index() else {
            return Ok(());
        };
        let mut state = self.active.remove(idx);

        if let Some(pc) = state.concrete_pc() {
            if self.avoid.contains(&pc) {
                tracing::debug!(target: "msp430_symex::pathgroup", pc, "hit avoid address; forcing unsat");
                state.path.make_unsat();
                self.unsat.push(state);
                return Ok(());
            }
        }

        match state.step() {
            Ok(successors) => {
                for succ in successors {
                    self.bucket(succ)?;
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: "msp430_symex::pathgroup", %err, "state errored during step");
                self.errored.push((state, err));
                Ok(())
            }
        }
    }

    fn bucket(&mut self, state: State<'ctx>) -> Result<(), ExecError> {
        if state.unlocked {
            self.unlocked.push(state);
            return Ok(());
        }
        if state.has_symbolic_ip() {
            self.symbolic.push(state);
            return Ok(());
        }
        if !state.path.is_sat()? {
            self.unsat.push(state);
            return Ok(());
        }
        self.active.push(state);
        Ok(())
    }

    /// Step until a state reaches `unlocked`, the active set dries up, or
    /// `max_steps` is spent (if given).
    pub fn step_until_unlocked(&mut self, max_steps: Option<u64>) -> Result<(), ExecError> {
        let mut steps = 0u64;
        while self.unlocked.is_empty() && !self.active.is_empty() {
            if max_steps.is_some_and(|limit| steps >= limit) {
                tracing::warn!(target: "msp430_symex::pathgroup", steps, "step budget exhausted before reaching unlock");
                break;
            }
            self.step()?;
            steps += 1;
        }
        Ok(())
    }

    /// Step until a state's PC goes symbolic, the active set dries up, or
    /// `max_steps` is spent.
    pub fn step_until_symbolic_ip(&mut self, max_steps: Option<u64>) -> Result<(), ExecError> {
        let mut steps = 0u64;
        while self.symbolic.is_empty() && self.unlocked.is_empty() && !self.active.is_empty() {
            if max_steps.is_some_and(|limit| steps >= limit) {
                tracing::warn!(target: "msp430_symex::pathgroup", steps, "step budget exhausted before a symbolic IP");
                break;
            }
            self.step()?;
            steps += 1;
        }
        Ok(())
    }
}
