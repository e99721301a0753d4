//! The path predicate and its satisfiability/model cache (spec §3 "Path").

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use z3::ast::Bool;
use z3::Context;

use crate::bv::and;
use crate::error::SolverError;
use crate::solver::{ConcreteModel, PredicateCache};

/// Ordered sequence of boolean constraints plus cached predicate/sat/model.
///
/// Clones share the constraint list (and the process-wide [`PredicateCache`])
/// until either side appends a new constraint, at which point that side
/// privately copies its list: the same `Rc`/`make_mut` discipline as
/// [`crate::memory::Memory`]. The cached predicate, sat verdict, and model
/// are inherited by a clone so a freshly-forked sibling can answer
/// `is_sat()` without re-solving until it adds something new.
pub struct Path<'ctx> {
    ctx: &'ctx Context,
    constraints: Rc<Vec<Bool<'ctx>>>,
    cache: PredicateCache,
    cached_predicate: RefCell<Option<Bool<'ctx>>>,
    cached_sat: Cell<Option<bool>>,
}

impl<'ctx> Clone for Path<'ctx> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx,
            constraints: Rc::clone(&self.constraints),
            cache: self.cache.clone(),
            cached_predicate: RefCell::new(self.cached_predicate.borrow().clone()),
            cached_sat: Cell::new(self.cached_sat.get()),
        }
    }
}

impl<'ctx> Path<'ctx> {
    /// A fresh, empty path sharing the given process-wide cache.
    pub fn new(ctx: &'ctx Context, cache: PredicateCache) -> Self {
        Self {
            ctx,
            constraints: Rc::new(Vec::new()),
            cache,
            cached_predicate: RefCell::new(None),
            cached_sat: Cell::new(None),
        }
    }

    pub fn ctx(&self) -> &'ctx Context {
        self.ctx
    }

    /// Append a constraint, invalidating the cached predicate/sat verdict.
    pub fn add(&mut self, condition: Bool<'ctx>) {
        Rc::make_mut(&mut self.constraints).push(condition);
        self.cached_predicate.replace(None);
        self.cached_sat.set(None);
    }

    /// Force this path unsatisfiable, regardless of prior state.
    pub fn make_unsat(&mut self) {
        self.add(Bool::from_bool(self.ctx, false));
    }

    /// The conjunction of all constraints, simplified and cached.
    pub fn predicate(&self) -> Bool<'ctx> {
        if let Some(p) = self.cached_predicate.borrow().as_ref() {
            return p.clone();
        }
        let conjunction = and(self.ctx, self.constraints.as_slice());
        let simplified = conjunction.simplify();
        *self.cached_predicate.borrow_mut() = Some(simplified.clone());
        simplified
    }

    /// Is this path feasible? Cached locally, and backed by the
    /// process-wide predicate cache so sibling paths reaching the same
    /// formula by different histories don't re-invoke the solver.
    pub fn is_sat(&self) -> Result<bool, SolverError> {
        if let Some(sat) = self.cached_sat.get() {
            return Ok(sat);
        }
        let predicate = self.predicate();
        let sat = self.cache.is_sat(self.ctx, &predicate)?;
        self.cached_sat.set(Some(sat));
        Ok(sat)
    }

    /// A satisfying model for this path's predicate, or `None` if unsat.
    /// Not cached across calls (see DESIGN.md): building one is rare
    /// (witness rendering, symbolic-PC resolution), so each call re-solves
    /// rather than keeping a `z3::Model` alive for the path's lifetime.
    pub fn model(&self) -> Result<Option<ConcreteModel<'ctx>>, SolverError> {
        if !self.is_sat()? {
            return Ok(None);
        }
        ConcreteModel::solve(self.ctx, &self.predicate())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}
