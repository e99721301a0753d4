//! The process-wide predicate→sat cache and model evaluation (spec §3, §5).
//!
//! The source keeps this as a module-level Python dict; per the design
//! notes, this crate makes the cache an explicit, lifecycle-owned object
//! (a [`PredicateCache`]) constructed once at the exploration root and
//! threaded through every [`crate::path::Path`] via a shared `Rc`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use z3::ast::{Ast, Bool};
use z3::{Context, SatResult as Z3SatResult, Solver};

use crate::bv::Bv;
use crate::error::SolverError;

/// Shared handle to the process-wide predicate cache. Cheap to clone;
/// clones refer to the same underlying table.
#[derive(Clone)]
pub struct PredicateCache {
    table: Rc<RefCell<HashMap<String, bool>>>,
}

impl Default for PredicateCache {
    fn default() -> Self {
        Self {
            table: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl PredicateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide satisfiability of `predicate`, consulting and then updating
    /// the cache keyed by the predicate's canonical (simplified) string
    /// form. Correctness depends on Z3's `simplify` being deterministic,
    /// as spec §5 notes.
    pub fn is_sat<'ctx>(&self, ctx: &'ctx Context, predicate: &Bool<'ctx>) -> Result<bool, SolverError> {
        let key = predicate.to_string();
        if let Some(&hit) = self.table.borrow().get(&key) {
            tracing::trace!(target: "msp430_symex::solver", cache = "hit", %key);
            return Ok(hit);
        }
        tracing::trace!(target: "msp430_symex::solver", cache = "miss", %key);
        let solver = Solver::new(ctx);
        solver.assert(predicate);
        let sat = match solver.check() {
            Z3SatResult::Sat => true,
            Z3SatResult::Unsat => false,
            Z3SatResult::Unknown => return Err(SolverError::Unknown),
        };
        self.table.borrow_mut().insert(key, sat);
        Ok(sat)
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }
}

/// A satisfying assignment, used to render witnesses and to concretize a
/// symbolic program counter when resolving a `symbolic` state.
pub struct ConcreteModel<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
}

impl<'ctx> ConcreteModel<'ctx> {
    /// Build a model for `predicate` directly, bypassing the sat cache:
    /// full models aren't cached process-wide (see DESIGN.md), only the
    /// boolean sat/unsat verdict is. Models are only built when a caller
    /// actually needs concrete values (witness rendering, symbolic-PC
    /// resolution), which happens at most once per reported result.
    pub fn solve(ctx: &'ctx Context, predicate: &Bool<'ctx>) -> Result<Option<Self>, SolverError> {
        let solver = Solver::new(ctx);
        solver.assert(predicate);
        match solver.check() {
            Z3SatResult::Sat => Ok(Some(Self { ctx, solver })),
            Z3SatResult::Unsat => Ok(None),
            Z3SatResult::Unknown => Err(SolverError::Unknown),
        }
    }

    pub fn eval_u64(&self, expr: &Bv<'ctx>) -> Option<u64> {
        let model = self.solver.get_model()?;
        model.eval(expr.as_z3(), true)?.as_u64()
    }

    pub fn ctx(&self) -> &'ctx Context {
        self.ctx
    }
}
