//! Symbolic I/O streams for the `gets`/`putchar` interrupt summaries
//! (spec §3 "IOStream", §4.5, §6 "Witness format").

use std::cell::Cell;
use std::rc::Rc;

use z3::Context;

use crate::bv::Bv;
use crate::consts::WITNESS_SENTINEL;
use crate::solver::ConcreteModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    Input,
    Output,
}

/// A `(start, len)` range into the flat byte list, recording one
/// `generate_input` call's worth of bytes, for witness re-grouping.
pub type Group = (usize, usize);

/// Flat, ordered list of symbolic bytes. `COW` clone semantics match
/// [`crate::memory::Memory`] and [`crate::path::Path`]: backing vectors are
/// shared `Rc`s, copied on first write after a clone via `Rc::make_mut`.
#[derive(Clone)]
pub struct IoStream<'ctx> {
    ctx: &'ctx Context,
    kind: IoKind,
    bytes: Rc<Vec<Bv<'ctx>>>,
    groups: Rc<Vec<Group>>,
    /// Monotonic counter for `inp_N` variable names. Deliberately *not*
    /// behind the same COW discipline as `bytes`/`groups`: it is shared
    /// process-wide (like the solver's predicate cache) so that two
    /// sibling states forked from a common ancestor, each independently
    /// calling `gets` afterwards, never mint the same variable name.
    name_counter: Rc<Cell<u64>>,
}

impl<'ctx> IoStream<'ctx> {
    pub fn new_input(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            kind: IoKind::Input,
            bytes: Rc::new(Vec::new()),
            groups: Rc::new(Vec::new()),
            name_counter: Rc::new(Cell::new(0)),
        }
    }

    pub fn new_output(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            kind: IoKind::Output,
            bytes: Rc::new(Vec::new()),
            groups: Rc::new(Vec::new()),
            name_counter: Rc::new(Cell::new(0)),
        }
    }

    pub fn kind(&self) -> IoKind {
        self.kind
    }

    pub fn bytes(&self) -> &[Bv<'ctx>] {
        &self.bytes
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Append one output byte.
    pub fn push(&mut self, byte: Bv<'ctx>) {
        debug_assert_eq!(self.kind, IoKind::Output);
        debug_assert_eq!(byte.width(), 8);
        Rc::make_mut(&mut self.bytes).push(byte);
    }

    /// Produce `length` fresh BV8 variables named `inp_<n>`, append them as
    /// one new input group, and return them for the caller (the `gets`
    /// interrupt summary) to write into memory.
    pub fn generate_input(&mut self, length: u16) -> Vec<Bv<'ctx>> {
        debug_assert_eq!(self.kind, IoKind::Input);
        let start = self.bytes.len();
        let bytes = Rc::make_mut(&mut self.bytes);
        let mut fresh = Vec::with_capacity(length as usize);
        for _ in 0..length {
            let id = self.name_counter.get();
            self.name_counter.set(id + 1);
            let var = Bv::named(self.ctx, &format!("inp_{id}"), 8);
            bytes.push(var.clone());
            fresh.push(var);
        }
        Rc::make_mut(&mut self.groups).push((start, length as usize));
        fresh
    }

    /// Render this stream's bytes against a model, substituting
    /// [`WITNESS_SENTINEL`] for any byte the model leaves unconstrained.
    pub fn render_flat(&self, model: &ConcreteModel<'ctx>) -> Vec<u8> {
        self.bytes
            .iter()
            .map(|b| model.eval_u64(b).map(|v| v as u8).unwrap_or(WITNESS_SENTINEL))
            .collect()
    }

    /// Render each `generate_input` call as its own byte vector (only
    /// meaningful for an input stream).
    pub fn render_groups(&self, model: &ConcreteModel<'ctx>) -> Vec<Vec<u8>> {
        let flat = self.render_flat(model);
        self.groups.iter().map(|&(start, len)| flat[start..start + len].to_vec()).collect()
    }
}
