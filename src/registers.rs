//! The 16-register file (spec §3 "RegisterFile").
//!
//! Unlike [`crate::memory::Memory`] and [`crate::path::Path`], clone
//! semantics here are a plain structural copy of a fixed-size array: spec
//! §3 notes the array is small enough that `Rc`-sharing would add
//! overhead without a meaningful payoff.

use crate::bv::Bv;
use crate::consts::{FLAG_C, FLAG_N, FLAG_V, FLAG_Z, REGISTER_COUNT, REG_CG, REG_PC, REG_SP, REG_SR};
use crate::isa::Register;
use z3::Context;

#[derive(Clone)]
pub struct RegisterFile<'ctx> {
    ctx: &'ctx Context,
    values: [Bv<'ctx>; REGISTER_COUNT],
}

/// Anything that can address a register: the enum, a raw 0..15 index, or a
/// case-insensitive name like `"R12"` (spec §3).
pub trait RegisterLookup {
    fn resolve(&self) -> Register;
}

impl RegisterLookup for Register {
    fn resolve(&self) -> Register {
        *self
    }
}

impl RegisterLookup for usize {
    fn resolve(&self) -> Register {
        Register::from_index(*self as u8)
    }
}

impl RegisterLookup for &str {
    fn resolve(&self) -> Register {
        Register::from_name(self).unwrap_or_else(|| panic!("no such register: {self}"))
    }
}

impl<'ctx> RegisterFile<'ctx> {
    pub fn new(ctx: &'ctx Context, pc: u16) -> Self {
        let zero = Bv::constant(ctx, 0, 16);
        let mut values: [Bv<'ctx>; REGISTER_COUNT] = std::array::from_fn(|_| zero.clone());
        values[REG_PC] = Bv::constant(ctx, pc as u64, 16);
        Self { ctx, values }
    }

    pub fn get(&self, reg: impl RegisterLookup) -> Bv<'ctx> {
        self.values[reg.resolve().index()].clone()
    }

    pub fn set(&mut self, reg: impl RegisterLookup, value: Bv<'ctx>) {
        debug_assert_eq!(value.width(), 16);
        self.values[reg.resolve().index()] = value;
    }

    pub fn pc(&self) -> Bv<'ctx> {
        self.values[REG_PC].clone()
    }

    pub fn set_pc(&mut self, value: Bv<'ctx>) {
        self.values[REG_PC] = value;
    }

    pub fn sp(&self) -> Bv<'ctx> {
        self.values[REG_SP].clone()
    }

    pub fn set_sp(&mut self, value: Bv<'ctx>) {
        self.values[REG_SP] = value;
    }

    pub fn sr(&self) -> Bv<'ctx> {
        self.values[REG_SR].clone()
    }

    /// `true` iff the status register's `flag` bit is concretely set.
    /// Only meaningful after the flag has been materialized along this
    /// path (see the flag-relevance lookahead, spec §4.4): callers that
    /// need the symbolic flag condition should build it from `sr()`
    /// directly instead.
    pub fn flag_bit(&self, flag: u16) -> Bv<'ctx> {
        let mask = Bv::constant(self.ctx, flag as u64, 16);
        self.sr().bitand(&mask)
    }

    pub fn flag_is_set(&self, flag: u16) -> z3::ast::Bool<'ctx> {
        self.flag_bit(flag).is_nonzero()
    }

    pub fn set_flag(&mut self, flag: u16, set: bool) {
        let mask = flag as u64;
        let current = self.sr();
        let new_val = if set {
            current.bitor(&Bv::constant(self.ctx, mask, 16))
        } else {
            current.bitand(&Bv::constant(self.ctx, !mask & 0xffff, 16))
        };
        self.values[REG_SR] = new_val;
    }

    /// Register R3 reads as zero regardless of what's stored in it (it's
    /// the pure constant-generator register); writes to it are a no-op.
    /// Callers must check `reg == Register::CG` *before* calling
    /// [`Self::set`] for constant-generator addressing modes instead
    /// (spec §4.2: constants are never write targets at all).
    pub fn is_constant_generator_only(reg: Register) -> bool {
        reg.index() == REG_CG
    }

    pub const fn flags() -> (u16, u16, u16, u16) {
        (FLAG_C, FLAG_Z, FLAG_N, FLAG_V)
    }
}
