//! Byte-addressable symbolic memory (spec §3 "Memory").
//!
//! Cloning shares the backing array via `Rc`; `Rc::make_mut` gives the
//! copy-on-write discipline spec §5 asks for without a manual
//! "needs-copying" flag: the first write after a clone sees a strong count
//! greater than one and copies once, subsequent writes on the same handle
//! mutate in place.

use std::rc::Rc;

use z3::ast::Bool;
use z3::Context;

use crate::bv::Bv;
use crate::consts::MEMORY_SIZE;
use crate::error::ExecError;
use crate::path::Path;

#[derive(Clone)]
pub struct Memory<'ctx> {
    ctx: &'ctx Context,
    data: Rc<Vec<Bv<'ctx>>>,
}

impl<'ctx> Memory<'ctx> {
    /// Load a concrete 0x10000-byte image.
    pub fn from_image(ctx: &'ctx Context, image: &[u8; MEMORY_SIZE]) -> Self {
        let data = image.iter().map(|&b| Bv::constant(ctx, b as u64, 8)).collect();
        Self {
            ctx,
            data: Rc::new(data),
        }
    }

    /// Concretize an address expression. A symbolic address that doesn't
    /// collapse to a single numeral is a fatal `SymbolicMemoryAddress`
    /// error per spec Non-goals.
    fn concretize(addr: &Bv<'ctx>, context: &'static str) -> Result<u16, ExecError> {
        addr.as_concrete()
            .map(|v| (v & 0xffff) as u16)
            .ok_or(ExecError::SymbolicMemoryAddress { context })
    }

    pub fn read_byte_at(&self, addr: u16) -> Bv<'ctx> {
        self.data[addr as usize].clone()
    }

    pub fn write_byte_at(&mut self, addr: u16, value: Bv<'ctx>) {
        debug_assert_eq!(value.width(), 8);
        Rc::make_mut(&mut self.data)[addr as usize] = value;
    }

    pub fn read_byte(&self, addr: &Bv<'ctx>) -> Result<Bv<'ctx>, ExecError> {
        let a = Self::concretize(addr, "memory read (byte)")?;
        Ok(self.read_byte_at(a))
    }

    pub fn write_byte(&mut self, addr: &Bv<'ctx>, value: Bv<'ctx>) -> Result<(), ExecError> {
        let a = Self::concretize(addr, "memory write (byte)")?;
        self.write_byte_at(a, value);
        Ok(())
    }

    /// Little-endian word read. Adds an alignment constraint to `path`
    /// (spec §4.2 edge case / §9 design note) rather than panicking: the
    /// address is already concrete by this point, so the constraint is
    /// really "force this path unsat if the address turned out odd".
    pub fn read_word(&self, addr: &Bv<'ctx>, path: &mut Path<'ctx>) -> Result<Bv<'ctx>, ExecError> {
        let a = Self::concretize(addr, "memory read (word)")?;
        path.add(Self::alignment_constraint(self.ctx, a));
        let lo = self.read_byte_at(a);
        let hi = self.read_byte_at(a.wrapping_add(1));
        Ok(hi.concat(&lo))
    }

    pub fn write_word(&mut self, addr: &Bv<'ctx>, value: Bv<'ctx>, path: &mut Path<'ctx>) -> Result<(), ExecError> {
        debug_assert_eq!(value.width(), 16);
        let a = Self::concretize(addr, "memory write (word)")?;
        path.add(Self::alignment_constraint(self.ctx, a));
        let lo = value.extract(7, 0);
        let hi = value.extract(15, 8);
        self.write_byte_at(a, lo);
        self.write_byte_at(a.wrapping_add(1), hi);
        Ok(())
    }

    fn alignment_constraint(ctx: &'ctx Context, addr: u16) -> Bool<'ctx> {
        Bool::from_bool(ctx, addr & 1 == 0)
    }
}
