//! The CPU: register file plus one method per opcode (spec §4.3).
//!
//! Each opcode handler is a total function `(&State, &Instruction) ->
//! Result<Vec<State>, ExecError>`. Handlers clone their input `State`
//! first (via [`State::forked`], already done by [`State::step`] before
//! dispatch) and never mutate the original.

pub mod double;
pub mod flags;
pub mod jump;
pub mod operand;
pub mod single;

use z3::Context;

use crate::error::ExecError;
use crate::isa::instruction::Instruction;
use crate::registers::RegisterFile;
use crate::state::State;

#[derive(Clone)]
pub struct Cpu<'ctx> {
    pub registers: RegisterFile<'ctx>,
}

impl<'ctx> Cpu<'ctx> {
    pub fn new(ctx: &'ctx Context, entry: u16) -> Self {
        Self {
            registers: RegisterFile::new(ctx, entry),
        }
    }
}

/// Route a decoded instruction to its opcode handler.
pub fn dispatch<'ctx>(state: &State<'ctx>, instruction: &Instruction<'ctx>) -> Result<Vec<State<'ctx>>, ExecError> {
    match instruction {
        Instruction::Single { opcode, width, operand, .. } => single::exec(state, *opcode, *width, operand, instruction),
        Instruction::Jump { opcode, target, .. } => jump::exec(state, *opcode, target),
        Instruction::Double {
            opcode, width, src, dst, ..
        } => double::exec(state, *opcode, *width, src, dst, instruction),
    }
}
