//! Conditional/unconditional jump (format III) semantics (spec §4.3).
//!
//! Every conditional jump forks into a taken and a not-taken successor,
//! each constrained with the branch condition (or its negation); `PathGroup`
//! prunes whichever side turns out unsatisfiable once it re-checks `is_sat`
//! (spec §4.6). Jump targets are always concrete here: the decoder computes
//! them directly from the instruction's address and its 10-bit signed
//! offset, never from a register or memory operand.
//!
//! `JN` and `JGE` are decodable (the flag-relevance lookahead classifies
//! them) but never executed: dispatching either is `UnimplementedOpcode`.

use crate::bv::{xor, Bv};
use crate::consts::{FLAG_C, FLAG_N, FLAG_V, FLAG_Z};
use crate::error::ExecError;
use crate::isa::JumpOpcode;
use crate::registers::RegisterFile;
use crate::state::State;

pub fn exec<'ctx>(state: &State<'ctx>, opcode: JumpOpcode, target: &Bv<'ctx>) -> Result<Vec<State<'ctx>>, ExecError> {
    use JumpOpcode::*;

    let state = state.clone();

    if let Jmp = opcode {
        let mut next = state;
        next.cpu.registers.set_pc(target.clone());
        return Ok(vec![next]);
    }

    if matches!(opcode, Jn) {
        return Err(ExecError::UnimplementedOpcode("JN"));
    }
    if matches!(opcode, Jge) {
        return Err(ExecError::UnimplementedOpcode("JGE"));
    }

    let registers = &state.cpu.registers;
    let taken_condition = match opcode {
        Jnz => registers.flag_is_set(FLAG_Z).not(),
        Jz => registers.flag_is_set(FLAG_Z),
        Jnc => registers.flag_is_set(FLAG_C).not(),
        Jc => registers.flag_is_set(FLAG_C),
        Jl => jl_condition(registers),
        Jn | Jge | Jmp => unreachable!("handled above"),
    };

    let mut taken = state.clone();
    taken.path.add(taken_condition.clone());
    taken.cpu.registers.set_pc(target.clone());

    let mut not_taken = state;
    not_taken.path.add(taken_condition.not());

    Ok(vec![taken, not_taken])
}

fn jl_condition<'ctx>(registers: &RegisterFile<'ctx>) -> z3::ast::Bool<'ctx> {
    xor(&registers.flag_is_set(FLAG_N), &registers.flag_is_set(FLAG_V))
}
