//! Single-operand (format II) opcode semantics (spec §4.3).

use z3::Context;

use crate::bv::Bv;
use crate::consts::{CALLGATE_ADDRESS, FLAG_C, FLAG_N, FLAG_V, FLAG_Z};
use crate::cpu::flags::{fork_on_flags, relevant_flags, FlagSet, FlagUpdate};
use crate::cpu::operand;
use crate::error::ExecError;
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::{OperandWidth, SingleOperandOpcode};
use crate::state::State;

pub fn exec<'ctx>(
    state: &State<'ctx>,
    opcode: SingleOperandOpcode,
    width: OperandWidth,
    operand: &Operand<'ctx>,
    _instruction: &Instruction<'ctx>,
) -> Result<Vec<State<'ctx>>, ExecError> {
    use SingleOperandOpcode::*;

    let mut state = state.clone();
    let ctx = state.ctx();

    match opcode {
        Rrc => {
            let location = operand::resolve(&mut state, operand, width)?;
            let value = operand::read(&mut state, &location, width)?;
            let w = width.bits();

            let carry_bit = Bv::ite(&state.cpu.registers.flag_is_set(FLAG_C), &Bv::constant(ctx, 1, 1), &Bv::constant(ctx, 0, 1));
            let combined = carry_bit.concat(&value);
            let shifted = combined.lshr(&Bv::constant(ctx, 1, w + 1)).extract(w - 1, 0);
            let new_carry = value.extract(0, 0).is_nonzero();

            operand::write(&mut state, &location, width, shifted.clone())?;

            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            let updates = [
                FlagUpdate { flag: FlagSet::C, mask: FLAG_C, condition: new_carry },
                FlagUpdate { flag: FlagSet::Z, mask: FLAG_Z, condition: shifted.is_zero() },
                FlagUpdate { flag: FlagSet::N, mask: FLAG_N, condition: shifted.slt(&Bv::constant(ctx, 0, w)) },
            ];
            Ok(fork_on_flags(state, relevant, &updates))
        }

        Swpb => {
            let location = operand::resolve(&mut state, operand, OperandWidth::Word)?;
            let value = operand::read(&mut state, &location, OperandWidth::Word)?;
            let swapped = value.extract(7, 0).concat(&value.extract(15, 8));
            operand::write(&mut state, &location, OperandWidth::Word, swapped)?;
            Ok(vec![state])
        }

        Rra => Err(ExecError::UnimplementedOpcode("RRA")),

        Sxt => {
            let location = operand::resolve(&mut state, operand, OperandWidth::Word)?;
            let value = operand::read(&mut state, &location, OperandWidth::Word)?;
            let byte = value.extract(7, 0);
            let extended = byte.sign_extend(8);
            operand::write(&mut state, &location, OperandWidth::Word, extended.clone())?;

            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            let zero16 = Bv::constant(ctx, 0, 16);
            let updates = [
                FlagUpdate { flag: FlagSet::N, mask: FLAG_N, condition: extended.slt(&zero16) },
                FlagUpdate { flag: FlagSet::Z, mask: FLAG_Z, condition: extended.is_zero() },
                FlagUpdate { flag: FlagSet::C, mask: FLAG_C, condition: extended.is_nonzero() },
            ];
            let states = fork_on_flags(state, relevant, &updates);
            Ok(clear_flag_in_all(states, FLAG_V))
        }

        Push => {
            let location = operand::resolve(&mut state, operand, width)?;
            let value = operand::read(&mut state, &location, width)?;
            push_word(&mut state, widen_for_push(ctx, value, width))?;
            Ok(vec![state])
        }

        Call => {
            let location = operand::resolve(&mut state, operand, OperandWidth::Word)?;
            let target = operand::read(&mut state, &location, OperandWidth::Word)?;
            match target.as_concrete() {
                Some(addr) if addr as u16 == CALLGATE_ADDRESS => dispatch_callgate(state),
                _ => {
                    let return_addr = state.cpu.registers.pc();
                    push_word(&mut state, return_addr)?;
                    state.cpu.registers.set_pc(target);
                    Ok(vec![state])
                }
            }
        }

        Reti => Err(ExecError::UnimplementedOpcode("RETI")),
    }
}

fn widen_for_push<'ctx>(ctx: &'ctx Context, value: Bv<'ctx>, width: OperandWidth) -> Bv<'ctx> {
    match width {
        OperandWidth::Word => value,
        OperandWidth::Byte => Bv::constant(ctx, 0, 8).concat(&value),
    }
}

fn push_word<'ctx>(state: &mut State<'ctx>, value: Bv<'ctx>) -> Result<(), ExecError> {
    let ctx = state.ctx();
    let new_sp = state.cpu.registers.sp().sub(&Bv::constant(ctx, 2, 16));
    state.cpu.registers.set_sp(new_sp.clone());
    state.memory.write_word(&new_sp, value, &mut state.path)
}

fn clear_flag_in_all<'ctx>(states: Vec<State<'ctx>>, mask: u16) -> Vec<State<'ctx>> {
    states
        .into_iter()
        .map(|mut s| {
            s.cpu.registers.set_flag(mask, false);
            s
        })
        .collect()
}

/// `CALL #CALLGATE_ADDRESS` never runs real firmware: it pushes the return
/// address (so the callgate's fixed stack offsets line up the same way they
/// would for a real `CALL`), dispatches the interrupt summary, then restores
/// `SP` as if the (never-modeled) handler had `RETI`'d straight back. `PC` is
/// left untouched throughout: [`State::step`] already advanced it past this
/// `CALL` before handing off to us.
fn dispatch_callgate<'ctx>(state: State<'ctx>) -> Result<Vec<State<'ctx>>, ExecError> {
    let ctx = state.ctx();
    let mut pushed = state;
    let return_addr = pushed.cpu.registers.pc();
    push_word(&mut pushed, return_addr)?;

    let mut successors = crate::interrupt::dispatch(&pushed)?;
    for s in &mut successors {
        let restored_sp = s.cpu.registers.sp().add(&Bv::constant(ctx, 2, 16));
        s.cpu.registers.set_sp(restored_sp);
    }
    Ok(successors)
}
