//! The callgate interrupt summaries (spec §4.5): side effects the symbolic
//! executor performs directly instead of simulating the firmware's
//! interrupt-vector code at `0x0010`, keyed on the high 7 bits of R2.

use crate::bv::Bv;
use crate::consts::interrupt;
use crate::error::ExecError;
use crate::state::State;

/// Dispatch the callgate interrupt named by R2 bits 14..8. `state` has
/// already had its return address pushed by [`crate::cpu::single`]'s CALL
/// handler, so stack-relative argument offsets here are measured from the
/// post-push `SP`.
pub fn dispatch<'ctx>(state: &State<'ctx>) -> Result<Vec<State<'ctx>>, ExecError> {
    let ctx = state.ctx();
    let sr = state.cpu.registers.sr();
    let number = sr
        .extract(14, 8)
        .as_concrete()
        .map(|v| v as u8)
        .ok_or(ExecError::SymbolicInterruptNumber)?;

    match number {
        interrupt::PUTCHAR => {
            let mut next = state.clone();
            let arg_addr = sp_plus(&next, 6);
            let byte = next.memory.read_byte_at(arg_addr);
            next.output.push(byte);
            Ok(vec![next])
        }

        interrupt::GETS => {
            let mut next = state.clone();
            let dest_addr = sp_plus(&next, 6);
            let dest = next.memory.read_word(&Bv::constant(ctx, dest_addr as u64, 16), &mut next.path)?;
            let dest = dest.as_concrete().map(|v| v as u16).ok_or(ExecError::SymbolicMemoryAddress {
                context: "gets destination pointer",
            })?;

            let len_addr = sp_plus(&next, 8);
            let length = next.memory.read_word(&Bv::constant(ctx, len_addr as u64, 16), &mut next.path)?;
            let length = length
                .as_concrete()
                .map(|v| v as u16)
                .ok_or(ExecError::SymbolicMemoryAddress { context: "gets length" })?;

            let fresh = next.input.generate_input(length);
            for (i, byte) in fresh.iter().enumerate() {
                next.memory.write_byte_at(dest.wrapping_add(i as u16), byte.clone());
            }

            // The original `gets` summary only null-terminates the buffer
            // when every byte the model picked is non-zero; an all-zero (or
            // partially-zero) fill already reads back as a C string, so the
            // trailing byte one past the requested length is left alone.
            let nonzero_conditions: Vec<_> = fresh.iter().map(|b| b.is_nonzero()).collect();
            let all_nonzero = crate::bv::and(ctx, &nonzero_conditions);
            let terminator_addr = dest.wrapping_add(length).wrapping_add(1);
            let old_byte = next.memory.read_byte_at(terminator_addr);
            let new_byte = Bv::ite(&all_nonzero, &Bv::constant(ctx, 0, 8), &old_byte);
            next.memory.write_byte_at(terminator_addr, new_byte);

            Ok(vec![next])
        }

        interrupt::HSM1CHECK | interrupt::HSM2CHECK => Ok(vec![state.clone()]),

        interrupt::UNLOCK => {
            let mut next = state.clone();
            next.unlocked = true;
            Ok(vec![next])
        }

        interrupt::GETCHAR => Err(ExecError::UnimplementedOpcode("interrupt:getchar")),
        interrupt::ENABLEDEP => Err(ExecError::UnimplementedOpcode("interrupt:enabledep")),
        interrupt::SETPAGEPERMS => Err(ExecError::UnimplementedOpcode("interrupt:setpageperms")),
        interrupt::RAND => Err(ExecError::UnimplementedOpcode("interrupt:rand")),

        _ => Err(ExecError::UnimplementedOpcode("interrupt:unknown")),
    }
}

fn sp_plus<'ctx>(state: &State<'ctx>, offset: u16) -> u16 {
    state
        .cpu
        .registers
        .sp()
        .as_concrete()
        .map(|v| (v as u16).wrapping_add(offset))
        .unwrap_or(offset)
}
