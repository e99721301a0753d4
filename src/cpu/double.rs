//! Double-operand (format I) opcode semantics (spec §4.3).

use z3::Context;

use crate::bv::{self, Bv};
use crate::consts::{FLAG_C, FLAG_N, FLAG_V, FLAG_Z};
use crate::cpu::flags::{fork_on_flags, relevant_flags, FlagSet, FlagUpdate};
use crate::cpu::operand;
use crate::error::ExecError;
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::{DoubleOperandOpcode, OperandWidth};
use crate::state::State;

pub fn exec<'ctx>(
    state: &State<'ctx>,
    opcode: DoubleOperandOpcode,
    width: OperandWidth,
    src: &Operand<'ctx>,
    dst: &Operand<'ctx>,
    _instruction: &Instruction<'ctx>,
) -> Result<Vec<State<'ctx>>, ExecError> {
    use DoubleOperandOpcode::*;

    let mut state = state.clone();
    let ctx = state.ctx();
    let w = width.bits();

    // `dst` must resolve (and, for AutoIncrement, apply its side effect)
    // before `src`'s read/write so the pair behaves like the real
    // instruction's single combined fetch-decode-execute cycle: spec §4.2
    // doesn't mandate an order, but resolving source first would let a
    // `dst`-side auto-increment observe a `src` that already moved.
    let src_location = operand::resolve(&mut state, src, width)?;
    let dst_location = operand::resolve(&mut state, dst, width)?;
    let src_value = operand::read(&mut state, &src_location, width)?;

    match opcode {
        Mov => {
            operand::write(&mut state, &dst_location, width, src_value)?;
            Ok(vec![state])
        }

        Add => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let sum = src_value.add(&dst_value);
            operand::write(&mut state, &dst_location, width, sum.clone())?;

            let carry = src_value.zero_extend(1).add(&dst_value.zero_extend(1)).extract(w, w).is_nonzero();
            let overflow = signed_overflow_add(ctx, &src_value, &dst_value, &sum, w);
            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            Ok(fork_on_flags(state, relevant, &arithmetic_updates(ctx, &sum, w, carry, overflow)))
        }

        Sub => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let (diff, carry, overflow) = subtract(ctx, &src_value, &dst_value, w);
            operand::write(&mut state, &dst_location, width, diff)?;

            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            Ok(fork_on_flags(state, relevant, &compare_updates(&src_value, &dst_value, carry, overflow)))
        }

        Cmp => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let (_diff, carry, overflow) = subtract(ctx, &src_value, &dst_value, w);

            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            Ok(fork_on_flags(state, relevant, &compare_updates(&src_value, &dst_value, carry, overflow)))
        }

        Bit => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let result = src_value.bitand(&dst_value);
            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            Ok(fork_on_flags(state, relevant, &logical_updates(&result)))
        }

        And => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let result = src_value.bitand(&dst_value);
            operand::write(&mut state, &dst_location, width, result.clone())?;
            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            Ok(fork_on_flags(state, relevant, &logical_updates(&result)))
        }

        Bic => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let result = dst_value.bitand(&src_value.not());
            operand::write(&mut state, &dst_location, width, result)?;
            Ok(vec![state])
        }

        Bis => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let result = dst_value.bitor(&src_value);
            operand::write(&mut state, &dst_location, width, result)?;
            Ok(vec![state])
        }

        Xor => {
            let dst_value = operand::read(&mut state, &dst_location, width)?;
            let result = src_value.bitxor(&dst_value);
            let overflow = bv::and(ctx, &[src_value.slt(&Bv::constant(ctx, 0, w)), dst_value.slt(&Bv::constant(ctx, 0, w))]);
            operand::write(&mut state, &dst_location, width, result.clone())?;

            let relevant = relevant_flags(&state, state.enable_unsound_optimizations);
            let mut updates = logical_updates(&result);
            updates[3] = FlagUpdate { flag: FlagSet::V, mask: FLAG_V, condition: overflow };
            Ok(fork_on_flags(state, relevant, &updates))
        }

        Addc => Err(ExecError::UnimplementedOpcode("ADDC")),
        Subc => Err(ExecError::UnimplementedOpcode("SUBC")),
        Dadd => Err(ExecError::UnimplementedOpcode("DADD")),
    }
}

fn signed_overflow_add<'ctx>(ctx: &'ctx Context, src: &Bv<'ctx>, dst: &Bv<'ctx>, sum: &Bv<'ctx>, w: u32) -> z3::ast::Bool<'ctx> {
    let zero = Bv::constant(ctx, 0, w);
    let both_pos = bv::and(ctx, &[src.sgt(&zero), dst.sgt(&zero), sum.slt(&zero)]);
    let both_neg = bv::and(ctx, &[src.slt(&zero), dst.slt(&zero), sum.sgt(&zero)]);
    bv::or(ctx, &[both_pos, both_neg])
}

/// `dst - src`, computed literally as `dst + ~src + 1` (spec §4.3) so the
/// carry-out bit matches the MSP430's "carry = no borrow" convention; the
/// returned value is the plain `w`-bit difference.
fn subtract<'ctx>(ctx: &'ctx Context, src: &Bv<'ctx>, dst: &Bv<'ctx>, w: u32) -> (Bv<'ctx>, z3::ast::Bool<'ctx>, z3::ast::Bool<'ctx>) {
    let not_src = src.not();
    let one = Bv::constant(ctx, 1, w + 1);
    let zext_sum = dst.zero_extend(1).add(&not_src.zero_extend(1)).add(&one);
    let carry = zext_sum.extract(w, w).is_nonzero();
    let diff = dst.sub(src);

    let zero = Bv::constant(ctx, 0, w);
    let overflow_neg_to_pos = bv::and(ctx, &[src.slt(&zero), dst.sgt(&zero), diff.slt(&zero)]);
    let overflow_pos_to_neg = bv::and(ctx, &[src.sgt(&zero), dst.slt(&zero), diff.sgt(&zero)]);
    let overflow = bv::or(ctx, &[overflow_neg_to_pos, overflow_pos_to_neg]);

    (diff, carry, overflow)
}

fn arithmetic_updates<'ctx>(
    ctx: &'ctx Context,
    result: &Bv<'ctx>,
    w: u32,
    carry: z3::ast::Bool<'ctx>,
    overflow: z3::ast::Bool<'ctx>,
) -> [FlagUpdate<'ctx>; 4] {
    [
        FlagUpdate { flag: FlagSet::N, mask: FLAG_N, condition: result.slt(&Bv::constant(ctx, 0, w)) },
        FlagUpdate { flag: FlagSet::Z, mask: FLAG_Z, condition: result.is_zero() },
        FlagUpdate { flag: FlagSet::C, mask: FLAG_C, condition: carry },
        FlagUpdate { flag: FlagSet::V, mask: FLAG_V, condition: overflow },
    ]
}

/// `SUB`/`CMP` flags: `N = src > dst` and `Z = src == dst` (spec §4.3),
/// rather than the generic "sign/zero of the result" reading `ADD` uses.
fn compare_updates<'ctx>(src: &Bv<'ctx>, dst: &Bv<'ctx>, carry: z3::ast::Bool<'ctx>, overflow: z3::ast::Bool<'ctx>) -> [FlagUpdate<'ctx>; 4] {
    [
        FlagUpdate { flag: FlagSet::N, mask: FLAG_N, condition: src.sgt(dst) },
        FlagUpdate { flag: FlagSet::Z, mask: FLAG_Z, condition: src.eq(dst) },
        FlagUpdate { flag: FlagSet::C, mask: FLAG_C, condition: carry },
        FlagUpdate { flag: FlagSet::V, mask: FLAG_V, condition: overflow },
    ]
}

/// `BIT`/`AND` style flags: `N`/`Z`/`C` read off the result, `V` always 0.
fn logical_updates<'ctx>(result: &Bv<'ctx>) -> [FlagUpdate<'ctx>; 4] {
    let ctx = result.ctx();
    [
        FlagUpdate { flag: FlagSet::N, mask: FLAG_N, condition: result.msb().is_nonzero() },
        FlagUpdate { flag: FlagSet::Z, mask: FLAG_Z, condition: result.is_zero() },
        FlagUpdate { flag: FlagSet::C, mask: FLAG_C, condition: result.is_nonzero() },
        FlagUpdate { flag: FlagSet::V, mask: FLAG_V, condition: z3::ast::Bool::from_bool(ctx, false) },
    ]
}
