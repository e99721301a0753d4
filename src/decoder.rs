//! The MSP430 instruction decoder (spec §4.1).
//!
//! A pure function used both by the CPU's per-step fetch and by the
//! flag-relevance lookahead's static decode. Classification is entirely by
//! the top bits of the first 16-bit word; see spec.md for the bit layout
//! this mirrors exactly.

use z3::Context;

use crate::bv::Bv;
use crate::consts::MAX_INSTRUCTION_BYTES;
use crate::error::DecodeError;
use crate::isa::instruction::{Instruction, Operand};
use crate::isa::{AddressingMode, DoubleOperandOpcode, JumpOpcode, OperandWidth, Register, SingleOperandOpcode};

fn le_word(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes.get(1).copied().unwrap_or(0)])
}

fn single_opcode(bits: u8) -> Option<SingleOperandOpcode> {
    use SingleOperandOpcode::*;
    Some(match bits {
        0 => Rrc,
        1 => Swpb,
        2 => Rra,
        3 => Sxt,
        4 => Push,
        5 => Call,
        6 => Reti,
        _ => return None,
    })
}

fn jump_opcode(bits: u8) -> JumpOpcode {
    use JumpOpcode::*;
    match bits {
        0 => Jnz,
        1 => Jz,
        2 => Jnc,
        3 => Jc,
        4 => Jn,
        5 => Jge,
        6 => Jl,
        _ => Jmp,
    }
}

fn double_opcode(bits: u8) -> Option<DoubleOperandOpcode> {
    use DoubleOperandOpcode::*;
    Some(match bits {
        4 => Mov,
        5 => Add,
        6 => Addc,
        7 => Subc,
        8 => Sub,
        9 => Cmp,
        10 => Dadd,
        11 => Bit,
        12 => Bic,
        13 => Bis,
        14 => Xor,
        15 => And,
        _ => return None,
    })
}

/// Addressing mode for a *source* operand (single-operand, or
/// double-operand source): register-dependent table folding the
/// constant-generator and PC-relative special cases in (spec §3/§4.1).
fn source_mode(register: Register, mode_bits: u8) -> AddressingMode {
    use AddressingMode::*;
    match (register, mode_bits) {
        (Register::PC, 0) => Direct,
        (Register::PC, 1) => Symbolic,
        (Register::PC, 2) => Indirect,
        (Register::PC, 3) => Immediate,
        (Register::SR, 0) => Direct,
        (Register::SR, 1) => Absolute,
        (Register::SR, 2) => Constant4,
        (Register::SR, 3) => Constant8,
        (Register::CG, 0) => Constant0,
        (Register::CG, 1) => Constant1,
        (Register::CG, 2) => Constant2,
        (Register::CG, 3) => ConstantNeg1,
        (_, 0) => Direct,
        (_, 1) => Indexed,
        (_, 2) => Indirect,
        (_, 3) => AutoIncrement,
        _ => unreachable!("mode bits are 2-bit"),
    }
}

/// Addressing mode for a double-operand *destination*: a single `Ad` bit,
/// restricted to `{Direct, Indexed, Symbolic, Absolute}` (spec §3).
fn dest_mode(register: Register, ad_bit: u8) -> AddressingMode {
    use AddressingMode::*;
    match (register, ad_bit) {
        (Register::PC, 0) => Direct,
        (Register::PC, _) => Symbolic,
        (Register::SR, 0) => Direct,
        (Register::SR, _) => Absolute,
        (_, 0) => Direct,
        (_, _) => Indexed,
    }
}

/// Decode a concrete instruction from a raw byte buffer (at least 2, up to
/// [`MAX_INSTRUCTION_BYTES`] bytes). `extend` turns a concrete 16-bit
/// extension word into the `Bv` the rest of the engine expects operands to
/// carry (spec §3: "Operands are carried as 16-bit bitvector expressions
/// even when they originated as concrete integers").
pub fn decode_concrete<'ctx>(
    ctx: &'ctx Context,
    address: u16,
    bytes: &[u8],
) -> Result<(Instruction<'ctx>, u16), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::MalformedInstruction { address, word: 0 });
    }
    let w = le_word(bytes);

    if (w >> 10) == 0b000100 {
        decode_single(ctx, address, bytes, w)
    } else if (w >> 13) == 0b001 {
        Ok(decode_jump(ctx, address, bytes, w))
    } else {
        decode_double(ctx, address, bytes, w)
    }
}

fn extension_word_at(bytes: &[u8], offset: usize) -> Option<u16> {
    let hi = bytes.get(offset + 1).copied()?;
    let lo = bytes.get(offset).copied()?;
    Some(u16::from_le_bytes([lo, hi]))
}

fn decode_single<'ctx>(
    ctx: &'ctx Context,
    address: u16,
    bytes: &[u8],
    w: u16,
) -> Result<(Instruction<'ctx>, u16), DecodeError> {
    let opcode_bits = ((w >> 7) & 0b111) as u8;
    let opcode = single_opcode(opcode_bits).ok_or(DecodeError::MalformedInstruction { address, word: w })?;
    let width = OperandWidth::from_bit(((w >> 6) & 1) != 0);
    let mode_bits = ((w >> 4) & 0b11) as u8;
    let register = Register::from_index((w & 0xf) as u8);
    let mode = source_mode(register, mode_bits);

    let extension = if mode.has_extension_word_as_source() {
        let raw = extension_word_at(bytes, 2).ok_or(DecodeError::MalformedInstruction { address, word: w })?;
        Some(Bv::constant(ctx, raw as u64, 16))
    } else {
        None
    };
    let len = 2 + if extension.is_some() { 2 } else { 0 };
    let raw = bytes[..len as usize].to_vec();

    Ok((
        Instruction::Single {
            raw,
            source_address: address,
            opcode,
            width,
            operand: Operand { mode, register, extension },
        },
        len,
    ))
}

fn decode_jump<'ctx>(ctx: &'ctx Context, address: u16, bytes: &[u8], w: u16) -> (Instruction<'ctx>, u16) {
    let opcode_bits = ((w >> 10) & 0b111) as u8;
    let opcode = jump_opcode(opcode_bits);
    let raw_offset = (w & 0x3ff) as i32;
    let signed10 = if raw_offset & 0x200 != 0 {
        raw_offset - 0x400
    } else {
        raw_offset
    };
    let target = (address as i32).wrapping_add(2).wrapping_add(signed10 * 2) as u16;

    (
        Instruction::Jump {
            raw: bytes[..2].to_vec(),
            source_address: address,
            opcode,
            target: Bv::constant(ctx, target as u64, 16),
        },
        2,
    )
}

fn decode_double<'ctx>(
    ctx: &'ctx Context,
    address: u16,
    bytes: &[u8],
    w: u16,
) -> Result<(Instruction<'ctx>, u16), DecodeError> {
    let opcode_bits = ((w >> 12) & 0xf) as u8;
    let opcode = double_opcode(opcode_bits).ok_or(DecodeError::MalformedInstruction { address, word: w })?;
    let src_register = Register::from_index(((w >> 8) & 0xf) as u8);
    let ad_bit = ((w >> 7) & 1) as u8;
    let width = OperandWidth::from_bit(((w >> 6) & 1) != 0);
    let src_mode_bits = ((w >> 4) & 0b11) as u8;
    let dst_register = Register::from_index((w & 0xf) as u8);

    let src_mode = source_mode(src_register, src_mode_bits);
    let dst_mode = dest_mode(dst_register, ad_bit);

    let mut cursor = 2usize;
    let src_extension = if src_mode.has_extension_word_as_source() {
        let raw = extension_word_at(bytes, cursor).ok_or(DecodeError::MalformedInstruction { address, word: w })?;
        cursor += 2;
        Some(Bv::constant(ctx, raw as u64, 16))
    } else {
        None
    };
    let dst_extension = if dst_mode.has_extension_word_as_dest() {
        let raw = extension_word_at(bytes, cursor).ok_or(DecodeError::MalformedInstruction { address, word: w })?;
        cursor += 2;
        Some(Bv::constant(ctx, raw as u64, 16))
    } else {
        None
    };

    let raw = bytes[..cursor].to_vec();
    Ok((
        Instruction::Double {
            raw,
            source_address: address,
            opcode,
            width,
            src: Operand {
                mode: src_mode,
                register: src_register,
                extension: src_extension,
            },
            dst: Operand {
                mode: dst_mode,
                register: dst_register,
                extension: dst_extension,
            },
        },
        cursor as u16,
    ))
}

/// Decode `n` instructions statically from `bytes` (which must start at
/// `address` and hold at least `n * MAX_INSTRUCTION_BYTES` bytes, padded
/// with zeroes if short), stopping early at a return-like instruction.
/// Used by [`crate::state::State::decode_some_instructions`] for the
/// flag-relevance lookahead (spec §4.4).
pub fn decode_program<'ctx>(
    ctx: &'ctx Context,
    address: u16,
    bytes: &[u8],
    n: usize,
) -> Vec<(u16, Instruction<'ctx>)> {
    let mut out = Vec::with_capacity(n);
    let mut pc = address;
    for _ in 0..n {
        let offset = pc.wrapping_sub(address) as usize;
        if offset >= bytes.len() {
            break;
        }
        let mut window = [0u8; MAX_INSTRUCTION_BYTES];
        let avail = (bytes.len() - offset).min(MAX_INSTRUCTION_BYTES);
        window[..avail].copy_from_slice(&bytes[offset..offset + avail]);
        let Ok((instr, len)) = decode_concrete(ctx, pc, &window) else {
            break;
        };
        let is_return = instr.is_return_like();
        out.push((pc, instr));
        if is_return {
            break;
        }
        pc = pc.wrapping_add(len);
    }
    out
}
