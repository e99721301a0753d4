//! Decoded instruction representation (spec §3 "Instruction").

use crate::bv::Bv;
use crate::isa::{AddressingMode, DoubleOperandOpcode, JumpOpcode, OperandWidth, Register, SingleOperandOpcode};

/// A single operand's addressing mode, register, and (if the mode carries
/// one) its 16-bit extension-word operand, already widened to a `Bv` even
/// when it originated as a concrete integer (spec §3).
#[derive(Debug, Clone)]
pub struct Operand<'ctx> {
    pub mode: AddressingMode,
    pub register: Register,
    pub extension: Option<Bv<'ctx>>,
}

#[derive(Debug, Clone)]
pub enum Instruction<'ctx> {
    Single {
        raw: Vec<u8>,
        source_address: u16,
        opcode: SingleOperandOpcode,
        width: OperandWidth,
        operand: Operand<'ctx>,
    },
    Jump {
        raw: Vec<u8>,
        source_address: u16,
        opcode: JumpOpcode,
        target: Bv<'ctx>,
    },
    Double {
        raw: Vec<u8>,
        source_address: u16,
        opcode: DoubleOperandOpcode,
        width: OperandWidth,
        src: Operand<'ctx>,
        dst: Operand<'ctx>,
    },
}

impl<'ctx> Instruction<'ctx> {
    /// Encoded length in bytes: `2 + has_src_operand*2 + has_dst_operand*2`.
    pub fn len(&self) -> u16 {
        match self {
            Instruction::Single { operand, .. } => 2 + if operand.extension.is_some() { 2 } else { 0 },
            Instruction::Jump { .. } => 2,
            Instruction::Double { src, dst, .. } => {
                2 + if src.extension.is_some() { 2 } else { 0 } + if dst.extension.is_some() { 2 } else { 0 }
            }
        }
    }

    pub fn source_address(&self) -> u16 {
        match self {
            Instruction::Single { source_address, .. }
            | Instruction::Jump { source_address, .. }
            | Instruction::Double { source_address, .. } => *source_address,
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Instruction::Single { raw, .. } | Instruction::Jump { raw, .. } | Instruction::Double { raw, .. } => raw,
        }
    }

    /// Pattern recognized by the CFG tool and the lookahead optimization:
    /// `RET` is `MOV @SP+, PC` and `RETI` is its own single-operand opcode.
    /// Both end a straight-line lookahead (spec §4.1 edge case).
    pub fn is_return_like(&self) -> bool {
        match self {
            Instruction::Single { opcode, .. } => matches!(opcode, SingleOperandOpcode::Reti),
            Instruction::Double {
                opcode: DoubleOperandOpcode::Mov,
                src,
                dst,
                ..
            } => {
                src.mode == AddressingMode::AutoIncrement
                    && src.register == Register::SP
                    && dst.mode == AddressingMode::Direct
                    && dst.register == Register::PC
            }
            _ => false,
        }
    }
}
