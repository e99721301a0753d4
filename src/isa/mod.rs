//! Instruction-set types: opcodes, addressing modes, operand width, and
//! register naming. Grounded on `fuel-asm/src/opcode.rs`'s enum-with-doc-table
//! style, adapted to the MSP430's three instruction families instead of a
//! single flat opcode byte.

pub mod instruction;

use std::fmt;

use strum::Display;

pub use instruction::Instruction;

/// One of the sixteen general-purpose registers. R0 is the program
/// counter, R1 the stack pointer, R2 the status register and constant
/// generator, R3 the pure constant generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(u8);

impl Register {
    pub const PC: Register = Register(0);
    pub const SP: Register = Register(1);
    pub const SR: Register = Register(2);
    pub const CG: Register = Register(3);

    /// Construct from a 0..15 index.
    pub fn from_index(idx: u8) -> Self {
        debug_assert!(idx < 16, "register index out of range: {idx}");
        Register(idx & 0x0f)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Case-insensitive lookup by name, e.g. `"r12"`, `"R12"`, `"sp"`, `"pc"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "pc" => return Some(Self::PC),
            "sp" => return Some(Self::SP),
            "sr" => return Some(Self::SR),
            "cg" => return Some(Self::CG),
            _ => {}
        }
        let digits = lower.strip_prefix('r')?;
        let idx: u8 = digits.parse().ok()?;
        (idx < 16).then(|| Register::from_index(idx))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Operand width. Determines operand size and, for register destinations,
/// whether the high byte is zeroed on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OperandWidth {
    Word,
    Byte,
}

impl OperandWidth {
    pub fn bits(self) -> u32 {
        match self {
            OperandWidth::Word => 16,
            OperandWidth::Byte => 8,
        }
    }

    pub fn from_bit(word_bit_is_byte: bool) -> Self {
        if word_bit_is_byte {
            OperandWidth::Byte
        } else {
            OperandWidth::Word
        }
    }
}

/// Addressing mode, including the special constant-generator and
/// PC-relative forms folded in by the decoder (spec §3) so the executor
/// never has to special-case "register R3 in mode 01" as a normal read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AddressingMode {
    Direct,
    Indexed,
    Indirect,
    AutoIncrement,
    /// PC-relative: `mem[PC + disp]`. The decoder stores `disp` as-is; the
    /// executor adds the (already-advanced) PC at use time.
    Symbolic,
    Immediate,
    Absolute,
    Constant0,
    Constant1,
    Constant2,
    Constant4,
    Constant8,
    ConstantNeg1,
}

impl AddressingMode {
    /// Literal value for the six constant-generator variants; `None` for
    /// every other mode.
    pub fn constant_value(self) -> Option<i64> {
        match self {
            AddressingMode::Constant0 => Some(0),
            AddressingMode::Constant1 => Some(1),
            AddressingMode::Constant2 => Some(2),
            AddressingMode::Constant4 => Some(4),
            AddressingMode::Constant8 => Some(8),
            AddressingMode::ConstantNeg1 => Some(-1),
            _ => None,
        }
    }

    pub fn is_constant_generator(self) -> bool {
        self.constant_value().is_some()
    }

    /// Whether this mode consumes a trailing 16-bit extension word when
    /// used as a single-operand or double-operand *source*.
    pub fn has_extension_word_as_source(self) -> bool {
        matches!(
            self,
            AddressingMode::Immediate | AddressingMode::Indexed | AddressingMode::Symbolic | AddressingMode::Absolute
        )
    }

    /// Whether this mode consumes a trailing 16-bit extension word when
    /// used as a double-operand *destination*. Destinations are restricted
    /// to `{Direct, Indexed, Symbolic, Absolute}` (spec §3).
    pub fn has_extension_word_as_dest(self) -> bool {
        matches!(
            self,
            AddressingMode::Indexed | AddressingMode::Symbolic | AddressingMode::Absolute
        )
    }
}

/// Single-operand (format II) opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SingleOperandOpcode {
    Rrc,
    Swpb,
    Rra,
    Sxt,
    Push,
    Call,
    Reti,
}

/// Conditional/unconditional jump (format III) opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum JumpOpcode {
    Jnz,
    Jz,
    Jnc,
    Jc,
    Jn,
    Jge,
    Jl,
    Jmp,
}

/// Double-operand (format I) opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DoubleOperandOpcode {
    Mov,
    Add,
    Addc,
    Subc,
    Sub,
    Cmp,
    Dadd,
    Bit,
    Bic,
    Bis,
    Xor,
    And,
}

/// The decoded opcode, tagged by instruction family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Single(SingleOperandOpcode),
    Jump(JumpOpcode),
    Double(DoubleOperandOpcode),
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Single(op) => write!(f, "{op}"),
            Opcode::Jump(op) => write!(f, "{op}"),
            Opcode::Double(op) => write!(f, "{op}"),
        }
    }
}
