//! Operand read/write semantics (spec §4.2).

use z3::Context;

use crate::bv::Bv;
use crate::error::ExecError;
use crate::isa::instruction::Operand;
use crate::isa::{AddressingMode, OperandWidth, Register};
use crate::state::State;

/// Where an operand's value lives, after any addressing side effect
/// (auto-increment) has already been applied. Resolving once and sharing
/// the `Location` between a read and a matching write is what keeps a
/// single-operand read-modify-write from auto-incrementing twice.
pub enum Location<'ctx> {
    Register(Register),
    Memory(u16),
    /// `IMMEDIATE` or a constant-generator mode: a literal value, not a
    /// place. Writing to one is `IllegalWriteTarget`.
    Literal(Bv<'ctx>),
}

fn width_name(width: OperandWidth) -> &'static str {
    match width {
        OperandWidth::Word => "word",
        OperandWidth::Byte => "byte",
    }
}

fn truncate_to_width<'ctx>(ctx: &'ctx Context, value: &Bv<'ctx>, width: OperandWidth) -> Bv<'ctx> {
    match width {
        OperandWidth::Word => value.clone(),
        OperandWidth::Byte if value.width() == 16 => value.extract(7, 0),
        OperandWidth::Byte => value.clone(),
    }
}

/// Resolve an operand to a [`Location`], applying the auto-increment side
/// effect to the register file if applicable. Must be called exactly once
/// per operand occurrence in an instruction.
pub fn resolve<'ctx>(state: &mut State<'ctx>, op: &Operand<'ctx>, width: OperandWidth) -> Result<Location<'ctx>, ExecError> {
    let ctx = state.ctx();
    match op.mode {
        AddressingMode::Direct => Ok(Location::Register(op.register)),

        AddressingMode::Indirect => {
            let base = state.cpu.registers.get(op.register);
            let addr = base.as_concrete().map(|v| v as u16).ok_or(ExecError::SymbolicMemoryAddress {
                context: "indirect operand",
            })?;
            Ok(Location::Memory(addr))
        }

        AddressingMode::AutoIncrement => {
            let base = state.cpu.registers.get(op.register);
            let addr = base.as_concrete().map(|v| v as u16).ok_or(ExecError::SymbolicMemoryAddress {
                context: "auto-increment operand",
            })?;
            let step: u64 = if op.register == Register::PC || op.register == Register::SP {
                2
            } else {
                match width {
                    OperandWidth::Word => 2,
                    OperandWidth::Byte => 1,
                }
            };
            let new_base = base.add(&Bv::constant(ctx, step, 16));
            state.cpu.registers.set(op.register, new_base);
            Ok(Location::Memory(addr))
        }

        AddressingMode::Indexed => {
            let base = state.cpu.registers.get(op.register);
            let disp = op.extension.clone().expect("INDEXED operand must carry a displacement");
            let addr = base.add(&disp);
            let addr = addr
                .as_concrete()
                .map(|v| v as u16)
                .ok_or(ExecError::SymbolicMemoryAddress { context: "indexed operand" })?;
            Ok(Location::Memory(addr))
        }

        AddressingMode::Symbolic => {
            let pc_now = state.cpu.registers.pc();
            let disp = op.extension.clone().expect("SYMBOLIC operand must carry a displacement");
            let addr = pc_now.add(&disp);
            let addr = addr
                .as_concrete()
                .map(|v| v as u16)
                .ok_or(ExecError::SymbolicMemoryAddress { context: "PC-relative operand" })?;
            Ok(Location::Memory(addr))
        }

        AddressingMode::Absolute => {
            let disp = op.extension.clone().expect("ABSOLUTE operand must carry an address");
            let addr = disp
                .as_concrete()
                .map(|v| v as u16)
                .ok_or(ExecError::SymbolicMemoryAddress { context: "absolute operand" })?;
            Ok(Location::Memory(addr))
        }

        AddressingMode::Immediate => {
            let disp = op.extension.clone().expect("IMMEDIATE operand must carry a value");
            Ok(Location::Literal(truncate_to_width(ctx, &disp, width)))
        }

        mode if mode.is_constant_generator() => {
            let value = mode.constant_value().expect("checked is_constant_generator");
            let literal = Bv::constant(ctx, value as i64 as u64 & 0xffff, 16);
            Ok(Location::Literal(truncate_to_width(ctx, &literal, width)))
        }

        _ => unreachable!("all AddressingMode variants handled above"),
    }
}

/// Read the value at a resolved [`Location`]. Takes `&mut State` (rather
/// than `&State`) because a word-width memory read adds an alignment
/// constraint to the path (spec §4.2 edge case).
pub fn read<'ctx>(state: &mut State<'ctx>, location: &Location<'ctx>, width: OperandWidth) -> Result<Bv<'ctx>, ExecError> {
    let ctx = state.ctx();
    match location {
        Location::Register(reg) => Ok(truncate_to_width(ctx, &state.cpu.registers.get(*reg), width)),
        Location::Memory(addr) => match width {
            OperandWidth::Word => {
                let addr_bv = Bv::constant(ctx, *addr as u64, 16);
                state.memory.read_word(&addr_bv, &mut state.path)
            }
            OperandWidth::Byte => Ok(state.memory.read_byte_at(*addr)),
        },
        Location::Literal(value) => Ok(value.clone()),
    }
}

pub fn write<'ctx>(state: &mut State<'ctx>, location: &Location<'ctx>, width: OperandWidth, value: Bv<'ctx>) -> Result<(), ExecError> {
    let ctx = state.ctx();
    match location {
        Location::Register(reg) => {
            let widened = match width {
                OperandWidth::Word => value,
                OperandWidth::Byte => Bv::constant(ctx, 0, 8).concat(&value),
            };
            state.cpu.registers.set(*reg, widened);
            Ok(())
        }
        Location::Memory(addr) => match width {
            OperandWidth::Word => {
                let addr_bv = Bv::constant(ctx, *addr as u64, 16);
                state.memory.write_word(&addr_bv, value, &mut state.path)
            }
            OperandWidth::Byte => {
                state.memory.write_byte_at(*addr, value);
                Ok(())
            }
        },
        Location::Literal(_) => Err(ExecError::IllegalWriteTarget {
            mode: width_name(width),
        }),
    }
}
