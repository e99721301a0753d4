//! Flag-relevance lookahead (spec §4.4): an intentionally unsound
//! optimization that skips materializing a status flag when no nearby
//! conditional branch consumes it.

use bitflags::bitflags;
use z3::ast::Bool;

use crate::consts::LOOKAHEAD_INSTRUCTIONS;
use crate::isa::{Instruction, JumpOpcode};
use crate::state::State;

bitflags! {
    /// Which of N/Z/C/V a flag-producing opcode should actually compute
    /// along this path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FlagSet: u8 {
        const N = 0b0001;
        const Z = 0b0010;
        const C = 0b0100;
        const V = 0b1000;
    }
}

impl FlagSet {
    pub const NONE: FlagSet = FlagSet::empty();

    pub fn all_flags() -> FlagSet {
        FlagSet::N | FlagSet::Z | FlagSet::C | FlagSet::V
    }
}

fn flags_consumed_by(opcode: JumpOpcode) -> FlagSet {
    match opcode {
        JumpOpcode::Jn => FlagSet::N,
        JumpOpcode::Jge | JumpOpcode::Jl => FlagSet::N | FlagSet::V,
        JumpOpcode::Jnz | JumpOpcode::Jz => FlagSet::Z,
        JumpOpcode::Jnc | JumpOpcode::Jc => FlagSet::C,
        JumpOpcode::Jmp => FlagSet::NONE,
    }
}

/// Which flags are actually worth computing for the instruction currently
/// at `state`'s (already-advanced) PC. When `enable_unsound_optimizations`
/// is false, every flag-producing opcode always materializes all four
/// flags, which is sound but forks far more aggressively (spec §4.4).
pub fn relevant_flags<'ctx>(state: &State<'ctx>, enable_unsound_optimizations: bool) -> FlagSet {
    if !enable_unsound_optimizations {
        return FlagSet::all_flags();
    }
    let Some(pc) = state.concrete_pc() else {
        return FlagSet::all_flags();
    };
    let lookahead = state.decode_some_instructions(pc, LOOKAHEAD_INSTRUCTIONS);
    let mut found = FlagSet::NONE;
    for (_, instr) in &lookahead {
        if let Instruction::Jump { opcode, .. } = instr {
            found |= flags_consumed_by(*opcode);
        }
    }
    if found.is_empty() {
        tracing::debug!(target: "msp430_symex::cpu", pc, "lookahead found no flag consumers; eliding all flags");
    }
    found
}

/// One flag-producing opcode's worth of status updates: the flag bit, and
/// the condition under which it's set.
pub struct FlagUpdate<'ctx> {
    pub flag: FlagSet,
    pub mask: u16,
    pub condition: Bool<'ctx>,
}

/// Materialize `updates` against `relevant`, branching `state` into one
/// clone per flag actually computed: a "flag set" and "flag unset" sibling,
/// each constrained with the predicate that pins the flag down (spec §4.3,
/// §4.4). Flags the lookahead judged irrelevant are left untouched in every
/// resulting clone.
pub fn fork_on_flags<'ctx>(state: State<'ctx>, relevant: FlagSet, updates: &[FlagUpdate<'ctx>]) -> Vec<State<'ctx>> {
    let mut states = vec![state];
    for update in updates {
        if !relevant.contains(update.flag) {
            continue;
        }
        let mut next = Vec::with_capacity(states.len() * 2);
        for s in states {
            let mut set_true = s.clone();
            set_true.path.add(update.condition.clone());
            set_true.cpu.registers.set_flag(update.mask, true);

            let mut set_false = s;
            set_false.path.add(update.condition.not());
            set_false.cpu.registers.set_flag(update.mask, false);

            next.push(set_true);
            next.push(set_false);
        }
        states = next;
    }
    states
}
