//! Error taxonomy for the decoder, CPU, and exploration engine.
//!
//! Mirrors the split `fuel-vm` uses in `src/error.rs`: a small error enum
//! per concern, `#[from]` conversions between them, and one aggregate for
//! callers who don't need to match on the source.

use thiserror::Error;

/// Errors raised while classifying a 16-bit instruction word (spec §4.1).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The instruction word matched none of the three MSP430 families, or
    /// named a reserved opcode within a family.
    #[error("instruction word {word:#06x} at {address:#06x} does not decode")]
    MalformedInstruction { address: u16, word: u16 },
}

/// Errors raised while executing a decoded instruction (spec §4.2-§4.5).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// A memory or register access resolved to a non-constant address that
    /// the solver cache could not concretize. Fatal to the state (spec
    /// Non-goals: symbolic addressing is out of scope).
    #[error("memory access at {context} did not concretize to a single address")]
    SymbolicMemoryAddress { context: &'static str },

    /// Attempted to write an `IMMEDIATE` or constant-generator operand.
    #[error("cannot write to a {mode} operand")]
    IllegalWriteTarget { mode: &'static str },

    /// The callgate's interrupt number (R2 bits 14..8) did not concretize.
    #[error("interrupt number did not concretize to a single value")]
    SymbolicInterruptNumber,

    /// An opcode the semantic core deliberately does not model (RRA, RETI,
    /// ADDC, SUBC, DADD, JN, JGE, or an unimplemented interrupt).
    #[error("opcode {0} is not implemented")]
    UnimplementedOpcode(&'static str),

    /// Decoding failed mid-execution (as opposed to during the initial
    /// static decode of a program image).
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Errors surfaced by the SMT backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("solver returned unknown or errored on check-sat")]
    Unknown,
}

/// Aggregate error type for engine-root operations (`PathGroup` setup,
/// entry construction) that can fail in more than one of the above ways.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}
