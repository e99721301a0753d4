//! [`State`]: the unit of exploration (spec §3 "State").

use z3::Context;

use crate::consts::MAX_INSTRUCTION_BYTES;
use crate::cpu::Cpu;
use crate::decoder;
use crate::error::ExecError;
use crate::io::IoStream;
use crate::isa::instruction::Instruction;
use crate::memory::Memory;
use crate::path::Path;
use crate::solver::PredicateCache;

/// Composition of a CPU (register file), byte-addressable memory, a path
/// predicate, input/output streams, and the `unlocked`/`ticks` bookkeeping
/// the exploration engine needs. Instructions are produced by the decoder
/// and never mutated; a `State` is cloned at every step boundary and
/// mutations thereafter are local to that clone (spec §3 "Lifecycle").
#[derive(Clone)]
pub struct State<'ctx> {
    ctx: &'ctx Context,
    pub cpu: Cpu<'ctx>,
    pub memory: Memory<'ctx>,
    pub path: Path<'ctx>,
    pub input: IoStream<'ctx>,
    pub output: IoStream<'ctx>,
    pub unlocked: bool,
    pub ticks: u64,
    /// Whether flag-producing opcodes may skip materializing a status flag
    /// the flag-relevance lookahead judges irrelevant (spec §4.4). Carried
    /// on `State` rather than threaded as a handler argument so every clone
    /// along a path agrees on it without a global.
    pub enable_unsound_optimizations: bool,
}

impl<'ctx> State<'ctx> {
    pub fn new(ctx: &'ctx Context, memory: Memory<'ctx>, entry: u16, cache: PredicateCache) -> Self {
        Self {
            ctx,
            cpu: Cpu::new(ctx, entry),
            memory,
            path: Path::new(ctx, cache),
            input: IoStream::new_input(ctx),
            output: IoStream::new_output(ctx),
            unlocked: false,
            ticks: 0,
            enable_unsound_optimizations: cfg!(feature = "unsound-opt"),
        }
    }

    pub fn ctx(&self) -> &'ctx Context {
        self.ctx
    }

    /// Full copy-on-write clone with `ticks` advanced by one (spec §3).
    pub fn forked(&self) -> Self {
        let mut next = self.clone();
        next.ticks += 1;
        next
    }

    /// `true` iff the program counter is a non-constant expression: such a
    /// state is set aside in the `symbolic` bucket rather than executed
    /// (spec Non-goals: unbounded successor sets aren't explored here).
    pub fn has_symbolic_ip(&self) -> bool {
        self.cpu.registers.pc().as_concrete().is_none()
    }

    /// The concrete program counter, if any.
    pub fn concrete_pc(&self) -> Option<u16> {
        self.cpu.registers.pc().as_concrete().map(|v| v as u16)
    }

    /// Fetch, decode, and execute one instruction, returning its
    /// successor states. The PC is pre-incremented by the decoded length
    /// on a clone before dispatch; opcode handlers clone further as
    /// needed (conditional jumps and flag materialization fork).
    pub fn step(&self) -> Result<Vec<State<'ctx>>, ExecError> {
        let pc = self.concrete_pc().ok_or(ExecError::SymbolicMemoryAddress {
            context: "instruction fetch",
        })?;

        let mut window = [0u8; MAX_INSTRUCTION_BYTES];
        for (i, slot) in window.iter_mut().enumerate() {
            let addr = pc.wrapping_add(i as u16);
            *slot = self.memory.read_byte_at(addr).as_concrete().unwrap_or(0) as u8;
        }

        let (instruction, len) = decoder::decode_concrete(self.ctx, pc, &window)?;
        tracing::trace!(target: "msp430_symex::state", pc, ?len, "decoded instruction");

        let mut base = self.forked();
        let next_pc = crate::bv::Bv::constant(self.ctx, pc.wrapping_add(len) as u64, 16);
        base.cpu.registers.set_pc(next_pc);

        crate::cpu::dispatch(&base, &instruction)
    }

    /// Statically decode up to `n` instructions from `address`, stopping
    /// at a return-like instruction. A pure read of the concrete memory
    /// image (spec §3); used by the flag-relevance lookahead (§4.4).
    /// Returns fewer than `n` entries if a byte along the way isn't
    /// concrete or doesn't decode.
    pub fn decode_some_instructions(&self, address: u16, n: usize) -> Vec<(u16, Instruction<'ctx>)> {
        let window_len = n.saturating_mul(MAX_INSTRUCTION_BYTES);
        let mut bytes = Vec::with_capacity(window_len);
        for i in 0..window_len {
            let addr = address.wrapping_add(i as u16);
            match self.memory.read_byte_at(addr).as_concrete() {
                Some(v) => bytes.push(v as u8),
                None => break,
            }
        }
        decoder::decode_program(self.ctx, address, &bytes, n)
    }
}
