//! Engine-wide constants.

/// Number of general-purpose registers (R0..R15).
pub const REGISTER_COUNT: usize = 16;

/// Program counter register index.
pub const REG_PC: usize = 0;

/// Stack pointer register index.
pub const REG_SP: usize = 1;

/// Status register index. Also the constant-generator partner of R3.
pub const REG_SR: usize = 2;

/// Constant-generator-only register index.
pub const REG_CG: usize = 3;

/// Carry flag bit in the status register.
pub const FLAG_C: u16 = 0x0001;

/// Zero flag bit in the status register.
pub const FLAG_Z: u16 = 0x0002;

/// Negative flag bit in the status register.
pub const FLAG_N: u16 = 0x0004;

/// Overflow flag bit in the status register.
pub const FLAG_V: u16 = 0x0100;

/// Address of the MSP430 "callgate": a `CALL` to this address dispatches
/// through the interrupt table on the high 7 bits of R2.
pub const CALLGATE_ADDRESS: u16 = 0x0010;

/// Top of addressable memory (inclusive).
pub const MEMORY_TOP: u32 = 0xFFFF;

/// Size of the flat memory image.
pub const MEMORY_SIZE: usize = 0x10000;

/// Sentinel byte substituted for unconstrained witness bytes (§6).
pub const WITNESS_SENTINEL: u8 = 0xC0;

/// Bound on the flag-relevance lookahead of spec §4.4: at most this many
/// instructions are statically decoded along the fall-through path.
pub const LOOKAHEAD_INSTRUCTIONS: usize = 6;

/// Maximum byte length of a single MSP430 instruction encoding.
pub const MAX_INSTRUCTION_BYTES: usize = 6;

/// `PathGroup` active-state fanout threshold from spec §4.6: above this
/// many active states, selection favors depth (max ticks) over breadth
/// (min ticks).
pub const ACTIVE_FANOUT_THRESHOLD: usize = 64;

/// Interrupt numbers recognized by the callgate dispatch table (§4.5).
pub mod interrupt {
    pub const PUTCHAR: u8 = 0x00;
    pub const GETCHAR: u8 = 0x01;
    pub const GETS: u8 = 0x02;
    pub const ENABLEDEP: u8 = 0x10;
    pub const SETPAGEPERMS: u8 = 0x11;
    pub const RAND: u8 = 0x20;
    pub const HSM1CHECK: u8 = 0x7d;
    pub const HSM2CHECK: u8 = 0x7e;
    pub const UNLOCK: u8 = 0x7f;
}
