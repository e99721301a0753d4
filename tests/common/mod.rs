//! Shared test scaffolding: a blank in-memory state, a satisfiable-branch
//! picker, and a parser for the microcorruption `xxd`-style memory dumps
//! used by `original_source/tests/test_problems.py`.

#![allow(dead_code)]

use msp430_symex::consts::MEMORY_SIZE;
use msp430_symex::prelude::*;
use msp430_symex::solver::PredicateCache;
use z3::{Config, Context};

pub fn new_context() -> Context {
    Context::new(&Config::new())
}

/// An all-zero 0x10000-byte image with PC set to `entry`. Flag-relevance
/// lookahead is disabled so a test can check every flag an opcode produces
/// without worrying about the straight-line decode of zero bytes (all
/// `RRC R0`) eliding some of them.
pub fn blank_state<'ctx>(ctx: &'ctx Context, entry: u16) -> State<'ctx> {
    let image = [0u8; MEMORY_SIZE];
    let memory = Memory::from_image(ctx, &image);
    let mut state = State::new(ctx, memory, entry, PredicateCache::new());
    state.enable_unsound_optimizations = false;
    state
}

/// Pick the one state (of a flag/branch fork) whose path is still
/// satisfiable; panics if that isn't exactly one, since every condition in
/// these tests is built from concrete values.
pub fn only_sat<'ctx>(states: Vec<State<'ctx>>) -> State<'ctx> {
    let mut sat: Vec<State<'ctx>> = states.into_iter().filter(|s| s.path.is_sat().unwrap()).collect();
    assert_eq!(sat.len(), 1, "expected exactly one satisfiable successor");
    sat.remove(0)
}

/// Parse an `xxd`-style dump (`ADDR:   hex hex ...   ascii`) into a full
/// memory image. A bare `*` line stands in for a run of all-zero rows
/// between two explicit addresses, which is already this image's default,
/// so it's simply skipped.
pub fn load_dump(dump: &str) -> [u8; MEMORY_SIZE] {
    let mut image = [0u8; MEMORY_SIZE];

    for line in dump.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((addr_str, rest)) = line.split_once(':') else { continue };
        let addr = usize::from_str_radix(addr_str.trim(), 16).expect("hex address");
        let rest = rest.trim_start();

        if rest.starts_with('*') {
            continue;
        }

        let hex_part = match rest.find("  ") {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        let mut row = [0u8; 16];
        let mut n = 0;
        for group in hex_part.split_whitespace() {
            let b0 = u8::from_str_radix(&group[0..2], 16).expect("hex byte");
            let b1 = u8::from_str_radix(&group[2..4], 16).expect("hex byte");
            row[n] = b0;
            row[n + 1] = b1;
            n += 2;
        }

        image[addr..addr + n].copy_from_slice(&row[..n]);
    }

    image
}
