//! Callgate interrupt summary tests (spec §4.5), grounded on
//! `original_source/tests/test_interrupt_semantics.py`. These call
//! `msp430_symex::interrupt::dispatch` directly rather than going through a
//! `CALL #0x0010` instruction, matching how the original test suite drives
//! each summary in isolation.

mod common;

use msp430_symex::consts::interrupt;
use msp430_symex::error::ExecError;
use msp430_symex::prelude::*;

fn with_interrupt_number<'ctx>(state: &mut State<'ctx>, number: u8) {
    let ctx = state.ctx();
    let sr = Bv::constant(ctx, (number as u64) << 8, 16);
    state.cpu.registers.set(2usize, sr);
}

#[test]
fn putchar_reads_one_byte_at_sp_plus_six() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    state.cpu.registers.set_sp(Bv::constant(&ctx, 0x1234, 16));
    with_interrupt_number(&mut state, interrupt::PUTCHAR);
    state.memory.write_byte_at(0x1234 + 6, Bv::constant(&ctx, 0x41, 8));

    let successors = msp430_symex::interrupt::dispatch(&state).unwrap();
    assert_eq!(successors.len(), 1);
    let out = successors[0].output.bytes();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].as_concrete(), Some(0x41));
}

#[test]
fn gets_mints_fresh_symbolic_bytes_at_the_destination_pointer() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    state.cpu.registers.set_sp(Bv::constant(&ctx, 0x1000, 16));
    with_interrupt_number(&mut state, interrupt::GETS);

    let dest = 0x2000u16;
    let length = 4u16;
    state
        .memory
        .write_word(&Bv::constant(&ctx, 0x1000 + 6, 16), Bv::constant(&ctx, dest as u64, 16), &mut state.path)
        .unwrap();
    state
        .memory
        .write_word(&Bv::constant(&ctx, 0x1000 + 8, 16), Bv::constant(&ctx, length as u64, 16), &mut state.path)
        .unwrap();

    let successors = msp430_symex::interrupt::dispatch(&state).unwrap();
    assert_eq!(successors.len(), 1);
    let next = &successors[0];

    assert_eq!(next.input.groups().len(), 1);
    assert_eq!(next.input.groups()[0], (0, length as usize));

    for i in 0..length {
        let byte = next.memory.read_byte_at(dest.wrapping_add(i));
        assert!(!byte.is_concrete(), "byte {i} of the gets buffer must be symbolic");
    }
}

#[test]
fn gets_terminator_is_zero_only_when_every_byte_is_forced_nonzero() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    state.cpu.registers.set_sp(Bv::constant(&ctx, 0x1000, 16));
    with_interrupt_number(&mut state, interrupt::GETS);

    let dest = 0x2000u16;
    let length = 2u16;
    state
        .memory
        .write_word(&Bv::constant(&ctx, 0x1000 + 6, 16), Bv::constant(&ctx, dest as u64, 16), &mut state.path)
        .unwrap();
    state
        .memory
        .write_word(&Bv::constant(&ctx, 0x1000 + 8, 16), Bv::constant(&ctx, length as u64, 16), &mut state.path)
        .unwrap();
    // Seed the terminator slot with a non-zero sentinel so a model that
    // forces every input byte non-zero is the only way to observe it
    // turn into 0.
    state.memory.write_byte_at(dest.wrapping_add(length).wrapping_add(1), Bv::constant(&ctx, 0xab, 8));

    let mut next = msp430_symex::interrupt::dispatch(&state).unwrap().remove(0);

    for i in 0..length {
        let byte = next.memory.read_byte_at(dest.wrapping_add(i));
        next.path.add(byte.ne(&Bv::constant(&ctx, 0, 8)));
    }
    let model = next.path.model().unwrap().expect("forcing every byte non-zero is satisfiable");
    let terminator = next.memory.read_byte_at(dest.wrapping_add(length).wrapping_add(1));
    assert_eq!(model.eval_u64(&terminator), Some(0));
}

#[test]
fn hsm1check_and_hsm2check_are_inert() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    with_interrupt_number(&mut state, interrupt::HSM1CHECK);

    let successors = msp430_symex::interrupt::dispatch(&state).unwrap();
    assert_eq!(successors.len(), 1);
    assert!(!successors[0].unlocked);
}

#[test]
fn unlock_marks_the_state_unlocked() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    with_interrupt_number(&mut state, interrupt::UNLOCK);

    let successors = msp430_symex::interrupt::dispatch(&state).unwrap();
    assert_eq!(successors.len(), 1);
    assert!(successors[0].unlocked);
}

#[test]
fn getchar_enabledep_setpageperms_and_rand_are_unimplemented() {
    let ctx = common::new_context();
    for &number in &[interrupt::GETCHAR, interrupt::ENABLEDEP, interrupt::SETPAGEPERMS, interrupt::RAND] {
        let mut state = common::blank_state(&ctx, 0x4400);
        with_interrupt_number(&mut state, number);
        let err = msp430_symex::interrupt::dispatch(&state).unwrap_err();
        assert!(matches!(err, ExecError::UnimplementedOpcode(_)));
    }
}

#[test]
fn unknown_interrupt_number_is_unimplemented() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    with_interrupt_number(&mut state, 0x55);
    let err = msp430_symex::interrupt::dispatch(&state).unwrap_err();
    assert_eq!(err, ExecError::UnimplementedOpcode("interrupt:unknown"));
}

#[test]
fn symbolic_interrupt_number_is_rejected() {
    let ctx = common::new_context();
    let mut state = common::blank_state(&ctx, 0x4400);
    let symbolic = Bv::named(&ctx, "sr_in", 16);
    state.cpu.registers.set(2usize, symbolic);
    let err = msp430_symex::interrupt::dispatch(&state).unwrap_err();
    assert_eq!(err, ExecError::SymbolicInterruptNumber);
}
