//! Copy-on-write behavior tests (spec §3, §5): a write through one forked
//! state must never be observed by a sibling, while the process-wide
//! predicate cache and `IoStream` name counter must stay shared across the
//! same fork.

mod common;

use msp430_symex::prelude::*;
use z3::ast::Ast;

#[test]
fn memory_write_on_one_fork_is_invisible_to_its_sibling() {
    let ctx = common::new_context();
    let base = common::blank_state(&ctx, 0x4400);

    let mut a = base.clone();
    let b = base.clone();

    a.memory.write_byte_at(0x3000, Bv::constant(&ctx, 0x42, 8));

    assert_eq!(a.memory.read_byte_at(0x3000).as_concrete(), Some(0x42));
    assert_eq!(b.memory.read_byte_at(0x3000).as_concrete(), Some(0));
}

#[test]
fn path_constraint_on_one_fork_does_not_grow_its_sibling() {
    let ctx = common::new_context();
    let base = common::blank_state(&ctx, 0x4400);

    let mut a = base.clone();
    let b = base.clone();

    assert_eq!(a.path.len(), b.path.len());
    a.path.add(z3::ast::Bool::from_bool(&ctx, true));

    assert_eq!(a.path.len(), b.path.len() + 1);
}

#[test]
fn io_stream_growth_on_one_fork_does_not_appear_on_its_sibling() {
    let ctx = common::new_context();
    let base = common::blank_state(&ctx, 0x4400);

    let mut a = base.clone();
    let b = base.clone();

    a.input.generate_input(4);

    assert_eq!(a.input.bytes().len(), 4);
    assert_eq!(b.input.bytes().len(), 0);
}

#[test]
fn io_stream_name_counter_is_shared_across_sibling_forks() {
    let ctx = common::new_context();
    let base = common::blank_state(&ctx, 0x4400);

    let mut a = base.clone();
    let mut b = base.clone();

    let from_a = a.input.generate_input(2);
    let from_b = b.input.generate_input(2);

    // Both siblings only see their own two bytes...
    assert_eq!(a.input.bytes().len(), 2);
    assert_eq!(b.input.bytes().len(), 2);

    // ...but the shared counter means none of the four fresh variables
    // collide in name, even though neither sibling observed the other's
    // `generate_input` call.
    let names: Vec<String> = from_a.iter().chain(from_b.iter()).map(|b| format!("{b:?}")).collect();
    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), names.len(), "fresh input variable names must not collide: {names:?}");
}

#[test]
fn predicate_cache_is_shared_across_forks_of_the_same_path() {
    let ctx = common::new_context();
    let base = common::blank_state(&ctx, 0x4400);

    let mut a = base.clone();
    a.path.add(z3::ast::Bool::from_bool(&ctx, true));
    assert!(a.path.is_sat().unwrap());

    // A sibling that reaches the exact same predicate (by building it
    // independently rather than inheriting `a`'s history) hits the same
    // process-wide cache entry: observable indirectly, since both return
    // the same satisfiability verdict without erroring.
    let mut c = base.clone();
    c.path.add(z3::ast::Bool::from_bool(&ctx, true));
    assert!(c.path.is_sat().unwrap());
}
