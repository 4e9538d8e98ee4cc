//! VM-level invariants driven end-to-end through the public `parse` /
//! `compile` / `Vm` API: arithmetic error propagation, local-store bounds,
//! and the boolean-vs-numeric print distinction.

use pretty_assertions::assert_eq;

use tinyc_vm::ffi::NativeRegistry;
use tinyc_vm::{compile, parse, Vm, VmConfig, VmError};

fn compile_source(source: &str) -> Vec<u8> {
    let natives = NativeRegistry::empty();
    let program = parse(source, &natives).expect("parse");
    compile(&program).expect("compile")
}

#[test]
fn division_by_zero_surfaces_as_a_vm_error_not_a_panic() {
    let bytecode = compile_source("print 1 / 0;");
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &VmConfig::default(), &mut out, NativeRegistry::empty()).unwrap();
    let err = vm.run().unwrap_err();
    assert!(matches!(err, VmError::Value(_)));
}

#[test]
fn a_locals_capacity_too_small_for_the_program_is_a_local_out_of_range_error() {
    let bytecode = compile_source("long x = 1; print x;");
    let config = VmConfig { locals_capacity: 0, ..VmConfig::default() };
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &config, &mut out, NativeRegistry::empty()).unwrap();
    let err = vm.run().unwrap_err();
    assert!(matches!(err, VmError::LocalOutOfRange { index: 0 }));
}

#[test]
fn boolean_not_prints_as_true_or_false() {
    let bytecode = compile_source("print !false;");
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &VmConfig::default(), &mut out, NativeRegistry::empty()).unwrap();
    vm.run().unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "true\n");
}

#[test]
fn bitwise_not_stays_numeric_and_in_the_operands_own_kind() {
    let bytecode = compile_source("long x = 5; print ~x;");
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &VmConfig::default(), &mut out, NativeRegistry::empty()).unwrap();
    vm.run().unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "-6\n");
}

#[test]
fn while_loops_reevaluate_their_condition_each_iteration() {
    let bytecode = compile_source("long i = 0; while (i < 5) { i += 1; } print i;");
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &VmConfig::default(), &mut out, NativeRegistry::empty()).unwrap();
    vm.run().unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "5\n");
}
