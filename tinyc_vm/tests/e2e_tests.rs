//! End-to-end scenarios: source text through the full
//! parse -> compile -> run pipeline, asserting on captured stdout bytes.

use std::os::raw::c_void;

use pretty_assertions::assert_eq;

use tinyc_vm::ffi::NativeRegistry;
use tinyc_vm::value::ValueKind;
use tinyc_vm::{compile, parse, Vm, VmConfig};

fn run_with(source: &str, natives: NativeRegistry) -> String {
    let program = parse(source, &natives).expect("parse");
    let bytecode = compile(&program).expect("compile");
    let mut out = Vec::new();
    let mut vm = Vm::with_natives(bytecode, &VmConfig::default(), &mut out, natives).expect("vm init");
    vm.run().expect("run");
    drop(vm);
    String::from_utf8(out).expect("utf8 stdout")
}

fn run(source: &str) -> String {
    run_with(source, NativeRegistry::empty())
}

#[test]
fn scenario_1_arithmetic_precedence() {
    assert_eq!(run("print 1 + 3 * 5;"), "16\n");
}

#[test]
fn scenario_2_for_loop_accumulation() {
    let source = "long x = 0; for (long i = 0; i < 3; i++) { x += i; } print x;";
    assert_eq!(run(source), "3\n");
}

#[test]
fn scenario_3_function_call() {
    let source = "int add(int a, int b) { return a + b; } print add(6, 7);";
    assert_eq!(run(source), "13\n");
}

#[test]
fn scenario_4_recursive_fibonacci() {
    let source = "long fib(long n) { if (n == 1 or n == 2) { return n; } return fib(n-1) + fib(n-2); } \
                  for (long i=1;i<10;i++) { print fib(i); }";
    assert_eq!(run(source), "1\n2\n3\n5\n8\n13\n21\n34\n55\n");
}

#[test]
fn scenario_5_cross_type_promotion() {
    let source = "bool x = 1; long y = 1; print x + y;";
    assert_eq!(run(source), "2\n");
}

#[test]
fn scenario_6_native_call() {
    extern "C" fn twice(n: i64) -> i64 {
        n * 2
    }

    let mut natives = NativeRegistry::empty();
    natives.register("math::twice", ValueKind::Long, vec![ValueKind::Long], twice as *const c_void);

    let source = "@native(\"math::twice\") long twice(long n); print twice(100);";
    assert_eq!(run_with(source, natives), "200\n");
}

#[test]
fn scenario_7_if_else() {
    let source = "if (1 != 1) { print 1; } else { print 2; }";
    assert_eq!(run(source), "2\n");
}
