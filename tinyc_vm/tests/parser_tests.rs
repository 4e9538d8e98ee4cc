//! Parser-level invariants that don't need a running VM: scope isolation,
//! redeclaration, call-site validation, and native-signature checking.

use std::os::raw::c_void;

use tinyc_vm::ffi::NativeRegistry;
use tinyc_vm::value::ValueKind;
use tinyc_vm::{parse, ParseError};

fn parse_ok(source: &str) {
    let natives = NativeRegistry::empty();
    parse(source, &natives).unwrap_or_else(|e| panic!("expected parse to succeed, got {e}"));
}

fn parse_err(source: &str) -> ParseError {
    let natives = NativeRegistry::empty();
    parse(source, &natives).expect_err("expected a parse error")
}

#[test]
fn function_locals_do_not_leak_into_the_root_scope() {
    let err = parse_err("int f() { long inner = 1; return 0; } print inner;");
    assert!(matches!(err, ParseError::UnknownIdentifier { name, .. } if name == "inner"));
}

#[test]
fn redeclaration_in_the_same_frame_is_rejected_even_across_nested_blocks() {
    let err = parse_err("long x = 1; { long x = 2; }");
    assert!(matches!(err, ParseError::Redeclaration { name, .. } if name == "x"));
}

#[test]
fn a_for_loops_own_variable_does_not_leak_past_it() {
    let err = parse_err("for (long i = 0; i < 1; i++) { } print i;");
    assert!(matches!(err, ParseError::UnknownIdentifier { name, .. } if name == "i"));
}

#[test]
fn calling_an_undeclared_function_is_an_error() {
    let err = parse_err("print missing(1);");
    assert!(matches!(err, ParseError::UnknownFunction { name, .. } if name == "missing"));
}

#[test]
fn self_recursion_is_allowed() {
    parse_ok("long f(long n) { return f(n); }");
}

#[test]
fn argument_count_mismatch_is_an_error() {
    let err = parse_err("int f(int a) { return a; } print f(1, 2);");
    assert!(matches!(err, ParseError::ArgumentCountMismatch { expected: 1, found: 2, .. }));
}

#[test]
fn return_outside_a_function_is_an_error() {
    let err = parse_err("return 1;");
    assert!(matches!(err, ParseError::ReturnOutsideFunction { .. }));
}

#[test]
fn void_function_returning_a_value_is_an_error() {
    let err = parse_err("void f() { return 1; }");
    assert!(matches!(err, ParseError::UnexpectedReturnValue { .. }));
}

#[test]
fn non_void_function_returning_nothing_is_an_error() {
    let err = parse_err("int f() { return; }");
    assert!(matches!(err, ParseError::MissingReturnValue { .. }));
}

#[test]
fn native_declaration_matching_the_loaded_signature_succeeds() {
    extern "C" fn noop(_n: i64) -> i64 {
        0
    }
    let mut natives = NativeRegistry::empty();
    natives.register("mod::fn", ValueKind::Int, vec![ValueKind::Int], noop as *const c_void);
    parse(r#"@native("mod::fn") int f(int a);"#, &natives).expect("signature matches");
}

#[test]
fn native_declaration_with_a_mismatched_signature_is_rejected() {
    extern "C" fn noop(_n: i64) -> i64 {
        0
    }
    let mut natives = NativeRegistry::empty();
    natives.register("mod::fn", ValueKind::Int, vec![ValueKind::Long], noop as *const c_void);
    let err = parse(r#"@native("mod::fn") int f(int a);"#, &natives).unwrap_err();
    assert!(matches!(err, ParseError::NativeSignatureMismatch { .. }));
}

#[test]
fn native_declaration_for_an_unexported_name_is_rejected() {
    let natives = NativeRegistry::empty();
    let err = parse(r#"@native("nope") int f(int a);"#, &natives).unwrap_err();
    assert!(matches!(err, ParseError::NativeSignatureMismatch { .. }));
}

#[test]
fn parse_error_line_is_the_offending_source_line() {
    let err = parse_err("long x = 1;\nlong x = 2;\n");
    assert_eq!(err.line(), 2);
}
