//! Codegen invariants that only need a compiled program, no running VM:
//! emission determinism and that every decoded instruction stream is
//! exhaustively consumable (a corrupt jump target would desync `Instr::read`
//! well before reaching the end of the buffer).

use pretty_assertions::assert_eq;

use tinyc_vm::ffi::NativeRegistry;
use tinyc_vm::instr::Instr;
use tinyc_vm::{compile, parse};

const FIB_SOURCE: &str = "long fib(long n) { if (n == 1 or n == 2) { return n; } return fib(n-1) + fib(n-2); } \
                           for (long i=1;i<10;i++) { print fib(i); }";

fn compiled(source: &str) -> Vec<u8> {
    let natives = NativeRegistry::empty();
    let program = parse(source, &natives).expect("parse");
    compile(&program).expect("compile")
}

#[test]
fn emitting_the_same_program_twice_is_byte_identical() {
    assert_eq!(compiled(FIB_SOURCE), compiled(FIB_SOURCE));
}

#[test]
fn the_whole_instruction_stream_decodes_cleanly_to_the_end() {
    let bytes = compiled(FIB_SOURCE);
    let mut ip = 0u64;
    let mut saw_halt = false;
    while (ip as usize) < bytes.len() {
        let instr = Instr::read(&bytes, &mut ip).unwrap_or_else(|| {
            panic!("instruction stream desynced at byte offset {ip}");
        });
        saw_halt |= matches!(instr, Instr::Halt);
    }
    assert_eq!(ip as usize, bytes.len());
    assert!(saw_halt, "program must end with a defensive Halt");
}
