//! tinyc command-line driver.
//!
//! Usage:
//!   tinyc source.tc                 # compile and run
//!   tinyc source.tc --lib libm.so   # preload a native library (repeatable)
//!
//! This binary is deliberately thin: read the source, load any requested
//! native libraries, parse, compile, run. Every fallible step returns a
//! `Result` from `tinyc_vm`; this is the one place that turns an `Err` into
//! a printed line and a non-zero exit. Parse errors are printed as
//! `Line L: <message>`; every other error is printed as-is.

#![deny(clippy::print_stderr)]

use std::path::PathBuf;
use std::process;

use tinyc_vm::{NativeRegistry, ParseError, VmConfig};

struct Args {
    source_path: String,
    library_paths: Vec<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = std::env::args().skip(1);
    let mut source_path = None;
    let mut library_paths = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--lib" => {
                let path = args.next().unwrap_or_else(|| fail("--lib requires a path argument"));
                library_paths.push(PathBuf::from(path));
            }
            other if source_path.is_none() => source_path = Some(other.to_string()),
            other => fail(&format!("unexpected argument '{other}'")),
        }
    }

    Args {
        source_path: source_path.unwrap_or_else(|| fail("usage: tinyc <source> [--lib PATH]...")),
        library_paths,
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn fail_parse_error(e: ParseError) -> ! {
    eprintln!("Line {}: {e}", e.line());
    process::exit(1);
}

fn main() {
    let args = parse_args();

    let source = std::fs::read_to_string(&args.source_path).unwrap_or_else(|e| {
        fail(&format!("reading '{}': {e}", args.source_path));
    });

    let mut config = VmConfig::default();
    for lib in args.library_paths {
        config = config.with_library(lib);
    }

    let natives = NativeRegistry::load_all(&config.library_paths).unwrap_or_else(|e| fail(&e.to_string()));

    let program = match tinyc_vm::parse(&source, &natives) {
        Ok(program) => program,
        Err(e) => fail_parse_error(e),
    };
    let bytecode = tinyc_vm::compile(&program).unwrap_or_else(|e| fail(&e.to_string()));

    let mut vm = tinyc_vm::Vm::with_natives(bytecode, &config, std::io::stdout(), natives)
        .unwrap_or_else(|e| fail(&e.to_string()));
    if let Err(e) = vm.run() {
        fail(&e.to_string());
    }
}
