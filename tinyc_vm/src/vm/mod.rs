//! Byte-stream interpreter: reads one instruction at a time directly from
//! the `Vec<u8>` produced by codegen, rather than pre-decoding into an
//! instruction vector, since jump/call targets are absolute byte offsets
//! into that same stream.

mod error;
mod frame;

pub use error::VmError;

use std::io::{self, Write};

use tracing::trace;

use crate::config::VmConfig;
use crate::ffi::NativeRegistry;
use crate::instr::Instr;
use frame::Frame;

/// What a single executed instruction tells the run loop to do next.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt,
}

/// The running virtual machine. Generic over its output sink so tests can
/// capture `print` output in a `Vec<u8>` instead of writing real stdout.
pub struct Vm<W: Write = io::Stdout> {
    program: Vec<u8>,
    pub(crate) ip: u64,
    frames: Vec<Frame>,
    return_stack: Vec<u64>,
    natives: NativeRegistry,
    out: W,
    locals_capacity: u64,
}

impl<W: Write> std::fmt::Debug for Vm<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("ip", &self.ip)
            .field("frame_depth", &self.frames.len())
            .field("program_len", &self.program.len())
            .finish()
    }
}

impl Vm<io::Stdout> {
    pub fn new(program: Vec<u8>, config: &VmConfig) -> Result<Self, VmError> {
        Self::with_writer(program, config, io::stdout())
    }
}

impl<W: Write> Vm<W> {
    pub fn with_writer(program: Vec<u8>, config: &VmConfig, out: W) -> Result<Self, VmError> {
        let natives = NativeRegistry::load_all(&config.library_paths)?;
        Self::with_natives(program, config, out, natives)
    }

    /// Like [`Self::with_writer`], but reuses a [`NativeRegistry`] the
    /// caller already built (e.g. the one the parser checked `@native`
    /// signatures against), instead of loading every library a second time.
    pub fn with_natives(program: Vec<u8>, config: &VmConfig, out: W, natives: NativeRegistry) -> Result<Self, VmError> {
        Ok(Self {
            program,
            ip: 0,
            frames: vec![Frame::new(config.locals_capacity)],
            return_stack: Vec::new(),
            natives,
            out,
            locals_capacity: config.locals_capacity,
        })
    }

    /// Runs until `Halt` or a fatal error. Startup has already pushed the
    /// program-root frame in `with_writer`.
    pub fn run(&mut self) -> Result<(), VmError> {
        loop {
            let mut ip = self.ip;
            let instr = Instr::read(&self.program, &mut ip)
                .ok_or(VmError::UnknownOpcode { ip: self.ip })?;
            self.ip = ip;
            trace!(ip, ?instr, "executing instruction");
            if instr.execute(self)? == Step::Halt {
                return Ok(());
            }
        }
    }

    pub(crate) fn frame_mut(&mut self) -> Result<&mut Frame, VmError> {
        self.frames.last_mut().ok_or(VmError::StackUnderflow)
    }

    pub(crate) fn write_out(&mut self, bytes: &[u8]) -> Result<(), VmError> {
        self.out
            .write_all(bytes)
            .map_err(|e| VmError::Io(e.to_string()))
    }

    /// `Call(addr, n)`: moves the top `n` values from the caller's operand
    /// stack into a fresh frame's operand stack, preserving which one ends
    /// up on top (argument 1), then jumps to `addr`.
    pub(crate) fn call(&mut self, addr: u64, n: u8) -> Result<(), VmError> {
        let mut popped = Vec::with_capacity(n as usize);
        {
            let caller = self.frame_mut()?;
            for _ in 0..n {
                popped.push(caller.pop()?);
            }
        }
        self.return_stack.push(self.ip);
        let mut callee = Frame::new(self.locals_capacity);
        for value in popped.into_iter().rev() {
            callee.push(value);
        }
        self.frames.push(callee);
        self.ip = addr;
        Ok(())
    }

    /// `Ret(k)`: pops `k` values off the returning frame, discards the
    /// frame, pushes those values onto the (now current) caller's stack in
    /// the same relative order, and resumes at the saved return address.
    pub(crate) fn ret(&mut self, k: u8) -> Result<(), VmError> {
        let mut popped = Vec::with_capacity(k as usize);
        {
            let callee = self.frame_mut()?;
            for _ in 0..k {
                popped.push(callee.pop()?);
            }
        }
        self.frames.pop().ok_or(VmError::StackUnderflow)?;
        let return_ip = self.return_stack.pop().ok_or(VmError::StackUnderflow)?;
        {
            let caller = self.frame_mut()?;
            for value in popped.into_iter().rev() {
                caller.push(value);
            }
        }
        self.ip = return_ip;
        Ok(())
    }

    pub(crate) fn call_native(&mut self, name: &str) -> Result<(), VmError> {
        let param_kinds = self.natives.param_kinds(name)?.to_vec();
        let mut args = Vec::with_capacity(param_kinds.len());
        {
            let frame = self.frame_mut()?;
            for _ in 0..param_kinds.len() {
                args.push(frame.pop()?);
            }
        }
        // A native function's own body loads its parameters in declared
        // order (param 1 first), so param 1 sits at the bottom of the run
        // it pushed and the last parameter is on top. Popping top-first
        // therefore yields them last-to-first; reverse to recover the
        // declared order the foreign-function bridge expects.
        args.reverse();
        let result = self.natives.call(name, &args)?;
        self.frame_mut()?.push(result);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn operand_depth(&mut self) -> usize {
        self.frame_mut().expect("frame present").operand_depth()
    }
}
