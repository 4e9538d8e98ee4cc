use thiserror::Error;

use crate::ffi::FfiError;
use crate::value::ValueError;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("local index {index} out of range")]
    LocalOutOfRange { index: u64 },

    #[error("unknown opcode at byte offset {ip}")]
    UnknownOpcode { ip: u64 },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Ffi(#[from] FfiError),

    #[error("write to output sink failed: {0}")]
    Io(String),
}
