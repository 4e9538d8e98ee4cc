use crate::value::Value;
use crate::vm::error::VmError;

/// One call's operand stack and fixed-size local store. Lifetime is exactly
/// the `Call`/`Ret` bracket that creates and destroys it.
#[derive(Debug)]
pub(crate) struct Frame {
    operand_stack: Vec<Value>,
    locals: Vec<Value>,
}

impl Frame {
    pub(crate) fn new(locals_capacity: u64) -> Self {
        Self {
            operand_stack: Vec::new(),
            locals: vec![Value::Long(0); locals_capacity as usize],
        }
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.operand_stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Value, VmError> {
        self.operand_stack.pop().ok_or(VmError::StackUnderflow)
    }

    pub(crate) fn store(&mut self, index: u64, value: Value) -> Result<(), VmError> {
        let slot = self
            .locals
            .get_mut(index as usize)
            .ok_or(VmError::LocalOutOfRange { index })?;
        *slot = value;
        Ok(())
    }

    pub(crate) fn load(&self, index: u64) -> Result<Value, VmError> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(VmError::LocalOutOfRange { index })
    }

    pub(crate) fn operand_depth(&self) -> usize {
        self.operand_stack.len()
    }
}
