//! AST-to-bytecode lowering: one forward pass per program, emitting
//! instructions directly into a flat byte buffer and backpatching jump
//! targets once the code they skip over has been emitted.
//!
//! Control flow has no labels. A placeholder jump address (`0`) is written,
//! its byte offset remembered, and the real cumulative length is patched in
//! once the jump's destination has actually been emitted.

use thiserror::Error;

use crate::ast::{BinOp, Expr, FunctionId, Program, Stmt};
use crate::instr::Instr;
use crate::value::Value;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("call to function '{name}' emitted before the function itself")]
    FunctionNotEmitted { name: String },
}

enum JumpKind {
    Jump,
    JumpIfFalse,
}

/// Owns the single output buffer a program compiles into. Consumed by
/// [`Codegen::finish`] — there is no way to observe a half-emitted program.
pub struct Codegen {
    buf: Vec<u8>,
}

impl Codegen {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn emit(&mut self, instr: Instr) {
        instr.write(&mut self.buf);
    }

    /// Emits a jump with a placeholder target, returning the byte offset of
    /// its 8-byte address payload for a later [`Self::patch_jump`] call.
    fn emit_jump(&mut self, kind: JumpKind) -> usize {
        match kind {
            JumpKind::Jump => self.emit(Instr::Jump(0)),
            JumpKind::JumpIfFalse => self.emit(Instr::JumpIfFalse(0)),
        }
        self.buf.len() - 8
    }

    fn patch_jump(&mut self, at: usize) {
        let target = self.len();
        self.buf[at..at + 8].copy_from_slice(&target.to_le_bytes());
    }

    fn emit_print_string(&mut self, s: &str) {
        for b in s.bytes() {
            self.emit(Instr::Push(Value::Char(b as i8)));
            self.emit(Instr::Print);
        }
    }

    fn emit_function(&mut self, id: FunctionId, program: &Program) -> Result<(), CodegenError> {
        let func = &program.functions[id];
        let skip = self.emit_jump(JumpKind::Jump);
        func.emitted_address.set(Some(self.len()));
        for i in 0..func.params.len() {
            self.emit(Instr::Store(i as u64));
        }
        for stmt in &func.body {
            self.emit_stmt(stmt, program)?;
        }
        self.patch_jump(skip);
        Ok(())
    }

    fn emit_expr(&mut self, expr: &Expr, program: &Program) -> Result<(), CodegenError> {
        match expr {
            Expr::Literal(v) => self.emit(Instr::Push(*v)),
            Expr::Variable(v) => self.emit(Instr::Load(v.local_index)),
            Expr::Assign(v, e) => {
                self.emit_expr(e, program)?;
                self.emit(Instr::Store(v.local_index));
            }
            Expr::Binary(l, r, op) => {
                self.emit_expr(l, program)?;
                self.emit_expr(r, program)?;
                self.emit(binop_instr(*op));
            }
            Expr::BooleanNot(e) => {
                self.emit_expr(e, program)?;
                self.emit(Instr::BoolNot);
            }
            Expr::BinaryNot(e) => {
                self.emit_expr(e, program)?;
                self.emit(Instr::BinNot);
            }
            Expr::Convert(e, kind) => {
                self.emit_expr(e, program)?;
                self.emit(Instr::Convert(*kind));
            }
            Expr::Call(id, args) => {
                // Emitted in reverse so the first argument ends up on top
                // of the stack, where the callee's Store sequence expects
                // it.
                for arg in args.iter().rev() {
                    self.emit_expr(arg, program)?;
                }
                let func = &program.functions[*id];
                let addr = func
                    .emitted_address
                    .get()
                    .ok_or_else(|| CodegenError::FunctionNotEmitted { name: func.name.clone() })?;
                self.emit(Instr::Call(addr, args.len() as u8));
            }
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt, program: &Program) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Expr(e) => self.emit_expr(e, program)?,
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.emit_stmt(s, program)?;
                }
            }
            Stmt::If(cond, then_branch, else_branch) => {
                self.emit_expr(cond, program)?;
                let skip_then = self.emit_jump(JumpKind::JumpIfFalse);
                for s in then_branch {
                    self.emit_stmt(s, program)?;
                }
                match else_branch {
                    None => self.patch_jump(skip_then),
                    Some(else_stmts) => {
                        let skip_else = self.emit_jump(JumpKind::Jump);
                        self.patch_jump(skip_then);
                        for s in else_stmts {
                            self.emit_stmt(s, program)?;
                        }
                        self.patch_jump(skip_else);
                    }
                }
            }
            Stmt::While(cond, body) => {
                let top = self.len();
                self.emit_expr(cond, program)?;
                let exit = self.emit_jump(JumpKind::JumpIfFalse);
                for s in body {
                    self.emit_stmt(s, program)?;
                }
                self.emit(Instr::Jump(top));
                self.patch_jump(exit);
            }
            Stmt::For(init, cond, step, body) => {
                self.emit_stmt(init, program)?;
                let top = self.len();
                self.emit_expr(cond, program)?;
                let exit = self.emit_jump(JumpKind::JumpIfFalse);
                for s in body {
                    self.emit_stmt(s, program)?;
                }
                self.emit_stmt(step, program)?;
                self.emit(Instr::Jump(top));
                self.patch_jump(exit);
            }
            Stmt::Print(e) => {
                self.emit_expr(e, program)?;
                self.emit(Instr::Print);
                self.emit_print_string("\n");
            }
            Stmt::PrintString(s) => self.emit_print_string(s),
            Stmt::Return(exprs) => {
                for e in exprs {
                    self.emit_expr(e, program)?;
                }
                self.emit(Instr::Ret(exprs.len() as u8));
            }
            Stmt::Native(name, params) => {
                for p in params {
                    self.emit(Instr::Load(p.local_index));
                }
                self.emit(Instr::Native(name.clone()));
                self.emit(Instr::Ret(1));
            }
            Stmt::Function(id) => self.emit_function(*id, program)?,
            Stmt::Halt => self.emit(Instr::Halt),
        }
        Ok(())
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

fn binop_instr(op: BinOp) -> Instr {
    match op {
        BinOp::Add => Instr::Add,
        BinOp::Sub => Instr::Sub,
        BinOp::Mul => Instr::Mul,
        BinOp::Div => Instr::Div,
        BinOp::Mod => Instr::Mod,
        BinOp::BinAnd => Instr::BinAnd,
        BinOp::BinOr => Instr::BinOr,
        BinOp::Xor => Instr::Xor,
        BinOp::Lt => Instr::Lt,
        BinOp::Lte => Instr::Lte,
        BinOp::Gt => Instr::Gt,
        BinOp::Gte => Instr::Gte,
        BinOp::Eq => Instr::Eq,
        BinOp::NotEq => Instr::NotEq,
        BinOp::BoolAnd => Instr::BoolAnd,
        BinOp::BoolOr => Instr::BoolOr,
    }
}

/// Compiles a whole program: the root statements, each ending in a
/// defensive `Halt` even if the source never falls off the end.
pub fn compile(program: &Program) -> Result<Vec<u8>, CodegenError> {
    let mut cg = Codegen::new();
    for stmt in &program.root {
        cg.emit_stmt(stmt, program)?;
    }
    cg.emit(Instr::Halt);
    Ok(cg.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VarRef;
    use crate::value::ValueKind;

    #[test]
    fn if_without_else_patches_to_after_the_body() {
        let program = Program {
            functions: Vec::new(),
            root: vec![Stmt::If(Expr::Literal(Value::Bool(true)), vec![Stmt::Halt], None)],
            root_locals_count: 0,
        };
        let bytes = compile(&program).unwrap();
        // Push(Bool) + JumpIfFalse + Halt + trailing defensive Halt.
        assert_eq!(bytes.len(), (1 + 2) + (1 + 8) + 1 + 1);
    }

    #[test]
    fn while_loop_jumps_back_to_the_condition() {
        let var = VarRef { local_index: 0, kind: ValueKind::Long };
        let program = Program {
            functions: Vec::new(),
            root: vec![Stmt::While(Expr::Variable(var), vec![])],
            root_locals_count: 1,
        };
        let bytes = compile(&program).unwrap();
        let mut ip = 0u64;
        let load = Instr::read(&bytes, &mut ip).unwrap();
        assert_eq!(load, Instr::Load(0));
        let jump_if_false = Instr::read(&bytes, &mut ip).unwrap();
        assert!(matches!(jump_if_false, Instr::JumpIfFalse(_)));
        let back_jump = Instr::read(&bytes, &mut ip).unwrap();
        assert_eq!(back_jump, Instr::Jump(0));
    }

    #[test]
    fn function_call_resolves_through_emitted_address() {
        let func = crate::ast::FunctionDecl::new("f".to_string(), vec![ValueKind::Long], Some(ValueKind::Long), vec![Stmt::Return(vec![Expr::Variable(VarRef { local_index: 0, kind: ValueKind::Long })])], 1);
        let program = Program {
            functions: vec![func],
            root: vec![Stmt::Function(0), Stmt::Expr(Expr::Call(0, vec![Expr::Literal(Value::Long(1))]))],
            root_locals_count: 0,
        };
        let bytes = compile(&program).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(program.functions[0].emitted_address.get(), Some(9));
    }

    #[test]
    fn call_before_declaration_is_a_codegen_error() {
        let func = crate::ast::FunctionDecl::new("f".to_string(), vec![], Some(ValueKind::Long), vec![], 0);
        let program = Program {
            functions: vec![func],
            root: vec![Stmt::Expr(Expr::Call(0, vec![]))],
            root_locals_count: 0,
        };
        let err = compile(&program).unwrap_err();
        assert!(matches!(err, CodegenError::FunctionNotEmitted { .. }));
    }
}
