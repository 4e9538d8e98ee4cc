//! Typed syntax tree produced by the parser and consumed by codegen.
//!
//! The tree is a plain owned structure: no `Rc`/`RefCell` anywhere. The one
//! exception is [`FunctionDecl::emitted_address`], a `Cell` set exactly once
//! by codegen when that function's body is emitted and read by every `Call`
//! site that references it by index.

use std::cell::Cell;

use crate::value::{Value, ValueKind};

/// Index into `Program::functions`. A `Call` node carries one of these
/// rather than a pointer to the declaration itself.
pub type FunctionId = usize;

/// A resolved variable: its slot in the enclosing frame's local store and
/// its declared type. Scope/frame bookkeeping happens only during parsing;
/// by the time a `VarRef` is built it is just an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRef {
    pub local_index: u64,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BinAnd,
    BinOr,
    Xor,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    NotEq,
    BoolAnd,
    BoolOr,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Variable(VarRef),
    Assign(VarRef, Box<Expr>),
    Binary(Box<Expr>, Box<Expr>, BinOp),
    BooleanNot(Box<Expr>),
    BinaryNot(Box<Expr>),
    Convert(Box<Expr>, ValueKind),
    Call(FunctionId, Vec<Expr>),
}

impl Expr {
    /// The type an expression evaluates to, used by the parser to decide
    /// where a `Convert` wrapper is required. `Call` and `Variable` carry
    /// their kind directly; literals and conversions are self-describing.
    pub fn kind(&self, functions: &[FunctionDecl]) -> Option<ValueKind> {
        match self {
            Expr::Literal(v) => Some(v.kind()),
            Expr::Variable(v) | Expr::Assign(v, _) => Some(v.kind),
            Expr::Binary(_, _, BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte | BinOp::Eq | BinOp::NotEq | BinOp::BoolAnd | BinOp::BoolOr) => {
                Some(ValueKind::Bool)
            }
            Expr::Binary(l, r, _) => {
                let lk = l.kind(functions)?;
                let rk = r.kind(functions)?;
                Some(lk.common(rk))
            }
            Expr::BooleanNot(_) => Some(ValueKind::Bool),
            Expr::BinaryNot(e) => e.kind(functions),
            Expr::Convert(_, k) => Some(*k),
            Expr::Call(id, _) => functions[*id].return_type,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Block(Vec<Stmt>),
    If(Expr, Vec<Stmt>, Option<Vec<Stmt>>),
    While(Expr, Vec<Stmt>),
    For(Box<Stmt>, Expr, Box<Stmt>, Vec<Stmt>),
    Print(Expr),
    PrintString(String),
    Return(Vec<Expr>),
    Native(String, Vec<VarRef>),
    /// A nested function declaration, sitting at the point in program order
    /// where it was parsed (codegen emits its jump-skip/body right here).
    /// The full declaration lives in `Program::functions[id]`.
    Function(FunctionId),
    Halt,
}

/// A declared function. `params` gives each parameter's kind in
/// left-to-right declaration order (their local indices are
/// `0..params.len()`, assigned by the parser's frame counter).
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ValueKind>,
    pub return_type: Option<ValueKind>,
    pub body: Vec<Stmt>,
    pub locals_count: u64,
    pub emitted_address: Cell<Option<u64>>,
}

impl FunctionDecl {
    pub fn new(
        name: String,
        params: Vec<ValueKind>,
        return_type: Option<ValueKind>,
        body: Vec<Stmt>,
        locals_count: u64,
    ) -> Self {
        Self {
            name,
            params,
            return_type,
            body,
            locals_count,
            emitted_address: Cell::new(None),
        }
    }
}

/// The whole parsed program: every non-root function declaration, plus the
/// top-level statements that make up the implicit program-root frame
/// ("main" in spec terms — emitted inline, with no skip jump).
#[derive(Debug)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    pub root: Vec<Stmt>,
    pub root_locals_count: u64,
}
