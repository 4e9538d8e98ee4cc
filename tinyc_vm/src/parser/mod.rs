//! Recursive-descent parser: builds the typed AST, maintaining a frame/scope
//! stack for variable resolution and a global function table, enforcing the
//! static type rules as it goes (literal coercion, implicit `Convert`
//! wrapping, native-signature checks).

mod error;
mod expr;
mod stmt;

pub use error::ParseError;

use std::collections::HashMap;

use tinyc_scan::{Token, TokenKind};

use crate::ast::{FunctionDecl, FunctionId, Program, VarRef};
use crate::ffi::NativeRegistry;
use crate::value::{Value, ValueKind};

/// One function's (or the program root's) local variable scoping: a stack
/// of block scopes plus a monotonic counter handing out dense local
/// indices. Dropped once that function/the root is fully parsed — nothing
/// here survives into the AST except the indices already baked into
/// `VarRef`s.
struct ScopeFrame {
    scopes: Vec<HashMap<String, VarRef>>,
    next_local: u64,
}

impl ScopeFrame {
    fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            next_local: 0,
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        assert!(!self.scopes.is_empty(), "popped the frame's outermost scope");
    }

    fn declare(&mut self, name: String, kind: ValueKind, line: usize) -> Result<VarRef, ParseError> {
        if self.scopes.iter().any(|s| s.contains_key(&name)) {
            return Err(ParseError::Redeclaration { line, name });
        }
        let var = VarRef {
            local_index: self.next_local,
            kind,
        };
        self.next_local += 1;
        self.scopes.last_mut().expect("at least one scope").insert(name, var);
        Ok(var)
    }

    fn resolve(&self, name: &str) -> Option<VarRef> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    functions: Vec<FunctionDecl>,
    function_ids: HashMap<String, FunctionId>,
    frames: Vec<ScopeFrame>,
    func_stack: Vec<FunctionId>,
    natives: &'a NativeRegistry,
}

/// Parses a complete program, checking any `@native` declarations against
/// `natives` (already loaded by the caller from the CLI's `--lib` flags).
pub fn parse(source: &str, natives: &NativeRegistry) -> Result<Program, ParseError> {
    let tokens = tinyc_scan::scan(source)?;
    Parser::new(tokens, natives).parse_program()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, natives: &'a NativeRegistry) -> Self {
        Self {
            tokens,
            pos: 0,
            functions: Vec::new(),
            function_ids: HashMap::new(),
            frames: vec![ScopeFrame::new()],
            func_stack: Vec::new(),
            natives,
        }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut root = Vec::new();
        while self.peek().is_some() {
            root.push(self.parse_statement()?);
        }
        let root_locals_count = self.frames[0].next_local;
        Ok(Program {
            functions: self.functions,
            root,
            root_locals_count,
        })
    }

    // -- token cursor -----------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_ahead_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance().expect("just checked"))
        } else {
            Err(ParseError::UnexpectedToken {
                line: self.current_line(),
                expected: what.to_string(),
                found: self.describe_current(),
            })
        }
    }

    fn eof_error(&self, what: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.current_line(),
            expected: what.to_string(),
            found: self.describe_current(),
        }
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(t) => format!("{:?}", t.kind),
            None => "end of input".to_string(),
        }
    }

    // -- scope/frame management --------------------------------------------

    fn declare_current(&mut self, name: String, kind: ValueKind, line: usize) -> Result<VarRef, ParseError> {
        self.frames.last_mut().expect("at least one frame").declare(name, kind, line)
    }

    fn resolve_var(&self, token: &Token) -> Result<VarRef, ParseError> {
        self.frames
            .last()
            .expect("at least one frame")
            .resolve(&token.text)
            .ok_or_else(|| ParseError::UnknownIdentifier {
                line: token.line,
                name: token.text.clone(),
            })
    }

    /// Wraps `expr` in `Convert(target)` unless it already evaluates to
    /// `target`.
    fn coerce(&self, expr: crate::ast::Expr, target: ValueKind) -> crate::ast::Expr {
        match expr.kind(&self.functions) {
            Some(k) if k == target => expr,
            _ => crate::ast::Expr::Convert(Box::new(expr), target),
        }
    }
}

fn type_kind(kind: TokenKind) -> Option<ValueKind> {
    match kind {
        TokenKind::KwBool => Some(ValueKind::Bool),
        TokenKind::KwChar => Some(ValueKind::Char),
        TokenKind::KwInt => Some(ValueKind::Int),
        TokenKind::KwLong => Some(ValueKind::Long),
        _ => None,
    }
}

fn is_assign_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::CaretEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
    )
}

fn zero_value(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Bool => Value::Bool(false),
        ValueKind::Char => Value::Char(0),
        ValueKind::Int => Value::Int(0),
        ValueKind::Long => Value::Long(0),
    }
}

fn one_value(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Bool => Value::Bool(true),
        ValueKind::Char => Value::Char(1),
        ValueKind::Int => Value::Int(1),
        ValueKind::Long => Value::Long(1),
    }
}

/// Strips the surrounding quote characters the scanner leaves on a `String`
/// token's text.
fn strip_quotes(text: &str) -> String {
    text.trim_start_matches('"').trim_end_matches('"').to_string()
}

fn signature_text(ret: Option<ValueKind>, params: &[ValueKind]) -> String {
    let ret_text = match ret {
        Some(k) => format!("{k:?}"),
        None => "void".to_string(),
    };
    let params_text: Vec<String> = params.iter().map(|k| format!("{k:?}")).collect();
    format!("{ret_text}({})", params_text.join(", "))
}
