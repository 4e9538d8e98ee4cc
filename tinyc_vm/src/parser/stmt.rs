//! Statement grammar: blocks, control flow, declarations, assignment and
//! compound-assignment desugaring, and `@native` declarations.

use tinyc_scan::TokenKind;

use crate::ast::{BinOp, Expr, FunctionDecl, Stmt};
use crate::value::ValueKind;

use super::{is_assign_op, one_value, signature_text, strip_quotes, type_kind, ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::KwPrint) => self.parse_print(),
            Some(TokenKind::KwIf) => self.parse_if(),
            Some(TokenKind::KwWhile) => self.parse_while(),
            Some(TokenKind::KwFor) => self.parse_for(),
            Some(TokenKind::KwReturn) => self.parse_return(),
            Some(TokenKind::AtNative) => self.parse_native_decl(),
            Some(TokenKind::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(TokenKind::KwVoid) => self.parse_fundecl(),
            Some(k) if type_kind(k).is_some() => self.parse_decl(),
            Some(TokenKind::Identifier) => self.parse_identifier_statement(),
            _ => Err(self.eof_error("statement")),
        }
    }

    /// A block: `'{' statement* '}'`, in its own nested scope.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        self.frames.last_mut().expect("at least one frame").push_scope();
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            stmts.push(self.parse_statement()?);
        }
        self.frames.last_mut().expect("at least one frame").pop_scope();
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    /// A function body: like [`parse_block`](Self::parse_block) but reuses
    /// the frame's outermost scope, where parameters already live, instead
    /// of pushing a fresh one.
    fn parse_function_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Print(expr))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.match_token(TokenKind::KwElse) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(Stmt::While(cond, body))
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        self.frames.last_mut().expect("at least one frame").push_scope();

        let init = Box::new(self.parse_statement()?);
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        let step = Box::new(Stmt::Expr(self.parse_assign_expr()?));
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block()?;

        self.frames.last_mut().expect("at least one frame").pop_scope();
        Ok(Stmt::For(init, cond, step, body))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let ret_tok = self.advance().expect("dispatched on KwReturn");
        let func_id = *self
            .func_stack
            .last()
            .ok_or(ParseError::ReturnOutsideFunction { line: ret_tok.line })?;
        let expected = self.functions[func_id].return_type;

        if self.check(TokenKind::Semicolon) {
            self.advance();
            if expected.is_some() {
                return Err(ParseError::MissingReturnValue { line: ret_tok.line });
            }
            return Ok(Stmt::Return(Vec::new()));
        }

        let raw = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        match expected {
            Some(kind) => Ok(Stmt::Return(vec![self.coerce(raw, kind)])),
            None => Err(ParseError::UnexpectedReturnValue { line: ret_tok.line }),
        }
    }

    /// Disambiguates `TYPE IDENT =` (a variable declaration) from
    /// `TYPE IDENT (` (a function declaration) with one extra token of
    /// lookahead.
    fn parse_decl(&mut self) -> Result<Stmt, ParseError> {
        if self.peek_ahead_kind(2) == Some(TokenKind::LParen) {
            self.parse_fundecl()
        } else {
            self.parse_vardecl()
        }
    }

    fn parse_vardecl(&mut self) -> Result<Stmt, ParseError> {
        let kind_tok = self.advance().expect("dispatched on a type keyword");
        let kind = type_kind(kind_tok.kind).expect("caller checked this is a type keyword");
        let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
        self.expect(TokenKind::Eq, "'='")?;
        let raw = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;

        let var = self.declare_current(name_tok.text, kind, name_tok.line)?;
        let rhs = self.coerce(raw, kind);
        Ok(Stmt::Expr(Expr::Assign(var, Box::new(rhs))))
    }

    fn parse_fundecl(&mut self) -> Result<Stmt, ParseError> {
        let ret_kind = self.parse_ret_type()?;
        let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
        if self.function_ids.contains_key(&name_tok.text) {
            return Err(ParseError::Redeclaration { line: name_tok.line, name: name_tok.text });
        }

        self.expect(TokenKind::LParen, "'('")?;
        self.frames.push(super::ScopeFrame::new());
        let param_kinds = self.parse_params()?;
        self.expect(TokenKind::RParen, "')'")?;

        let id = self.functions.len();
        self.function_ids.insert(name_tok.text.clone(), id);
        self.functions
            .push(FunctionDecl::new(name_tok.text, param_kinds, ret_kind, Vec::new(), 0));
        self.func_stack.push(id);

        let body = self.parse_function_body()?;
        let locals_count = self.frames.last().expect("just pushed").next_local;
        self.frames.pop();
        self.func_stack.pop();

        self.functions[id].body = body;
        self.functions[id].locals_count = locals_count;
        Ok(Stmt::Function(id))
    }

    fn parse_native_decl(&mut self) -> Result<Stmt, ParseError> {
        let at_tok = self.advance().expect("dispatched on AtNative");
        self.expect(TokenKind::LParen, "'('")?;
        let name_str_tok = self.expect(TokenKind::String, "string literal")?;
        let qualified_name = strip_quotes(&name_str_tok.text);
        self.expect(TokenKind::RParen, "')'")?;

        let ret_kind = self.parse_ret_type()?;
        let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
        if self.function_ids.contains_key(&name_tok.text) {
            return Err(ParseError::Redeclaration { line: name_tok.line, name: name_tok.text });
        }

        self.expect(TokenKind::LParen, "'('")?;
        self.frames.push(super::ScopeFrame::new());
        let param_kinds = self.parse_params()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        let params: Vec<crate::ast::VarRef> = param_kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| crate::ast::VarRef { local_index: i as u64, kind: *kind })
            .collect();
        let locals_count = self.frames.last().expect("just pushed").next_local;
        self.frames.pop();

        let declared_text = signature_text(ret_kind, &param_kinds);
        match self.natives.signature(&qualified_name) {
            Some((actual_ret, actual_params)) if ret_kind == Some(actual_ret) && actual_params == param_kinds.as_slice() => {}
            Some((actual_ret, actual_params)) => {
                return Err(ParseError::NativeSignatureMismatch {
                    line: at_tok.line,
                    name: qualified_name,
                    declared: declared_text,
                    actual: signature_text(Some(actual_ret), actual_params),
                });
            }
            None => {
                return Err(ParseError::NativeSignatureMismatch {
                    line: at_tok.line,
                    name: qualified_name,
                    declared: declared_text,
                    actual: "not exported by any loaded library".to_string(),
                });
            }
        }

        let id = self.functions.len();
        self.function_ids.insert(name_tok.text.clone(), id);
        let body = vec![Stmt::Native(qualified_name, params)];
        self.functions
            .push(FunctionDecl::new(name_tok.text, param_kinds, ret_kind, body, locals_count));
        Ok(Stmt::Function(id))
    }

    fn parse_ret_type(&mut self) -> Result<Option<ValueKind>, ParseError> {
        if self.match_token(TokenKind::KwVoid) {
            return Ok(None);
        }
        let tok = self.advance().ok_or_else(|| self.eof_error("a type or 'void'"))?;
        type_kind(tok.kind)
            .map(Some)
            .ok_or(ParseError::UnexpectedToken {
                line: tok.line,
                expected: "a type or 'void'".to_string(),
                found: format!("{:?}", tok.kind),
            })
    }

    fn parse_params(&mut self) -> Result<Vec<ValueKind>, ParseError> {
        let mut kinds = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(kinds);
        }
        loop {
            let kind_tok = self.advance().ok_or_else(|| self.eof_error("a parameter type"))?;
            let kind = type_kind(kind_tok.kind).ok_or(ParseError::UnexpectedToken {
                line: kind_tok.line,
                expected: "a parameter type".to_string(),
                found: format!("{:?}", kind_tok.kind),
            })?;
            let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
            self.declare_current(name_tok.text, kind, name_tok.line)?;
            kinds.push(kind);
            if self.match_token(TokenKind::Comma) {
                continue;
            }
            break;
        }
        Ok(kinds)
    }

    fn parse_identifier_statement(&mut self) -> Result<Stmt, ParseError> {
        let next = self.peek_ahead_kind(1);
        match next {
            Some(TokenKind::LParen) => {
                let expr = self.parse_call_expr()?;
                self.match_token(TokenKind::Semicolon);
                Ok(Stmt::Expr(expr))
            }
            Some(k) if is_assign_op(k) || k == TokenKind::PlusPlus || k == TokenKind::MinusMinus => {
                let expr = self.parse_assign_expr()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Expr(expr))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// `IDENT assignOp expression`, or `IDENT ('++' | '--')`, lowered per
    /// `x OP= e -> x = x OP e` and `x++/x-- -> x = x +/- 1`. No trailing
    /// `;` is consumed — callers decide whether one is required (a `for`
    /// loop's step clause has none).
    pub(super) fn parse_assign_expr(&mut self) -> Result<Expr, ParseError> {
        let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
        let var = self.resolve_var(&name_tok)?;
        let op_tok = self.advance().ok_or_else(|| self.eof_error("assignment operator"))?;

        let combined = match op_tok.kind {
            TokenKind::Eq => self.parse_expression()?,
            TokenKind::PlusPlus => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(Expr::Literal(one_value(var.kind))), BinOp::Add),
            TokenKind::MinusMinus => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(Expr::Literal(one_value(var.kind))), BinOp::Sub),
            TokenKind::PlusEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Add),
            TokenKind::MinusEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Sub),
            TokenKind::StarEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Mul),
            TokenKind::SlashEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Div),
            TokenKind::PercentEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Mod),
            TokenKind::CaretEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::Xor),
            TokenKind::AmpEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::BinAnd),
            TokenKind::PipeEq => Expr::Binary(Box::new(Expr::Variable(var)), Box::new(self.parse_expression()?), BinOp::BinOr),
            other => {
                return Err(ParseError::UnexpectedToken {
                    line: op_tok.line,
                    expected: "assignment operator".to_string(),
                    found: format!("{other:?}"),
                })
            }
        };

        let rhs = self.coerce(combined, var.kind);
        Ok(Expr::Assign(var, Box::new(rhs)))
    }
}
