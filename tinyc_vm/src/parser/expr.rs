//! Precedence-climbing expression grammar:
//! `or -> eq -> cmp -> add -> mul -> unary -> primary`.
//!
//! Literal numeric tokens always parse to `Value::Long` — the widest kind —
//! so no magnitude is lost before the call site (vardecl initializer,
//! assignment RHS, call argument, return value) wraps the whole expression
//! in a `Convert` down to its declared type. Free-standing expressions
//! (an `if`/`while` condition, a `print` argument, a bare statement) never
//! get that wrap; their truthiness/printing is kind-agnostic at runtime.

use tinyc_scan::TokenKind;

use crate::ast::{BinOp, Expr};
use crate::value::Value;

use super::{zero_value, ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_eq()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::KwAnd) => BinOp::BoolAnd,
                Some(TokenKind::KwOr) => BinOp::BoolOr,
                _ => break,
            };
            self.advance();
            let right = self.parse_eq()?;
            left = Expr::Binary(Box::new(left), Box::new(right), op);
        }
        Ok(left)
    }

    fn parse_eq(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_cmp()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinOp::Eq,
                Some(TokenKind::BangEq) => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_cmp()?;
            left = Expr::Binary(Box::new(left), Box::new(right), op);
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::LtEq) => BinOp::Lte,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::GtEq) => BinOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = Expr::Binary(Box::new(left), Box::new(right), op);
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = Expr::Binary(Box::new(left), Box::new(right), op);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Percent) => BinOp::Mod,
                Some(TokenKind::Caret) => BinOp::Xor,
                Some(TokenKind::Amp) => BinOp::BinAnd,
                Some(TokenKind::Pipe) => BinOp::BinOr,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), Box::new(right), op);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                let kind = operand.kind(&self.functions).unwrap_or(crate::value::ValueKind::Int);
                Ok(Expr::Binary(
                    Box::new(Expr::Literal(zero_value(kind))),
                    Box::new(operand),
                    BinOp::Sub,
                ))
            }
            Some(TokenKind::Bang) => {
                self.advance();
                Ok(Expr::BooleanNot(Box::new(self.parse_unary()?)))
            }
            Some(TokenKind::Tilde) => {
                self.advance();
                Ok(Expr::BinaryNot(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().cloned().ok_or_else(|| self.eof_error("expression"))?;
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let n: i64 = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::InvalidNumericLiteral { line: token.line, text: token.text.clone() })?;
                Ok(Expr::Literal(Value::Long(n)))
            }
            // Vestigial: a bare string literal in expression position is
            // parsed the same way a number is — its text, minus quotes, read
            // as digits.
            TokenKind::String => {
                self.advance();
                let inner = super::strip_quotes(&token.text);
                let n: i64 = inner
                    .parse()
                    .map_err(|_| ParseError::InvalidNumericLiteral { line: token.line, text: token.text.clone() })?;
                Ok(Expr::Literal(Value::Long(n)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::Identifier => {
                if self.peek_ahead_kind(1) == Some(TokenKind::LParen) {
                    self.parse_call_expr()
                } else {
                    self.advance();
                    let var = self.resolve_var(&token)?;
                    Ok(Expr::Variable(var))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ParseError::UnexpectedToken {
                line: token.line,
                expected: "expression".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    pub(super) fn parse_call_expr(&mut self) -> Result<Expr, ParseError> {
        let name_tok = self.expect(TokenKind::Identifier, "identifier")?;
        self.expect(TokenKind::LParen, "'('")?;
        let func_id = *self
            .function_ids
            .get(&name_tok.text)
            .ok_or_else(|| ParseError::UnknownFunction { line: name_tok.line, name: name_tok.text.clone() })?;
        let param_kinds = self.functions[func_id].params.clone();

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.match_token(TokenKind::Comma) {
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if args.len() != param_kinds.len() {
            return Err(ParseError::ArgumentCountMismatch {
                line: name_tok.line,
                name: name_tok.text,
                expected: param_kinds.len(),
                found: args.len(),
            });
        }

        let coerced: Vec<Expr> = args
            .into_iter()
            .zip(param_kinds.iter())
            .map(|(arg, kind)| self.coerce(arg, *kind))
            .collect();
        Ok(Expr::Call(func_id, coerced))
    }
}
