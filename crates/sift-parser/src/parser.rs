//! Recursive-descent parser for the Python-dialect frontend.
//!
//! Statements are parsed by dedicated functions; expressions go through a
//! precedence ladder (or > and > not > comparison > arithmetic > unary >
//! power > postfix). The parser builds directly into an [`AstBuilder`],
//! so the result is a sealed arena with parent links already wired.

use sift_common::Span;

use crate::ast::{
    parse_int_literal, AstBuilder, BinOpKind, BoolOpKind, CmpOpKind, ModuleAst, NodeId, NodeKind,
    UnaryOpKind,
};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: AstBuilder,
    /// Set while parsing a `for` target, where `in` is a delimiter rather
    /// than the membership operator.
    no_in: bool,
}

impl Parser {
    /// Parse a whole module. The first error aborts the parse; the caller
    /// (normally the AST cache) records the failure against the file.
    pub fn parse(source: &str) -> Result<ModuleAst, ParseError> {
        let tokens = Lexer::tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            builder: AstBuilder::new(),
            no_in: false,
        };
        let end = source.len() as u32;
        let stmts = parser.statements_until(TokenKind::Eof)?;
        let span = Span::new(0, end);
        let body = parser.builder.add(NodeKind::Block { stmts }, span);
        let root = parser.builder.add(NodeKind::Module { body }, span);
        Ok(parser.builder.finish(root))
    }

    // ── Token plumbing ─────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("expected {what}"),
                self.peek().span,
            ))
        }
    }

    fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.builder.add(kind, span)
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.builder.span(id)
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn statements_until(&mut self, end: TokenKind) -> Result<Vec<NodeId>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(TokenKind::Newline) {}
            if self.at(end) || self.at(TokenKind::Eof) {
                break;
            }
            self.statement(&mut stmts)?;
        }
        Ok(stmts)
    }

    fn statement(&mut self, out: &mut Vec<NodeId>) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::KwDef => out.push(self.def_statement()?),
            TokenKind::KwClass => out.push(self.class_statement()?),
            TokenKind::KwIf => out.push(self.if_statement()?),
            TokenKind::KwWhile => out.push(self.while_statement()?),
            TokenKind::KwFor => out.push(self.for_statement()?),
            TokenKind::KwTry => out.push(self.try_statement()?),
            _ => self.simple_statement_line(out)?,
        }
        Ok(())
    }

    /// One logical line of `;`-separated simple statements.
    fn simple_statement_line(&mut self, out: &mut Vec<NodeId>) -> Result<(), ParseError> {
        loop {
            out.push(self.simple_statement()?);
            if !self.eat(TokenKind::Semicolon) {
                break;
            }
            if self.at(TokenKind::Newline) || self.at(TokenKind::Eof) {
                break;
            }
        }
        if !self.at(TokenKind::Eof) && !self.at(TokenKind::Dedent) {
            self.expect(TokenKind::Newline, "end of statement")?;
        }
        Ok(())
    }

    fn simple_statement(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_kind() {
            TokenKind::KwReturn => {
                let kw = self.advance();
                let value = if self.ends_simple_statement() {
                    None
                } else {
                    Some(self.testlist()?)
                };
                let end = value.map(|v| self.span_of(v).end).unwrap_or(kw.span.end);
                Ok(self.add(NodeKind::Return { value }, Span::new(kw.span.start, end)))
            }
            TokenKind::KwYield => {
                let kw = self.advance();
                let value = if self.ends_simple_statement() {
                    None
                } else {
                    Some(self.testlist()?)
                };
                let end = value.map(|v| self.span_of(v).end).unwrap_or(kw.span.end);
                let span = Span::new(kw.span.start, end);
                let yield_node = self.add(NodeKind::Yield { value }, span);
                Ok(self.add(NodeKind::ExprStmt { value: yield_node }, span))
            }
            TokenKind::KwPass => {
                let kw = self.advance();
                Ok(self.add(NodeKind::Pass, kw.span))
            }
            TokenKind::KwBreak => {
                let kw = self.advance();
                Ok(self.add(NodeKind::Break, kw.span))
            }
            TokenKind::KwContinue => {
                let kw = self.advance();
                Ok(self.add(NodeKind::Continue, kw.span))
            }
            TokenKind::KwGlobal => {
                let kw = self.advance();
                let mut names = Vec::new();
                let mut end = kw.span.end;
                loop {
                    let name = self.expect(TokenKind::Name, "a name after `global`")?;
                    end = name.span.end;
                    names.push(name.text);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(self.add(NodeKind::Global { names }, Span::new(kw.span.start, end)))
            }
            TokenKind::KwImport => {
                let kw = self.advance();
                let mut names = Vec::new();
                let mut end = kw.span.end;
                loop {
                    let name = self.expect(TokenKind::Name, "a module name after `import`")?;
                    end = name.span.end;
                    names.push(self.add(NodeKind::Name { id: name.text }, name.span));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(self.add(NodeKind::Import { names }, Span::new(kw.span.start, end)))
            }
            _ => self.expression_statement(),
        }
    }

    fn ends_simple_statement(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::Dedent
        )
    }

    fn expression_statement(&mut self) -> Result<NodeId, ParseError> {
        let expr = self.testlist()?;
        if self.eat(TokenKind::Eq) {
            let value = self.testlist()?;
            let span = self.span_of(expr).cover(self.span_of(value));
            Ok(self.add(
                NodeKind::Assign {
                    target: expr,
                    value,
                },
                span,
            ))
        } else {
            let span = self.span_of(expr);
            Ok(self.add(NodeKind::ExprStmt { value: expr }, span))
        }
    }

    // ── Compound statements ────────────────────────────────────────────

    /// `: suite` -- either an inline simple-statement list or an indented
    /// block. Always yields a Block node.
    fn suite(&mut self) -> Result<NodeId, ParseError> {
        self.expect(TokenKind::Colon, "`:`")?;
        let mut stmts = Vec::new();
        if self.eat(TokenKind::Newline) {
            self.expect(TokenKind::Indent, "an indented block")?;
            while !self.at(TokenKind::Dedent) && !self.at(TokenKind::Eof) {
                while self.eat(TokenKind::Newline) {}
                if self.at(TokenKind::Dedent) || self.at(TokenKind::Eof) {
                    break;
                }
                self.statement(&mut stmts)?;
            }
            self.eat(TokenKind::Dedent);
        } else {
            self.simple_statement_line(&mut stmts)?;
        }
        if stmts.is_empty() {
            return Err(ParseError::new("expected a statement", self.peek().span));
        }
        let span = stmts
            .iter()
            .map(|s| self.span_of(*s))
            .reduce(Span::cover)
            .unwrap();
        Ok(self.add(NodeKind::Block { stmts }, span))
    }

    fn def_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwDef, "`def`")?;
        let name_tok = self.expect(TokenKind::Name, "a function name")?;
        let name = self.add(NodeKind::Name { id: name_tok.text }, name_tok.span);
        self.expect(TokenKind::LParen, "`(`")?;
        let params = self.parameter_list(TokenKind::RParen)?;
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.suite()?;
        let span = Span::new(kw.span.start, self.span_of(body).end);
        Ok(self.add(
            NodeKind::Function {
                name: Some(name),
                args: params.args,
                defaults: params.defaults,
                vararg: params.vararg,
                kwarg: params.kwarg,
                after_rest: params.after_rest,
                blockarg: None,
                body,
                is_lambda: false,
            },
            span,
        ))
    }

    fn class_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwClass, "`class`")?;
        let name_tok = self.expect(TokenKind::Name, "a class name")?;
        let name = self.add(NodeKind::Name { id: name_tok.text }, name_tok.span);
        let mut bases = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) {
                bases.push(self.test()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        let body = self.suite()?;
        let span = Span::new(kw.span.start, self.span_of(body).end);
        Ok(self.add(NodeKind::Class { name, bases, body }, span))
    }

    fn if_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.advance(); // `if` or `elif`
        let test = self.test()?;
        let body = self.suite()?;
        let orelse = if self.at(TokenKind::KwElif) {
            Some(self.if_statement()?)
        } else if self.eat(TokenKind::KwElse) {
            Some(self.suite()?)
        } else {
            None
        };
        let end = orelse
            .map(|n| self.span_of(n).end)
            .unwrap_or(self.span_of(body).end);
        Ok(self.add(
            NodeKind::If { test, body, orelse },
            Span::new(kw.span.start, end),
        ))
    }

    fn while_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwWhile, "`while`")?;
        let test = self.test()?;
        let body = self.suite()?;
        let orelse = if self.eat(TokenKind::KwElse) {
            Some(self.suite()?)
        } else {
            None
        };
        let end = orelse
            .map(|n| self.span_of(n).end)
            .unwrap_or(self.span_of(body).end);
        Ok(self.add(
            NodeKind::While { test, body, orelse },
            Span::new(kw.span.start, end),
        ))
    }

    fn for_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwFor, "`for`")?;
        self.no_in = true;
        let target = self.testlist()?;
        self.no_in = false;
        self.expect(TokenKind::KwIn, "`in`")?;
        let iter = self.testlist()?;
        let body = self.suite()?;
        let orelse = if self.eat(TokenKind::KwElse) {
            Some(self.suite()?)
        } else {
            None
        };
        let end = orelse
            .map(|n| self.span_of(n).end)
            .unwrap_or(self.span_of(body).end);
        Ok(self.add(
            NodeKind::For {
                target,
                iter,
                body,
                orelse,
            },
            Span::new(kw.span.start, end),
        ))
    }

    fn try_statement(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwTry, "`try`")?;
        let body = self.suite()?;
        let mut handlers = Vec::new();
        while self.at(TokenKind::KwExcept) {
            let h_kw = self.advance();
            let mut exceptions = Vec::new();
            let mut binder = None;
            if !self.at(TokenKind::Colon) {
                loop {
                    exceptions.push(self.test()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                if self.eat(TokenKind::KwAs) {
                    let name = self.expect(TokenKind::Name, "a name after `as`")?;
                    binder = Some(self.add(NodeKind::Name { id: name.text }, name.span));
                }
            }
            let h_body = self.suite()?;
            let h_span = Span::new(h_kw.span.start, self.span_of(h_body).end);
            handlers.push(self.add(
                NodeKind::Handler {
                    exceptions,
                    binder,
                    body: h_body,
                },
                h_span,
            ));
        }
        let orelse = if self.eat(TokenKind::KwElse) {
            Some(self.suite()?)
        } else {
            None
        };
        let finalbody = if self.eat(TokenKind::KwFinally) {
            Some(self.suite()?)
        } else {
            None
        };
        if handlers.is_empty() && finalbody.is_none() {
            return Err(ParseError::new(
                "`try` needs an `except` or `finally` clause",
                kw.span,
            ));
        }
        let end = [
            Some(self.span_of(body).end),
            handlers.last().map(|h| self.span_of(*h).end),
            orelse.map(|n| self.span_of(n).end),
            finalbody.map(|n| self.span_of(n).end),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap();
        Ok(self.add(
            NodeKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            Span::new(kw.span.start, end),
        ))
    }

    // ── Parameters ─────────────────────────────────────────────────────

    fn parameter_list(&mut self, end: TokenKind) -> Result<Params, ParseError> {
        let mut params = Params::default();
        let mut seen_vararg = false;
        while !self.at(end) && !self.at(TokenKind::Colon) {
            if self.eat(TokenKind::StarStar) {
                let name = self.expect(TokenKind::Name, "a name after `**`")?;
                params.kwarg = Some(self.add(NodeKind::Name { id: name.text }, name.span));
            } else if self.eat(TokenKind::Star) {
                if seen_vararg {
                    return Err(ParseError::new("duplicate `*` parameter", self.peek().span));
                }
                seen_vararg = true;
                let name = self.expect(TokenKind::Name, "a name after `*`")?;
                params.vararg = Some(self.add(NodeKind::Name { id: name.text }, name.span));
            } else {
                let name = self.expect(TokenKind::Name, "a parameter name")?;
                let param = self.add(NodeKind::Name { id: name.text }, name.span);
                if self.eat(TokenKind::Eq) {
                    if seen_vararg {
                        return Err(ParseError::new(
                            "default values are not allowed after `*`",
                            name.span,
                        ));
                    }
                    params.defaults.push(self.test()?);
                }
                if seen_vararg {
                    params.after_rest.push(param);
                } else {
                    params.args.push(param);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// `test (',' test)*` -- a bare comma builds a Tuple.
    fn testlist(&mut self) -> Result<NodeId, ParseError> {
        let first = self.test()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.starts_expression() {
                elts.push(self.test()?);
            } else {
                break;
            }
        }
        let span = elts
            .iter()
            .map(|e| self.span_of(*e))
            .reduce(Span::cover)
            .unwrap();
        Ok(self.add(NodeKind::Tuple { elts }, span))
    }

    fn starts_expression(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.peek_kind(),
            Name | Int | Float | Str | LParen | LBracket | LBrace | Plus | Minus | Star
                | KwNot | KwLambda
        )
    }

    /// Ternary and lambda layer.
    fn test(&mut self) -> Result<NodeId, ParseError> {
        if self.at(TokenKind::KwLambda) {
            return self.lambda();
        }
        let body = self.or_expr()?;
        if self.eat(TokenKind::KwIf) {
            let test = self.or_expr()?;
            self.expect(TokenKind::KwElse, "`else` in conditional expression")?;
            let orelse = self.test()?;
            let span = self.span_of(body).cover(self.span_of(orelse));
            return Ok(self.add(NodeKind::IfExp { test, body, orelse }, span));
        }
        Ok(body)
    }

    fn lambda(&mut self) -> Result<NodeId, ParseError> {
        let kw = self.expect(TokenKind::KwLambda, "`lambda`")?;
        let params = self.parameter_list(TokenKind::Colon)?;
        self.expect(TokenKind::Colon, "`:`")?;
        let body = self.test()?;
        let span = Span::new(kw.span.start, self.span_of(body).end);
        Ok(self.add(
            NodeKind::Function {
                name: None,
                args: params.args,
                defaults: params.defaults,
                vararg: params.vararg,
                kwarg: params.kwarg,
                after_rest: params.after_rest,
                blockarg: None,
                body,
                is_lambda: true,
            },
            span,
        ))
    }

    fn or_expr(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.and_expr()?;
        while self.eat(TokenKind::KwOr) {
            let right = self.and_expr()?;
            let span = self.span_of(left).cover(self.span_of(right));
            left = self.add(
                NodeKind::BoolOp {
                    op: BoolOpKind::Or,
                    values: vec![left, right],
                },
                span,
            );
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.not_expr()?;
        while self.eat(TokenKind::KwAnd) {
            let right = self.not_expr()?;
            let span = self.span_of(left).cover(self.span_of(right));
            left = self.add(
                NodeKind::BoolOp {
                    op: BoolOpKind::And,
                    values: vec![left, right],
                },
                span,
            );
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<NodeId, ParseError> {
        if self.at(TokenKind::KwNot) {
            let kw = self.advance();
            let operand = self.not_expr()?;
            let span = Span::new(kw.span.start, self.span_of(operand).end);
            return Ok(self.add(
                NodeKind::UnaryOp {
                    op: UnaryOpKind::Not,
                    operand,
                },
                span,
            ));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<NodeId, ParseError> {
        let left = self.arith()?;
        let op = match self.peek_kind() {
            TokenKind::Lt => CmpOpKind::Lt,
            TokenKind::Gt => CmpOpKind::Gt,
            TokenKind::LtEq => CmpOpKind::LtE,
            TokenKind::GtEq => CmpOpKind::GtE,
            TokenKind::EqEq => CmpOpKind::Eq,
            TokenKind::NotEq => CmpOpKind::NotEq,
            TokenKind::KwIs => CmpOpKind::Is,
            TokenKind::KwIn if !self.no_in => CmpOpKind::In,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.arith()?;
        let span = self.span_of(left).cover(self.span_of(right));
        Ok(self.add(NodeKind::Compare { op, left, right }, span))
    }

    fn arith(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            let span = self.span_of(left).cover(self.span_of(right));
            left = self.add(NodeKind::BinOp { op, left, right }, span);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                TokenKind::Percent => BinOpKind::Mod,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            let span = self.span_of(left).cover(self.span_of(right));
            left = self.add(NodeKind::BinOp { op, left, right }, span);
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<NodeId, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOpKind::Neg),
            TokenKind::Plus => Some(UnaryOpKind::Pos),
            _ => None,
        };
        if let Some(op) = op {
            let tok = self.advance();
            let operand = self.factor()?;
            let span = Span::new(tok.span.start, self.span_of(operand).end);
            return Ok(self.add(NodeKind::UnaryOp { op, operand }, span));
        }
        self.power()
    }

    fn power(&mut self) -> Result<NodeId, ParseError> {
        let base = self.postfix()?;
        if self.eat(TokenKind::StarStar) {
            let exp = self.factor()?;
            let span = self.span_of(base).cover(self.span_of(exp));
            return Ok(self.add(
                NodeKind::BinOp {
                    op: BinOpKind::Pow,
                    left: base,
                    right: exp,
                },
                span,
            ));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.atom()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect(TokenKind::Name, "an attribute name")?;
                    let attr = self.add(NodeKind::Name { id: name.text }, name.span);
                    let span = Span::new(self.span_of(expr).start, name.span.end);
                    expr = self.add(NodeKind::Attribute { target: expr, attr }, span);
                }
                TokenKind::LParen => {
                    expr = self.call(expr)?;
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = if self.at(TokenKind::RBracket) {
                        None
                    } else {
                        Some(self.testlist()?)
                    };
                    let close = self.expect(TokenKind::RBracket, "`]`")?;
                    let span = Span::new(self.span_of(expr).start, close.span.end);
                    expr = self.add(NodeKind::Subscript { value: expr, index }, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn call(&mut self, func: NodeId) -> Result<NodeId, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut kwargs = None;
        let mut starargs = None;
        while !self.at(TokenKind::RParen) {
            if self.eat(TokenKind::StarStar) {
                kwargs = Some(self.test()?);
            } else if self.eat(TokenKind::Star) {
                starargs = Some(self.test()?);
            } else if self.at(TokenKind::Name) && self.peek_kind_at(1) == TokenKind::Eq {
                let name = self.advance();
                self.advance(); // `=`
                let value = self.test()?;
                let span = Span::new(name.span.start, self.span_of(value).end);
                keywords.push(self.add(
                    NodeKind::Keyword {
                        arg: name.text,
                        value,
                    },
                    span,
                ));
            } else {
                args.push(self.test()?);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(TokenKind::RParen, "`)`")?;
        let span = Span::new(self.span_of(func).start, close.span.end);
        Ok(self.add(
            NodeKind::Call {
                func,
                args,
                keywords,
                kwargs,
                starargs,
                blockarg: None,
            },
            span,
        ))
    }

    fn atom(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_kind() {
            TokenKind::Int => {
                let tok = self.advance();
                let value = parse_int_literal(&tok.text).ok_or_else(|| {
                    ParseError::new(format!("invalid number literal: {}", tok.text), tok.span)
                })?;
                Ok(self.add(NodeKind::Int { value }, tok.span))
            }
            TokenKind::Float => {
                let tok = self.advance();
                let cleaned: String = tok.text.chars().filter(|c| *c != '_').collect();
                let value = cleaned.parse::<f64>().map_err(|_| {
                    ParseError::new(format!("invalid number literal: {}", tok.text), tok.span)
                })?;
                Ok(self.add(NodeKind::Float { value }, tok.span))
            }
            TokenKind::Str => {
                let tok = self.advance();
                Ok(self.add(NodeKind::Str { value: tok.text }, tok.span))
            }
            TokenKind::Name => {
                let tok = self.advance();
                Ok(self.add(NodeKind::Name { id: tok.text }, tok.span))
            }
            TokenKind::Star => {
                // Starred target in an unpacking assignment.
                let star = self.advance();
                let value = self.postfix()?;
                let span = Span::new(star.span.start, self.span_of(value).end);
                Ok(self.add(NodeKind::Starred { value }, span))
            }
            TokenKind::LParen => {
                let open = self.advance();
                if self.at(TokenKind::RParen) {
                    let close = self.advance();
                    return Ok(self.add(
                        NodeKind::Tuple { elts: vec![] },
                        Span::new(open.span.start, close.span.end),
                    ));
                }
                let inner = self.testlist()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let open = self.advance();
                let mut elts = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    elts.push(self.test()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RBracket, "`]`")?;
                Ok(self.add(
                    NodeKind::ListLit { elts },
                    Span::new(open.span.start, close.span.end),
                ))
            }
            TokenKind::LBrace => self.brace_atom(),
            _ => Err(ParseError::new(
                "expected an expression",
                self.peek().span,
            )),
        }
    }

    /// `{}` is an empty dict; `{k: v, ...}` a dict; `{e, ...}` a set.
    fn brace_atom(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect(TokenKind::LBrace, "`{`")?;
        if self.at(TokenKind::RBrace) {
            let close = self.advance();
            return Ok(self.add(
                NodeKind::DictLit {
                    keys: vec![],
                    values: vec![],
                },
                Span::new(open.span.start, close.span.end),
            ));
        }
        let first = self.test()?;
        if self.eat(TokenKind::Colon) {
            let mut keys = vec![first];
            let mut values = vec![self.test()?];
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBrace) {
                    break;
                }
                keys.push(self.test()?);
                self.expect(TokenKind::Colon, "`:` in dict literal")?;
                values.push(self.test()?);
            }
            let close = self.expect(TokenKind::RBrace, "`}`")?;
            Ok(self.add(
                NodeKind::DictLit { keys, values },
                Span::new(open.span.start, close.span.end),
            ))
        } else {
            let mut elts = vec![first];
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBrace) {
                    break;
                }
                elts.push(self.test()?);
            }
            let close = self.expect(TokenKind::RBrace, "`}`")?;
            Ok(self.add(
                NodeKind::SetLit { elts },
                Span::new(open.span.start, close.span.end),
            ))
        }
    }
}

#[derive(Default)]
struct Params {
    args: Vec<NodeId>,
    defaults: Vec<NodeId>,
    vararg: Option<NodeId>,
    kwarg: Option<NodeId>,
    after_rest: Vec<NodeId>,
}
