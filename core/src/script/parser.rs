use std::rc::Rc;

use super::ast::{BinOp, Expr, Handler, Stmt, StmtKind, Target};
use super::lexer::{Spanned, Token};
use crate::runtime::{VmError, VmResult};
use crate::value::Val;

const KEYWORDS: &[&str] = &["try", "except", "pass", "as", "is", "not"];

/// Deepest nesting of expressions and blocks the parser accepts.
pub const MAX_NESTING: usize = 200;

pub struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Spanned]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// One level deeper. Every bracket, unary minus, block and chained
    /// binary operator counts, so the depth bounds the AST height.
    fn grow(&mut self, what: &str) -> VmResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(VmError::syntax(format!("{} nested too deeply", what), self.line()));
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(&mut self, what: &str, parse: impl FnOnce(&mut Self) -> VmResult<T>) -> VmResult<T> {
        self.grow(what)?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub fn parse_program(&mut self) -> VmResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&Token::Eof) {
            if self.check(&Token::Newline) {
                self.advance();
                continue;
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    /// Parse a single expression spanning the whole token stream.
    pub fn parse_expression(&mut self) -> VmResult<Expr> {
        let expr = self.expression_list()?;
        if !self.check(&Token::Eof) && !self.check(&Token::Newline) {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    fn current(&self) -> &Spanned {
        // The tokenizer always terminates the stream with `Eof`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn line(&self) -> u32 {
        self.current().line
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn check_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == kw)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> VmResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn unexpected(&self, wanted: &str) -> VmError {
        VmError::syntax(format!("expected {}, found {}", wanted, self.peek()), self.line())
    }

    fn identifier(&mut self) -> VmResult<Rc<str>> {
        match self.peek().clone() {
            Token::Name(name) if !KEYWORDS.contains(&name.as_str()) => {
                self.advance();
                Ok(Rc::from(name))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn end_of_statement(&mut self) -> VmResult<()> {
        if self.eat(&Token::Newline) || self.check(&Token::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of line"))
        }
    }

    fn statement(&mut self) -> VmResult<Stmt> {
        let line = self.line();
        if self.eat_keyword("try") {
            return self.try_statement(line);
        }
        if self.eat_keyword("pass") {
            self.end_of_statement()?;
            return Ok(Stmt {
                kind: StmtKind::Pass,
                line,
            });
        }

        let expr = self.expression_list()?;
        let kind = match self.peek() {
            Token::Assign => {
                self.advance();
                let target = self.target(expr)?;
                StmtKind::Assign(target, self.expression_list()?)
            }
            Token::AddAssign | Token::SubAssign | Token::MulAssign => {
                let op = match self.advance() {
                    Token::AddAssign => BinOp::Add,
                    Token::SubAssign => BinOp::Sub,
                    _ => BinOp::Mul,
                };
                let target = self.target(expr)?;
                StmtKind::AugAssign(target, op, self.expression()?)
            }
            _ => StmtKind::Expr(expr),
        };
        self.end_of_statement()?;
        Ok(Stmt { kind, line })
    }

    fn target(&self, expr: Expr) -> VmResult<Target> {
        match expr {
            Expr::Name(name) => Ok(Target::Name(name)),
            Expr::Attr(obj, name) => Ok(Target::Attr(*obj, name)),
            _ => Err(VmError::syntax("cannot assign to expression", self.line())),
        }
    }

    fn try_statement(&mut self, line: u32) -> VmResult<Stmt> {
        self.expect(&Token::Colon)?;
        let body = self.block()?;
        let mut handlers = Vec::new();
        while self.eat_keyword("except") {
            let kind = if self.check(&Token::Colon) {
                None
            } else {
                Some(self.identifier()?)
            };
            let alias = if kind.is_some() && self.eat_keyword("as") {
                Some(self.identifier()?)
            } else {
                None
            };
            self.expect(&Token::Colon)?;
            let body = self.block()?;
            handlers.push(Handler { kind, alias, body });
        }
        if handlers.is_empty() {
            return Err(self.unexpected("'except'"));
        }
        Ok(Stmt {
            kind: StmtKind::Try { body, handlers },
            line,
        })
    }

    fn block(&mut self) -> VmResult<Vec<Stmt>> {
        self.nested("block", Self::block_body)
    }

    fn block_body(&mut self) -> VmResult<Vec<Stmt>> {
        self.expect(&Token::Newline)?;
        self.expect(&Token::Indent)?;
        let mut stmts = Vec::new();
        while !self.eat(&Token::Dedent) {
            if self.check(&Token::Eof) {
                return Err(self.unexpected("dedent"));
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    /// `a, b` at statement level builds a tuple.
    fn expression_list(&mut self) -> VmResult<Expr> {
        let first = self.expression()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_expression_end() {
                break;
            }
            items.push(self.expression()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek(),
            Token::Newline | Token::Eof | Token::Assign | Token::RParen | Token::RBracket
        )
    }

    pub fn expression(&mut self) -> VmResult<Expr> {
        self.nested("expression", Self::comparison)
    }

    fn comparison(&mut self) -> VmResult<Expr> {
        let mut lhs = self.additive()?;
        let mut chain = 0;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                Token::Name(n) if n == "is" => BinOp::Is,
                _ => break,
            };
            self.advance();
            self.grow("expression")?;
            chain += 1;
            let op = if op == BinOp::Is && self.eat_keyword("not") {
                BinOp::IsNot
            } else {
                op
            };
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn additive(&mut self) -> VmResult<Expr> {
        let mut lhs = self.term()?;
        let mut chain = 0;
        loop {
            let op = match self.peek() {
                Token::Add => BinOp::Add,
                Token::Sub => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.grow("expression")?;
            chain += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn term(&mut self) -> VmResult<Expr> {
        let mut lhs = self.unary()?;
        let mut chain = 0;
        loop {
            let op = match self.peek() {
                Token::Mul => BinOp::Mul,
                Token::Div => BinOp::Div,
                _ => break,
            };
            self.advance();
            self.grow("expression")?;
            chain += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn unary(&mut self) -> VmResult<Expr> {
        if self.eat(&Token::Sub) {
            return Ok(match self.nested("expression", Self::unary)? {
                Expr::Lit(Val::Int(i)) => Expr::Lit(Val::Int(i.wrapping_neg())),
                Expr::Lit(Val::Float(x)) => Expr::Lit(Val::Float(-x)),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> VmResult<Expr> {
        let mut expr = self.atom()?;
        let mut chain = 0;
        loop {
            if self.eat(&Token::Dot) {
                self.grow("expression")?;
                chain += 1;
                let name = self.identifier()?;
                expr = Expr::Attr(Box::new(expr), name);
            } else if self.eat(&Token::LParen) {
                self.grow("expression")?;
                chain += 1;
                let (args, kwargs) = self.call_arguments()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    kwargs,
                };
            } else {
                self.depth -= chain;
                return Ok(expr);
            }
        }
    }

    fn call_arguments(&mut self) -> VmResult<(Vec<Expr>, Vec<(Rc<str>, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(Rc<str>, Expr)> = Vec::new();
        while !self.eat(&Token::RParen) {
            let is_keyword = matches!(self.peek(), Token::Name(_))
                && matches!(self.tokens.get(self.pos + 1).map(|s| &s.token), Some(Token::Assign));
            if is_keyword {
                let name = self.identifier()?;
                self.advance();
                kwargs.push((name, self.expression()?));
            } else {
                if !kwargs.is_empty() {
                    return Err(VmError::syntax(
                        "positional argument follows keyword argument",
                        self.line(),
                    ));
                }
                args.push(self.expression()?);
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                break;
            }
        }
        Ok((args, kwargs))
    }

    fn atom(&mut self) -> VmResult<Expr> {
        match self.peek().clone() {
            Token::Int(i) => {
                self.advance();
                Ok(Expr::Lit(Val::Int(i)))
            }
            Token::Float(x) => {
                self.advance();
                Ok(Expr::Lit(Val::Float(x)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Lit(Val::from(s)))
            }
            Token::Name(n) if n == "None" => {
                self.advance();
                Ok(Expr::Lit(Val::None))
            }
            Token::Name(n) if n == "True" || n == "False" => {
                self.advance();
                Ok(Expr::Lit(Val::Bool(n == "True")))
            }
            Token::Name(_) => Ok(Expr::Name(self.identifier()?)),
            Token::LParen => {
                self.advance();
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.expression_list()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat(&Token::RBracket) {
                    items.push(self.expression()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::List(items))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}
