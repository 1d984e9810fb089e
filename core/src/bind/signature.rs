use std::fmt;
use std::rc::Rc;

use super::BindError;
use crate::script::lexer::{Spanned, Token, Tokenizer};
use crate::value::Val;

/// One declared parameter of a bound callable.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Rc<str>,
    pub default: Option<Val>,
    pub hint: Option<Rc<str>>,
}

/// Parsed form of a signature string such as
/// `"print(self, s, sep=' ', *rest) -> str"`.
#[derive(Debug, Clone)]
pub struct Signature {
    name: Rc<str>,
    params: Vec<Param>,
    rest: Option<Rc<str>>,
    /// Parameters before this index accept positional arguments
    positional: usize,
    returns: Option<Rc<str>>,
    text: Rc<str>,
}

impl Signature {
    pub fn parse(text: &str) -> Result<Signature, BindError> {
        let malformed = |reason: String| BindError::MalformedSignature {
            signature: text.to_string(),
            reason,
        };
        let tokens = Tokenizer::tokenize_fragment(text).map_err(|e| malformed(e.message))?;
        SignatureParser {
            tokens: &tokens,
            pos: 0,
            text,
        }
        .parse()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Name of the `*rest` collector, if declared.
    pub fn rest(&self) -> Option<&str> {
        self.rest.as_deref()
    }

    /// Count of leading parameters that positional arguments can fill.
    pub fn positional(&self) -> usize {
        self.positional
    }

    pub fn returns(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    /// Number of named parameters (the `*rest` slot is not counted).
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Number of slots an `ArgsView` over this signature exposes.
    pub fn slot_count(&self) -> usize {
        self.params.len() + usize::from(self.rest.is_some())
    }

    pub fn required(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| &*p.name == name)
    }

    pub fn param_name(&self, index: usize) -> &str {
        match self.params.get(index) {
            Some(p) => &p.name,
            None => self.rest.as_deref().unwrap_or("*"),
        }
    }

    /// Remove the implicit receiver (`self` or `cls`) from the front.
    pub(crate) fn strip_receiver(&mut self, expected: &'static str) -> Result<(), BindError> {
        match self.params.first() {
            Some(p) if &*p.name == expected && p.default.is_none() && self.positional > 0 => {
                self.params.remove(0);
                self.positional -= 1;
                Ok(())
            }
            _ => Err(BindError::MissingReceiver {
                signature: self.text.to_string(),
                expected,
            }),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct SignatureParser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    text: &'a str,
}

impl SignatureParser<'_> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn fail(&self, reason: impl Into<String>) -> BindError {
        BindError::MalformedSignature {
            signature: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn name(&mut self, what: &str) -> Result<Rc<str>, BindError> {
        match self.advance() {
            Token::Name(n) => Ok(Rc::from(n)),
            other => Err(self.fail(format!("expected {}, found {}", what, other))),
        }
    }

    /// `name ('.' name)*`
    fn hint(&mut self) -> Result<Rc<str>, BindError> {
        let mut hint = self.name("type hint")?.to_string();
        while self.eat(&Token::Dot) {
            hint.push('.');
            hint.push_str(&self.name("type hint")?);
        }
        Ok(Rc::from(hint))
    }

    fn literal(&mut self) -> Result<Val, BindError> {
        let negative = self.eat(&Token::Sub);
        let value = match self.advance() {
            Token::Int(i) => Val::Int(if negative { -i } else { i }),
            Token::Float(x) => Val::Float(if negative { -x } else { x }),
            Token::Str(s) if !negative => Val::from(s),
            Token::Name(n) if !negative && n == "None" => Val::None,
            Token::Name(n) if !negative && n == "True" => Val::Bool(true),
            Token::Name(n) if !negative && n == "False" => Val::Bool(false),
            other => return Err(self.fail(format!("unsupported default literal {}", other))),
        };
        Ok(value)
    }

    fn parse(mut self) -> Result<Signature, BindError> {
        let name = self.name("callable name")?;
        if !self.eat(&Token::LParen) {
            return Err(self.fail("expected '(' after the callable name"));
        }

        let mut params: Vec<Param> = Vec::new();
        let mut rest: Option<Rc<str>> = None;
        let mut positional = None;
        if !self.eat(&Token::RParen) {
            loop {
                if self.eat(&Token::Mul) {
                    if rest.is_some() {
                        return Err(self.fail("only one '*' parameter is allowed"));
                    }
                    let rest_name = self.name("parameter name after '*'")?;
                    if params.iter().any(|p| p.name == rest_name) {
                        return Err(self.fail(format!("duplicate parameter '{}'", rest_name)));
                    }
                    rest = Some(rest_name);
                    positional = Some(params.len());
                } else {
                    let param_name = self.name("parameter name")?;
                    if params.iter().any(|p| p.name == param_name) || rest.as_ref() == Some(&param_name) {
                        return Err(self.fail(format!("duplicate parameter '{}'", param_name)));
                    }
                    let hint = if self.eat(&Token::Colon) { Some(self.hint()?) } else { None };
                    let default = if self.eat(&Token::Assign) { Some(self.literal()?) } else { None };
                    // Parameters after `*rest` are keyword-only and may stay mandatory.
                    if rest.is_none() && default.is_none() && params.iter().any(|p| p.default.is_some()) {
                        return Err(self.fail(format!(
                            "parameter '{}' without a default follows a parameter with one",
                            param_name
                        )));
                    }
                    params.push(Param {
                        name: param_name,
                        default,
                        hint,
                    });
                }
                if self.eat(&Token::RParen) {
                    break;
                }
                if !self.eat(&Token::Comma) {
                    return Err(self.fail(format!("expected ',' or ')', found {}", self.peek())));
                }
                // Allow a trailing comma before `)`.
                if self.eat(&Token::RParen) {
                    break;
                }
            }
        }

        let returns = if self.eat(&Token::Arrow) { Some(self.hint()?) } else { None };
        if !matches!(self.peek(), Token::Eof) {
            return Err(self.fail(format!("unexpected {} after the parameter list", self.peek())));
        }

        Ok(Signature {
            name,
            positional: positional.unwrap_or(params.len()),
            params,
            rest,
            returns,
            text: Rc::from(self.text.trim()),
        })
    }
}
