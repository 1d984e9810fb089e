use std::fmt;

use crate::runtime::{VmError, VmResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Colon,     // :
    Dot,       // .
    Assign,    // =
    AddAssign, // +=
    SubAssign, // -=
    MulAssign, // *=
    Add,       // +
    Sub,       // -
    Mul,       // *
    Div,       // /
    Eq,        // ==
    Ne,        // !=
    Arrow,     // ->
    Newline,
    Indent,
    Dedent,
    Str(String),
    Int(i64),
    Float(f64),
    /// Identifiers and keywords alike; the parser tells them apart
    Name(String),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Dot => f.write_str("'.'"),
            Token::Assign => f.write_str("'='"),
            Token::AddAssign => f.write_str("'+='"),
            Token::SubAssign => f.write_str("'-='"),
            Token::MulAssign => f.write_str("'*='"),
            Token::Add => f.write_str("'+'"),
            Token::Sub => f.write_str("'-'"),
            Token::Mul => f.write_str("'*'"),
            Token::Div => f.write_str("'/'"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::Arrow => f.write_str("'->'"),
            Token::Newline => f.write_str("end of line"),
            Token::Indent => f.write_str("indent"),
            Token::Dedent => f.write_str("dedent"),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Int(i) => write!(f, "integer {}", i),
            Token::Float(x) => write!(f, "float {}", x),
            Token::Name(n) => write!(f, "'{}'", n),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    /// Open bracket depth; newlines inside brackets are not significant
    depth: usize,
    indents: Vec<usize>,
    layout: bool,
    out: Vec<Spanned>,
}

impl Tokenizer {
    fn new(src: &str, layout: bool) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            depth: 0,
            indents: vec![0],
            layout,
            out: Vec::new(),
        }
    }

    /// Tokenize a whole script, producing `Newline`/`Indent`/`Dedent` tokens.
    pub fn tokenize(src: &str) -> VmResult<Vec<Spanned>> {
        let mut lexer = Self::new(src, true);
        lexer.run()?;
        Ok(lexer.out)
    }

    /// Tokenize a single-line fragment (an expression or a signature) where
    /// line breaks and indentation carry no meaning.
    pub fn tokenize_fragment(src: &str) -> VmResult<Vec<Spanned>> {
        let mut lexer = Self::new(src, false);
        lexer.run()?;
        Ok(lexer.out)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token) {
        self.out.push(Spanned { token, line: self.line });
    }

    fn run(&mut self) -> VmResult<()> {
        let mut at_line_start = true;
        while self.pos < self.chars.len() {
            if at_line_start && self.layout && self.depth == 0 {
                if self.handle_indentation()? {
                    continue;
                }
                at_line_start = false;
            }
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };
            match c {
                '\n' => {
                    self.pos += 1;
                    if self.layout && self.depth == 0 {
                        self.push(Token::Newline);
                        at_line_start = true;
                    }
                    self.line += 1;
                }
                ' ' | '\t' | '\r' => self.pos += 1,
                '#' => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.pos += 2;
                    self.line += 1;
                }
                '"' | '\'' => self.lex_string(c)?,
                '0'..='9' => self.lex_number()?,
                c if c == '_' || c.is_alphabetic() => self.lex_name(),
                _ => self.lex_punct(c)?,
            }
        }

        if self.layout {
            if !matches!(self.out.last().map(|s| &s.token), None | Some(Token::Newline)) {
                self.push(Token::Newline);
            }
            while self.indents.len() > 1 {
                self.indents.pop();
                self.push(Token::Dedent);
            }
        }
        self.push(Token::Eof);
        Ok(())
    }

    /// Measure the indentation of the line at `pos`. Returns `true` when the
    /// line is blank or a comment and was skipped entirely.
    fn handle_indentation(&mut self) -> VmResult<bool> {
        let mut width = 0usize;
        let mut look = self.pos;
        while let Some(&ch) = self.chars.get(look) {
            match ch {
                ' ' => width += 1,
                '\t' => width += 4,
                _ => break,
            }
            look += 1;
        }
        match self.chars.get(look) {
            None => {
                self.pos = look;
                return Ok(true);
            }
            Some('\n') => {
                self.pos = look + 1;
                self.line += 1;
                return Ok(true);
            }
            Some('\r') if self.chars.get(look + 1) == Some(&'\n') => {
                self.pos = look + 2;
                self.line += 1;
                return Ok(true);
            }
            Some('#') => {
                self.pos = look;
                while let Some(ch) = self.peek() {
                    self.pos += 1;
                    if ch == '\n' {
                        self.line += 1;
                        break;
                    }
                }
                return Ok(true);
            }
            _ => {}
        }
        self.pos = look;

        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(Token::Indent);
        } else {
            while width < self.indents.last().copied().unwrap_or(0) {
                self.indents.pop();
                self.push(Token::Dedent);
            }
            if width != self.indents.last().copied().unwrap_or(0) {
                return Err(VmError::syntax("unindent does not match any outer indentation level", self.line));
            }
        }
        Ok(false)
    }

    fn lex_string(&mut self, quote: char) -> VmResult<()> {
        let start_line = self.line;
        self.pos += 1;
        let mut s = String::new();
        loop {
            let c = match self.peek() {
                Some(c) => c,
                None => return Err(VmError::syntax("unterminated string literal", start_line)),
            };
            self.pos += 1;
            match c {
                c if c == quote => break,
                '\n' => return Err(VmError::syntax("unterminated string literal", start_line)),
                '\\' => {
                    let escaped = self
                        .peek()
                        .ok_or_else(|| VmError::syntax("unterminated string literal", start_line))?;
                    self.pos += 1;
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        '0' => s.push('\0'),
                        '\\' => s.push('\\'),
                        '\'' => s.push('\''),
                        '"' => s.push('"'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                }
                c => s.push(c),
            }
        }
        self.push(Token::Str(s));
        Ok(())
    }

    fn lex_number(&mut self) -> VmResult<()> {
        let start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.pos += 1;
            } else if c == '.' && !is_float && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                is_float = true;
                self.pos += 1;
            } else if (c == 'e' || c == 'E')
                && (self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
                    || (matches!(self.peek_at(1), Some('+' | '-'))
                        && self.peek_at(2).is_some_and(|d| d.is_ascii_digit())))
            {
                is_float = true;
                self.pos += 2;
            } else {
                break;
            }
        }
        // `1.` is a float too
        if !is_float && self.peek() == Some('.') && !self.peek_at(1).is_some_and(|c| c.is_alphabetic() || c == '_') {
            is_float = true;
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().filter(|c| **c != '_').collect();
        if is_float {
            let value = text
                .parse::<f64>()
                .map_err(|_| VmError::syntax(format!("invalid float literal '{}'", text), self.line))?;
            self.push(Token::Float(value));
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| VmError::syntax(format!("integer literal '{}' is out of range", text), self.line))?;
            self.push(Token::Int(value));
        }
        Ok(())
    }

    fn lex_name(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        self.push(Token::Name(name));
    }

    fn lex_punct(&mut self, c: char) -> VmResult<()> {
        let next = self.peek_at(1);
        let (token, width) = match (c, next) {
            ('+', Some('=')) => (Token::AddAssign, 2),
            ('-', Some('=')) => (Token::SubAssign, 2),
            ('*', Some('=')) => (Token::MulAssign, 2),
            ('-', Some('>')) => (Token::Arrow, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('+', _) => (Token::Add, 1),
            ('-', _) => (Token::Sub, 1),
            ('*', _) => (Token::Mul, 1),
            ('/', _) => (Token::Div, 1),
            ('=', _) => (Token::Assign, 1),
            (',', _) => (Token::Comma, 1),
            (':', _) => (Token::Colon, 1),
            ('.', _) => (Token::Dot, 1),
            ('(', _) => {
                self.depth += 1;
                (Token::LParen, 1)
            }
            ('[', _) => {
                self.depth += 1;
                (Token::LBracket, 1)
            }
            (')', _) => {
                self.depth = self.depth.saturating_sub(1);
                (Token::RParen, 1)
            }
            (']', _) => {
                self.depth = self.depth.saturating_sub(1);
                (Token::RBracket, 1)
            }
            (other, _) => {
                return Err(VmError::syntax(format!("unexpected character '{}'", other), self.line));
            }
        };
        self.push(token);
        self.pos += width;
        Ok(())
    }
}
