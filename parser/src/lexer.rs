//! Tokenizer for query-shape documents.
//!
//! Commas are insignificant and skipped like whitespace; `#` starts a comment
//! running to the end of the line.

use crate::{ParseError, ParseErrorKind, ParseResult, Span};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Keywords such as `query` or `true` are contextual names.
    Name(String),
    Int(i64),
    Float(f64),
    String(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Bang,
    Eq,
    At,
    Dollar,
    Spread,
    Eof,
}

static PUNCTUATORS: [(char, TokenKind); 11] = [
    ('(', TokenKind::LParen),
    (')', TokenKind::RParen),
    ('{', TokenKind::LBrace),
    ('}', TokenKind::RBrace),
    ('[', TokenKind::LBracket),
    (']', TokenKind::RBracket),
    (':', TokenKind::Colon),
    ('!', TokenKind::Bang),
    ('=', TokenKind::Eq),
    ('@', TokenKind::At),
    ('$', TokenKind::Dollar),
];

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Name(_) => f.write_str("name"),
            TokenKind::Int(i) => write!(f, "integer {i}"),
            TokenKind::Float(x) => write!(f, "float {x}"),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Spread => f.write_str("'...'"),
            TokenKind::Eof => f.write_str("end of input"),
            punct => match PUNCTUATORS.iter().find(|(_, kind)| kind == punct) {
                Some((c, _)) => write!(f, "'{c}'"),
                None => f.write_str("token"),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Byte cursor over the source, tracking line and column for spans.
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Lex the whole source. The result always ends with one `Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.offset;
        }
        Some(c)
    }

    /// Consume while `pred` holds and return the consumed text.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.source[start..self.offset]
    }

    fn mark(&self) -> Span {
        Span::new(self.offset, self.offset, self.line, self.offset - self.line_start + 1)
    }

    fn skip_trivia(&mut self) {
        loop {
            self.take_while(|c| c.is_whitespace() || c == ',');
            if self.peek() != Some('#') {
                return;
            }
            self.take_while(|c| c != '\n');
        }
    }

    fn token(&mut self) -> ParseResult<Token> {
        self.skip_trivia();
        let mut span = self.mark();

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                TokenKind::Name(self.take_while(|c| c == '_' || c.is_ascii_alphanumeric()).to_string())
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(span)?,
            Some('"') => self.string(span)?,
            Some('.') if self.rest().starts_with("...") => {
                self.offset += 3;
                TokenKind::Spread
            }
            Some(c) => {
                let Some((_, kind)) = PUNCTUATORS.iter().find(|(p, _)| *p == c) else {
                    return Err(ParseError::at(ParseErrorKind::BadCharacter(c), span));
                };
                self.bump();
                kind.clone()
            }
        };

        span.end = self.offset;
        Ok(Token { kind, span })
    }

    fn number(&mut self, span: Span) -> ParseResult<TokenKind> {
        let start = self.offset;
        if self.peek() == Some('-') {
            self.bump();
        }
        self.take_while(|c| c.is_ascii_digit());
        let mut float = false;
        if self.peek() == Some('.') && !self.rest().starts_with("...") {
            float = true;
            self.bump();
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.take_while(|c| c.is_ascii_digit());
        }

        let text = &self.source[start..self.offset];
        let bad = || ParseError::at(ParseErrorKind::BadNumber(text.to_string()), span);
        if float {
            text.parse().map(TokenKind::Float).map_err(|_| bad())
        } else {
            text.parse().map(TokenKind::Int).map_err(|_| bad())
        }
    }

    fn string(&mut self, span: Span) -> ParseResult<TokenKind> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::String(value)),
                Some('\\') => value.push(match self.bump() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some(c @ ('"' | '\\' | '/')) => c,
                    Some(other) => return Err(ParseError::at(ParseErrorKind::BadEscape(other), span)),
                    None => return Err(ParseError::at(ParseErrorKind::UnterminatedString, span)),
                }),
                Some('\n') | None => return Err(ParseError::at(ParseErrorKind::UnterminatedString, span)),
                Some(c) => value.push(c),
            }
        }
    }
}
