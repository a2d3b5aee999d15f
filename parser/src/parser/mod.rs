//! Parser for query-shape documents.
//!
//! This module is organized into submodules by parsing category:
//! - `selection`: Selection sets, fields, arguments and directives
//! - `value`: Argument values and variable types

mod selection;
mod value;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

// ==================== PARSER STATE ====================

/// Recursive-descent parser over a lexed document.
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(input: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: Lexer::new(input).tokenize()?,
            cursor: 0,
        })
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    /// Current token. Sticks at `Eof`, which the lexer always emits last.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.cursor.min(last)]
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    /// Same token type, ignoring any payload.
    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(name) if name == keyword)
    }

    pub(crate) fn consume_if(&mut self, kind: &TokenKind) -> bool {
        let hit = self.at(kind);
        if hit {
            self.bump();
        }
        hit
    }

    pub(crate) fn require(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if !self.at(kind) {
            return Err(ParseError::unexpected(self.peek(), kind));
        }
        Ok(self.bump())
    }

    pub(crate) fn name(&mut self) -> ParseResult<String> {
        if let TokenKind::Name(name) = &self.peek().kind {
            let name = name.clone();
            self.bump();
            return Ok(name);
        }
        Err(ParseError::unexpected(self.peek(), "name"))
    }

    fn finish(&self) -> ParseResult<()> {
        match self.peek().kind {
            TokenKind::Eof => Ok(()),
            _ => Err(ParseError::unexpected(self.peek(), TokenKind::Eof)),
        }
    }
}

// ==================== OPERATIONS ====================

impl Parser {
    /// Parse a single operation.
    pub fn parse_operation(&mut self) -> ParseResult<Operation> {
        let start = self.peek().span;

        let kind = if self.at(&TokenKind::LBrace) {
            OperationKind::Query
        } else if let Some(kind) = [("query", OperationKind::Query), ("mutation", OperationKind::Mutation)]
            .into_iter()
            .find_map(|(keyword, kind)| self.at_keyword(keyword).then_some(kind))
        {
            self.bump();
            kind
        } else {
            return Err(ParseError::unexpected(self.peek(), "query, mutation or '{'"));
        };

        let name = if self.at(&TokenKind::Name(String::new())) {
            Some(self.name()?)
        } else {
            None
        };

        let variables = if self.at(&TokenKind::LParen) {
            self.parse_variable_defs()?
        } else {
            Vec::new()
        };

        let selection = self.parse_selection_set()?;
        let end = self.peek().span;
        self.finish()?;

        Ok(Operation {
            kind,
            name,
            variables,
            selection,
            span: Span::new(start.start, end.start, start.line, start.column),
        })
    }

    fn parse_variable_defs(&mut self) -> ParseResult<Vec<VariableDef>> {
        self.require(&TokenKind::LParen)?;
        let mut defs = Vec::new();
        while !self.consume_if(&TokenKind::RParen) {
            self.require(&TokenKind::Dollar)?;
            let name = self.name()?;
            self.require(&TokenKind::Colon)?;
            let type_ref = self.parse_type_ref()?;
            let default = if self.consume_if(&TokenKind::Eq) {
                Some(self.parse_value(true)?)
            } else {
                None
            };
            defs.push(VariableDef {
                name,
                type_ref,
                default,
            });
        }
        Ok(defs)
    }
}

// ==================== ENTRY POINTS ====================

/// Parse an operation document.
pub fn parse_operation(input: &str) -> ParseResult<Operation> {
    Parser::new(input)?.parse_operation()
}

/// Parse a bare selection set such as `{ id title }`.
pub fn parse_selection(input: &str) -> ParseResult<SelectionSet> {
    let mut parser = Parser::new(input)?;
    let selection = parser.parse_selection_set()?;
    parser.finish()?;
    Ok(selection)
}
