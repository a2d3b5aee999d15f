//! Selection set parsing.

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse `{ field* }`.
    pub(crate) fn parse_selection_set(&mut self) -> ParseResult<SelectionSet> {
        self.require(&TokenKind::LBrace)?;
        let mut fields = Vec::new();

        while !self.consume_if(&TokenKind::RBrace) {
            if self.at(&TokenKind::Spread) {
                return Err(ParseError::at(ParseErrorKind::Fragment, self.peek().span));
            }
            fields.push(self.parse_field()?);
        }

        if fields.is_empty() {
            return Err(ParseError::at(ParseErrorKind::EmptySelection, self.peek().span));
        }
        Ok(SelectionSet::new(fields))
    }

    fn parse_field(&mut self) -> ParseResult<Field> {
        let span = self.peek().span;
        let first = self.name()?;

        let (alias, name) = if self.consume_if(&TokenKind::Colon) {
            (Some(first), self.name()?)
        } else {
            (None, first)
        };

        let arguments = if self.at(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        let mut directives = Vec::new();
        while self.consume_if(&TokenKind::At) {
            let name = self.name()?;
            let arguments = if self.at(&TokenKind::LParen) {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            directives.push(Directive { name, arguments });
        }

        let selection = if self.at(&TokenKind::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection,
            span,
        })
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Argument>> {
        self.require(&TokenKind::LParen)?;
        let mut arguments = Vec::new();
        while !self.consume_if(&TokenKind::RParen) {
            let name = self.name()?;
            self.require(&TokenKind::Colon)?;
            let value = self.parse_value(false)?;
            arguments.push(Argument { name, value });
        }
        Ok(arguments)
    }
}
