//! Value and type parsing.

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse an argument value. Defaults (`constant`) may not reference variables.
    pub(crate) fn parse_value(&mut self, constant: bool) -> ParseResult<ArgValue> {
        let token = self.bump();
        let value = match token.kind.clone() {
            TokenKind::Dollar if constant => {
                return Err(ParseError::at(ParseErrorKind::VariableInDefault, token.span));
            }
            TokenKind::Dollar => ArgValue::Variable(self.name()?),
            TokenKind::Int(i) => ArgValue::Int(i),
            TokenKind::Float(f) => ArgValue::Float(f),
            TokenKind::String(s) => ArgValue::String(s),
            TokenKind::Name(name) => match name.as_str() {
                "true" => ArgValue::Bool(true),
                "false" => ArgValue::Bool(false),
                "null" => ArgValue::Null,
                _ => ArgValue::Enum(name),
            },
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while !self.consume_if(&TokenKind::RBracket) {
                    items.push(self.parse_value(constant)?);
                }
                ArgValue::List(items)
            }
            TokenKind::LBrace => {
                let mut entries = Vec::new();
                while !self.consume_if(&TokenKind::RBrace) {
                    let key = self.name()?;
                    self.require(&TokenKind::Colon)?;
                    entries.push((key, self.parse_value(constant)?));
                }
                ArgValue::Object(entries)
            }
            _ => return Err(ParseError::unexpected(&token, "value")),
        };
        Ok(value)
    }

    /// Parse `Name`, `[Type]` and `Type!`.
    pub(crate) fn parse_type_ref(&mut self) -> ParseResult<TypeRef> {
        let inner = if self.consume_if(&TokenKind::LBracket) {
            let item = self.parse_type_ref()?;
            self.require(&TokenKind::RBracket)?;
            TypeRef::List(Box::new(item))
        } else {
            TypeRef::Named(self.name()?)
        };

        if self.consume_if(&TokenKind::Bang) {
            Ok(TypeRef::NonNull(Box::new(inner)))
        } else {
            Ok(inner)
        }
    }
}
