//! Lectern Parser
//!
//! Query shapes are written in a GraphQL-compatible subset: one query or
//! mutation per document with variable definitions, aliases, arguments and
//! `@include`/`@skip`. Fragments are rejected. Besides the AST, the crate
//! derives field storage keys and prints operations back to text for the
//! transport.

mod ast;
mod error;
mod lexer;
mod parser;
mod printer;

pub use ast::*;
pub use error::*;
pub use parser::{parse_operation, parse_selection, Parser};
