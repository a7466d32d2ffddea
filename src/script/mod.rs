//! The built-in scripting language.
//!
//! Two dialects share one lexer, parser and AST:
//!
//! * *plain script*: the directly executable language run by [`Engine`];
//! * *extended script*: plain script plus syntax sugar, accepted only by the
//!   compiler and only for the features enabled in [`Syntax`].

pub mod ast;
pub mod context;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod value;

pub use context::Context;
pub use engine::{Engine, Script};
pub use parser::{Syntax, parse};
pub use value::Value;

use ast::Span;

/// A lexing or parsing failure at a byte range of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
