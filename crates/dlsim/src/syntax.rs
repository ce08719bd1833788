//! Front end for the netlist language: tokens, AST and a recursive-descent
//! parser with span-carrying diagnostics.

pub mod ast;
mod grammar;
mod lexer;

pub use ast::*;
pub use lexer::Span;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("invalid literal `{literal}`: {reason}")]
    InvalidLiteral { literal: String, reason: String },
    #[error("unknown system function `${0}`")]
    UnknownFunction(String),
    #[error("unterminated block comment")]
    UnterminatedComment,
}

/// A lexing or parsing failure, pointing into the netlist source.
#[derive(Error, Debug, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(dlsim::syntax))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

impl SyntaxError {
    fn new(name: &str, source: &str, kind: SyntaxErrorKind, span: Span) -> Self {
        Self {
            kind,
            src: NamedSource::new(name, source.to_string()),
            span: span.into(),
        }
    }
}

/// Parses netlist source text.
pub fn parse(source: &str) -> Result<SourceFile, SyntaxError> {
    parse_named("netlist", source)
}

/// Parses netlist source text, naming it `name` in diagnostics.
pub fn parse_named(name: &str, source: &str) -> Result<SourceFile, SyntaxError> {
    let tokens = lexer::tokenize(source)
        .map_err(|(kind, span)| SyntaxError::new(name, source, kind, span))?;
    grammar::Parser::new(tokens)
        .source_file()
        .map_err(|(kind, span)| SyntaxError::new(name, source, kind, span))
}
