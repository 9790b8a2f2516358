use crate::diagnostic::Diagnostic;
use crate::interpreter::{ExecutionError, ParseError};
use crate::lexer::LexError;
use thiserror::Error;

/// Any failure of the lex, parse, run pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Execution(#[from] ExecutionError),
}

impl Error {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::Lex(e) => e.to_diagnostic(),
            Error::Parse(e) => e.to_diagnostic(),
            Error::Execution(e) => e.to_diagnostic(),
        }
    }
}
