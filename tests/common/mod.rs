#![allow(dead_code)]

use nestlang::interpreter::parse_and_run;
use nestlang::{tokenize, Error, Token};

/// Run a program that is expected to succeed and return what it printed.
pub fn run(source: &str) -> String {
    parse_and_run(source).unwrap_or_else(|e| panic!("program failed: {}\n{}", e, source))
}

/// Run a program that is expected to fail anywhere in the pipeline.
pub fn run_err(source: &str) -> Error {
    match parse_and_run(source) {
        Ok(output) => panic!("program should have failed but printed {:?}\n{}", output, source),
        Err(e) => e,
    }
}

pub fn tokens(source: &str) -> Vec<Token> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("lexing failed: {}\n{}", e, source))
        .into_iter()
        .map(|st| st.token)
        .collect()
}

pub fn ident(name: &str) -> Token {
    Token::Identifier(name.to_string())
}
