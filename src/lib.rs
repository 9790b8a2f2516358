pub mod ast;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod matcher;
pub mod token;

pub use ast::{Chain, ExprNode, Stmt, ValueNode};
pub use config::Limits;
pub use error::Error;
pub use interpreter::{parse, parse_and_run, run_program, Interpreter};
pub use lexer::{tokenize, tokenize_with_limits, LexError};
pub use token::{SpannedToken, Token};
