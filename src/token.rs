use crate::diagnostic::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    // Literals and Identifiers
    Number(i64),
    Identifier(String),

    // Operators
    /// `$`, turns the following identifier into a value
    Dereference,
    Or,
    And,
    Equal,
    NotEqual,
    Assign,
    /// `()` after an identifier
    Call,

    // Keywords
    Print,
    Add,
    Sub,
    Mult,
    Delete,
    If,
    Then,
    Function,
    Loop,
    Do,

    /// Synthetic: closes the innermost open `function`/`if`/`loop` body
    BlockEnd,
}

/// Reserved words. None of them can be used as an identifier.
pub const KEYWORDS: [&str; 12] = [
    "or", "and", "delete", "print", "if", "then", "loop", "do", "function", "add", "sub", "mult",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "NUMBER({})", value),
            Token::Identifier(name) => write!(f, "IDENTIFIER({})", name),
            Token::Dereference => write!(f, "OP_DEREFERENCE"),
            Token::Or => write!(f, "OP_OR"),
            Token::And => write!(f, "OP_AND"),
            Token::Equal => write!(f, "OP_EQUAL"),
            Token::NotEqual => write!(f, "OP_NOT_EQUAL"),
            Token::Assign => write!(f, "OP_ASSIGN"),
            Token::Call => write!(f, "OP_CALL"),
            Token::Print => write!(f, "KEYWORD_PRINT"),
            Token::Add => write!(f, "KEYWORD_ADD"),
            Token::Sub => write!(f, "KEYWORD_SUB"),
            Token::Mult => write!(f, "KEYWORD_MULT"),
            Token::Delete => write!(f, "KEYWORD_DELETE"),
            Token::If => write!(f, "KEYWORD_IF"),
            Token::Then => write!(f, "KEYWORD_THEN"),
            Token::Function => write!(f, "KEYWORD_FUNCTION"),
            Token::Loop => write!(f, "KEYWORD_LOOP"),
            Token::Do => write!(f, "KEYWORD_DO"),
            Token::BlockEnd => write!(f, "BLOCK_END"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}
