//! Backtracking lexer for nestlang.
//!
//! Each grammar rule is a `resolve_*` method built from a [`Matcher`] chain.
//! A resolver either succeeds, leaving its tokens in the buffer, or fails and
//! leaves the lexer exactly as it found it.
//!
//! Whitespace is context sensitive. At the top level blanks, newlines and
//! `//` comments are all insignificant. Inside an open `function`, `if` or
//! `loop` body a newline is not skipped: it ends the body. Every closed body
//! emits a [`Token::BlockEnd`], and the newline itself is consumed once, when
//! the nesting level drops back to zero.

use crate::config::Limits;
use crate::cursor::{Backtrack, Cursor, CursorState};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::matcher::{Matcher, Scanner};
use crate::token::{is_keyword, SpannedToken, Token};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected input at line {line}, column {column}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl LexError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error("could not tokenize program")
            .with_code("E0001")
            .with_label(Label::primary(self.span, "no grammar rule matches here"))
            .with_note("blocks opened by `function`, `then` or `do` must end with a newline")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerState {
    cursor: CursorState,
    token_count: usize,
    nesting: usize,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Parse an optionally negated run of ASCII digits. Values outside the
/// `i64` range are rejected.
fn parse_number(digits: &str, negative: bool) -> Option<i64> {
    let magnitude: i128 = digits.parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    tokens: Vec<SpannedToken>,
    nesting: usize,
    limits: Limits,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_limits(source, Limits::default())
    }

    pub fn with_limits(source: &'src str, limits: Limits) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            nesting: 0,
            limits,
        }
    }

    pub fn nesting(&self) -> usize {
        self.nesting
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let matched = self.resolve_statement_chain();
        while self.resolve_skip() {}

        if matched && self.cursor.at_end() {
            debug!(tokens = self.tokens.len(), "tokenized program");
            return Ok(self.tokens);
        }

        let furthest = self.cursor.furthest();
        debug!(line = furthest.line, column = furthest.column, "tokenization failed");
        Err(LexError {
            line: furthest.line,
            column: furthest.column,
            span: Span::new(furthest.position, furthest.position + 1),
        })
    }

    fn push(&mut self, token: Token, span: Span) {
        self.tokens.push(SpannedToken::new(token, span));
    }

    fn resolve_comment(&mut self) -> bool {
        Matcher::new(self)
            .literal("//")
            .zero_or_more_chars(|c| c != '\n')
            .matched()
    }

    fn resolve_inline_skip(&mut self) -> bool {
        self.cursor.eat_if(is_blank) || self.resolve_comment()
    }

    fn resolve_skip(&mut self) -> bool {
        self.resolve_inline_skip() || (self.nesting == 0 && self.cursor.eat("\n"))
    }

    /// Match `keyword` and push `token`. A keyword is a plain literal, so
    /// `printer` starts with `print` wherever `print` is tried first.
    fn resolve_keyword(&mut self, keyword: &str, token: Token) -> bool {
        let start = self.cursor.position();
        Matcher::new(self)
            .literal(keyword)
            .perform(|lexer| {
                let span = lexer.cursor.span_from(start);
                lexer.push(token, span);
            })
            .matched()
    }

    fn resolve_number(&mut self) -> bool {
        let mut negative = false;
        Matcher::new(self)
            .perform(|lexer| {
                if let Some(sign @ ('+' | '-')) = lexer.cursor.peek() {
                    negative = sign == '-';
                    lexer.cursor.advance();
                    while lexer.resolve_skip() {}
                }
            })
            .record()
            .one_or_more_chars(|c| c.is_ascii_digit())
            .collect(|lexer, digits, span| match parse_number(digits, negative) {
                Some(value) => {
                    lexer.push(Token::Number(value), span);
                    true
                }
                None => false,
            })
            .matched()
    }

    fn resolve_identifier(&mut self) -> bool {
        Matcher::new(self)
            .one_or_more_chars(|c| c.is_ascii_alphabetic())
            .collect(|lexer, word, span| {
                if is_keyword(word) {
                    return false;
                }
                lexer.push(Token::Identifier(word.to_string()), span);
                true
            })
            .matched()
    }

    fn resolve_value(&mut self) -> bool {
        self.resolve_number()
            || Matcher::new(self)
                .assert(|lexer| lexer.resolve_keyword("$", Token::Dereference))
                .assert_zero_or_more(Self::resolve_skip)
                .assert(Self::resolve_identifier)
                .rollback_on_failure()
                .matched()
    }

    fn resolve_statement_chain(&mut self) -> bool {
        Matcher::new(self)
            .assert(Self::resolve_chain_link)
            .assert_zero_or_more(Self::resolve_chain_link)
            .matched()
    }

    /// One `Skip* Statement` step of a statement chain.
    fn resolve_chain_link(&mut self) -> bool {
        Matcher::new(self)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_statement)
            .matched()
    }

    fn resolve_statement(&mut self) -> bool {
        self.resolve_keyword("print", Token::Print)
            || self.resolve_statement_delete()
            || self.resolve_statement_identifier_based()
            || self.resolve_statement_condition()
            || self.resolve_statement_loop()
    }

    fn resolve_statement_delete(&mut self) -> bool {
        Matcher::new(self)
            .assert(|lexer| lexer.resolve_keyword("delete", Token::Delete))
            .assert_one_or_more(Self::resolve_skip)
            .assert(Self::resolve_identifier)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_statement_identifier_based(&mut self) -> bool {
        Matcher::new(self)
            .assert(Self::resolve_identifier)
            .assert(|lexer| {
                lexer.resolve_fragment_call()
                    || lexer.resolve_fragment_function_declaration()
                    || lexer.resolve_fragment_variable_declaration()
                    || lexer.resolve_fragment_variable_modification()
            })
            .rollback_on_failure()
            .matched()
    }

    fn resolve_fragment_call(&mut self) -> bool {
        Matcher::new(self)
            .assert_zero_or_more(Self::resolve_skip)
            .record()
            .literal("(")
            .assert_zero_or_more(Self::resolve_skip)
            .literal(")")
            .collect(|lexer, _, span| {
                lexer.push(Token::Call, span);
                true
            })
            .matched()
    }

    fn resolve_fragment_function_declaration(&mut self) -> bool {
        Matcher::new(self)
            .assert_one_or_more(Self::resolve_skip)
            .assert(|lexer| lexer.resolve_keyword("function", Token::Function))
            .assert(Self::resolve_block)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_fragment_variable_declaration(&mut self) -> bool {
        Matcher::new(self)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(|lexer| lexer.resolve_keyword("=", Token::Assign))
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_value)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_fragment_variable_modification(&mut self) -> bool {
        Matcher::new(self)
            .assert_one_or_more(Self::resolve_skip)
            .assert(|lexer| {
                lexer.resolve_keyword("add", Token::Add)
                    || lexer.resolve_keyword("sub", Token::Sub)
                    || lexer.resolve_keyword("mult", Token::Mult)
            })
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_value)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_comparison(&mut self) -> bool {
        self.resolve_keyword("==", Token::Equal) || self.resolve_keyword("!=", Token::NotEqual)
    }

    fn resolve_expression_primary(&mut self) -> bool {
        Matcher::new(self)
            .assert(Self::resolve_value)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_comparison)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_value)
            .rollback_on_failure()
            .matched()
    }

    /// `Skip* keyword Skip* operand`, the repeated tail of `and`/`or` chains.
    fn resolve_operator_tail(&mut self, keyword: &str, token: Token, operand: fn(&mut Self) -> bool) -> bool {
        Matcher::new(self)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(|lexer| lexer.resolve_keyword(keyword, token))
            .assert_zero_or_more(Self::resolve_skip)
            .assert(operand)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_expression_and(&mut self) -> bool {
        Matcher::new(self)
            .assert(Self::resolve_expression_primary)
            .assert_zero_or_more(|lexer| {
                lexer.resolve_operator_tail("and", Token::And, Self::resolve_expression_primary)
            })
            .rollback_on_failure()
            .matched()
    }

    fn resolve_expression_or(&mut self) -> bool {
        Matcher::new(self)
            .assert(Self::resolve_expression_and)
            .assert_zero_or_more(|lexer| {
                lexer.resolve_operator_tail("or", Token::Or, Self::resolve_expression_and)
            })
            .rollback_on_failure()
            .matched()
    }

    fn resolve_statement_condition(&mut self) -> bool {
        Matcher::new(self)
            .assert(|lexer| lexer.resolve_keyword("if", Token::If))
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_expression_or)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(|lexer| lexer.resolve_keyword("then", Token::Then))
            .assert(Self::resolve_block)
            .rollback_on_failure()
            .matched()
    }

    fn resolve_statement_loop(&mut self) -> bool {
        Matcher::new(self)
            .assert(|lexer| lexer.resolve_keyword("loop", Token::Loop))
            .assert_zero_or_more(Self::resolve_skip)
            .assert(Self::resolve_value)
            .assert_zero_or_more(Self::resolve_skip)
            .assert(|lexer| lexer.resolve_keyword("do", Token::Do))
            .assert(Self::resolve_block)
            .rollback_on_failure()
            .matched()
    }

    /// Body of a `function`, `if` or `loop`: `Skip+ StatementChain`, then
    /// the block terminator. Called right after the opening keyword.
    fn resolve_block(&mut self) -> bool {
        if self.nesting >= self.limits.max_nesting {
            debug!(limit = self.limits.max_nesting, "block nesting limit reached");
            return false;
        }

        Matcher::new(self)
            .perform(|lexer| lexer.nesting += 1)
            .assert_one_or_more(Self::resolve_skip)
            .assert(Self::resolve_statement_chain)
            .perform(|lexer| lexer.nesting -= 1)
            .assert(|lexer| lexer.nesting > 0 || lexer.resolve_line_end())
            .perform(|lexer| {
                let span = Span::point(lexer.cursor.position());
                lexer.push(Token::BlockEnd, span);
            })
            .rollback_on_failure()
            .matched()
    }

    /// Trailing blanks or a comment, then the newline that closes the
    /// outermost block.
    fn resolve_line_end(&mut self) -> bool {
        Matcher::new(self)
            .assert_zero_or_more(Self::resolve_inline_skip)
            .literal("\n")
            .matched()
    }
}

impl Backtrack for Lexer<'_> {
    type Checkpoint = LexerState;

    fn checkpoint(&self) -> LexerState {
        LexerState {
            cursor: self.cursor.checkpoint(),
            token_count: self.tokens.len(),
            nesting: self.nesting,
        }
    }

    fn rollback(&mut self, state: LexerState) {
        debug_assert!(state.token_count <= self.tokens.len());
        self.cursor.rollback(state.cursor);
        self.tokens.truncate(state.token_count);
        self.nesting = state.nesting;
    }
}

impl<'src> Scanner<'src> for Lexer<'src> {
    fn cursor(&self) -> &Cursor<'src> {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor<'src> {
        &mut self.cursor
    }
}

pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(source).tokenize()
}

pub fn tokenize_with_limits(source: &str, limits: Limits) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::with_limits(source, limits).tokenize()
}
