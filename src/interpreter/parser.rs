use crate::ast::{Chain, ComparisonOp, ExprNode, LogicalOp, ModificationOp, Stmt, ValueNode};
use crate::cursor::Backtrack;
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::token::{SpannedToken, Token};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected token {found}")]
pub struct ParseError {
    pub span: Span,
    pub found: Token,
}

impl ParseError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(format!("unexpected token `{}`", self.found))
            .with_code("E0101")
            .with_label(Label::primary(self.span, "no statement starts here"))
    }
}

/// Read position over a token slice.
#[derive(Debug, Clone)]
pub struct ParserCursor<'t> {
    tokens: &'t [SpannedToken],
    position: usize,
}

impl<'t> ParserCursor<'t> {
    pub fn new(tokens: &'t [SpannedToken]) -> Self {
        Self { tokens, position: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.peek_spanned().map(|st| &st.token)
    }

    pub fn peek_spanned(&self) -> Option<&'t SpannedToken> {
        self.tokens.get(self.position)
    }

    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }
}

impl Backtrack for ParserCursor<'_> {
    type Checkpoint = usize;

    fn checkpoint(&self) -> usize {
        self.position
    }

    fn rollback(&mut self, position: usize) {
        debug_assert!(position <= self.position);
        self.position = position;
    }
}

/// Recursive-descent parser. Every production returns `None` without
/// moving the cursor when it does not match.
pub struct TokenParser<'t> {
    cursor: ParserCursor<'t>,
}

impl<'t> TokenParser<'t> {
    pub fn new(tokens: &'t [SpannedToken]) -> Self {
        Self {
            cursor: ParserCursor::new(tokens),
        }
    }

    pub fn cursor(&self) -> &ParserCursor<'t> {
        &self.cursor
    }

    /// Run `production`, rewinding the cursor if it fails.
    fn attempt<T>(&mut self, production: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.cursor.checkpoint();
        let result = production(self);
        if result.is_none() {
            self.cursor.rollback(checkpoint);
        }
        result
    }

    fn expect(&mut self, expected: &Token) -> Option<()> {
        if self.cursor.peek()? == expected {
            self.cursor.advance();
            Some(())
        } else {
            None
        }
    }

    fn expect_identifier(&mut self) -> Option<Rc<str>> {
        match self.cursor.peek()? {
            Token::Identifier(name) => {
                self.cursor.advance();
                Some(Rc::from(name.as_str()))
            }
            _ => None,
        }
    }

    /// Parse statements until none matches. An empty chain is valid.
    pub fn parse_chain(&mut self) -> Chain {
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement() {
            statements.push(statement);
        }
        Chain::new(statements)
    }

    pub fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cursor.peek()? {
            Token::Print => {
                self.cursor.advance();
                Some(Stmt::Print)
            }
            Token::Delete => self.parse_delete(),
            Token::Identifier(_) => self.parse_identifier_based(),
            Token::If => self.parse_condition(),
            Token::Loop => self.parse_loop(),
            _ => None,
        }
    }

    fn parse_delete(&mut self) -> Option<Stmt> {
        self.attempt(|parser| {
            parser.expect(&Token::Delete)?;
            let name = parser.expect_identifier()?;
            Some(Stmt::Delete { name })
        })
    }

    fn parse_identifier_based(&mut self) -> Option<Stmt> {
        self.attempt(|parser| {
            let name = parser.expect_identifier()?;
            let op = match parser.cursor.advance()? {
                Token::Call => return Some(Stmt::Call { name }),
                Token::Function => {
                    let body = parser.parse_body()?;
                    return Some(Stmt::FunctionDeclaration { name, body });
                }
                Token::Assign => ModificationOp::Assign,
                Token::Add => ModificationOp::Add,
                Token::Sub => ModificationOp::Subtract,
                Token::Mult => ModificationOp::Multiply,
                _ => return None,
            };
            let value = parser.parse_value()?;
            Some(Stmt::Modify { op, name, value })
        })
    }

    fn parse_condition(&mut self) -> Option<Stmt> {
        self.attempt(|parser| {
            parser.expect(&Token::If)?;
            let condition = parser.parse_expression()?;
            parser.expect(&Token::Then)?;
            let body = parser.parse_body()?;
            Some(Stmt::Condition { condition, body })
        })
    }

    fn parse_loop(&mut self) -> Option<Stmt> {
        self.attempt(|parser| {
            parser.expect(&Token::Loop)?;
            let count = parser.parse_value()?;
            parser.expect(&Token::Do)?;
            let body = parser.parse_body()?;
            Some(Stmt::Loop { count, body })
        })
    }

    /// A nested chain closed by `BlockEnd`.
    fn parse_body(&mut self) -> Option<Chain> {
        self.attempt(|parser| {
            let body = parser.parse_chain();
            parser.expect(&Token::BlockEnd)?;
            Some(body)
        })
    }

    pub fn parse_value(&mut self) -> Option<ValueNode> {
        self.attempt(|parser| match parser.cursor.advance()? {
            Token::Number(value) => Some(ValueNode::Number(*value)),
            Token::Dereference => parser.expect_identifier().map(ValueNode::Identifier),
            _ => None,
        })
    }

    pub fn parse_expression(&mut self) -> Option<ExprNode> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_and()?;
        while let Some(right) = self.attempt(|parser| {
            parser.expect(&Token::Or)?;
            parser.parse_and()
        }) {
            left = ExprNode::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_comparison()?;
        while let Some(right) = self.attempt(|parser| {
            parser.expect(&Token::And)?;
            parser.parse_comparison()
        }) {
            left = ExprNode::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<ExprNode> {
        self.attempt(|parser| {
            let left = parser.parse_value()?;
            let op = match parser.cursor.advance()? {
                Token::Equal => ComparisonOp::Equals,
                Token::NotEqual => ComparisonOp::NotEquals,
                _ => return None,
            };
            let right = parser.parse_value()?;
            Some(ExprNode::Comparison { op, left, right })
        })
    }
}

/// Parse a whole token stream. Tokens left over after the top-level chain
/// are an error.
pub fn parse(tokens: &[SpannedToken]) -> Result<Chain, ParseError> {
    let mut parser = TokenParser::new(tokens);
    let chain = parser.parse_chain();

    if let Some(leftover) = parser.cursor.peek_spanned() {
        debug!(position = parser.cursor.position(), "unparsed tokens remain");
        return Err(ParseError {
            span: leftover.span,
            found: leftover.token.clone(),
        });
    }

    debug!(statements = chain.len(), "parsed program");
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Chain {
        let tokens = tokenize(source).expect("Lexer failed");
        parse(&tokens).expect("Parser failed")
    }

    fn spanned(tokens: Vec<Token>) -> Vec<SpannedToken> {
        tokens
            .into_iter()
            .enumerate()
            .map(|(i, token)| SpannedToken::new(token, Span::new(i, i + 1)))
            .collect()
    }

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    fn var(name: &str) -> ValueNode {
        ValueNode::Identifier(Rc::from(name))
    }

    fn cmp(op: ComparisonOp, left: ValueNode, right: ValueNode) -> ExprNode {
        ExprNode::Comparison { op, left, right }
    }

    #[test]
    fn test_modifications() {
        let chain = parse_source("x = 3\nx add $x\nx sub -1\nx mult 2\n");
        let ops: Vec<_> = chain
            .statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Modify { op, .. } => *op,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                ModificationOp::Assign,
                ModificationOp::Add,
                ModificationOp::Subtract,
                ModificationOp::Multiply
            ]
        );
        assert_eq!(
            chain.statements[1],
            Stmt::Modify { op: ModificationOp::Add, name: Rc::from("x"), value: var("x") }
        );
        assert_eq!(
            chain.statements[2],
            Stmt::Modify { op: ModificationOp::Subtract, name: Rc::from("x"), value: ValueNode::Number(-1) }
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let chain = parse_source("if 1 == 1 or 2 == 2 and 3 != 4 then print\n");
        let expected = ExprNode::Logical {
            op: LogicalOp::Or,
            left: Box::new(cmp(ComparisonOp::Equals, ValueNode::Number(1), ValueNode::Number(1))),
            right: Box::new(ExprNode::Logical {
                op: LogicalOp::And,
                left: Box::new(cmp(ComparisonOp::Equals, ValueNode::Number(2), ValueNode::Number(2))),
                right: Box::new(cmp(ComparisonOp::NotEquals, ValueNode::Number(3), ValueNode::Number(4))),
            }),
        };
        assert_eq!(
            chain.statements,
            vec![Stmt::Condition { condition: expected, body: Chain::new(vec![Stmt::Print]) }]
        );
    }

    #[test]
    fn test_logical_operators_are_left_associative() {
        let chain = parse_source("if $a == 1 or $b == 2 or $c == 3 then print\n");
        match &chain.statements[0] {
            Stmt::Condition { condition: ExprNode::Logical { op: LogicalOp::Or, left, right }, .. } => {
                assert!(matches!(**left, ExprNode::Logical { op: LogicalOp::Or, .. }));
                assert_eq!(**right, cmp(ComparisonOp::Equals, var("c"), ValueNode::Number(3)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_nested_bodies() {
        let chain = parse_source("f function loop 2 do x add 1\nf()\ndelete x\n");
        assert_eq!(
            chain.statements,
            vec![
                Stmt::FunctionDeclaration {
                    name: Rc::from("f"),
                    body: Chain::new(vec![Stmt::Loop {
                        count: ValueNode::Number(2),
                        body: Chain::new(vec![Stmt::Modify {
                            op: ModificationOp::Add,
                            name: Rc::from("x"),
                            value: ValueNode::Number(1),
                        }]),
                    }]),
                },
                Stmt::Call { name: Rc::from("f") },
                Stmt::Delete { name: Rc::from("x") },
            ]
        );
    }

    #[test]
    fn test_empty_token_stream_is_an_empty_chain() {
        assert_eq!(parse(&[]), Ok(Chain::default()));
    }

    #[test]
    fn test_empty_body() {
        let tokens = spanned(vec![Token::Loop, Token::Number(1), Token::Do, Token::BlockEnd]);
        let chain = parse(&tokens).unwrap();
        assert_eq!(
            chain.statements,
            vec![Stmt::Loop { count: ValueNode::Number(1), body: Chain::default() }]
        );
    }

    #[test]
    fn test_leftover_tokens_are_reported() {
        let tokens = spanned(vec![Token::Print, Token::BlockEnd]);
        let err = parse(&tokens).unwrap_err();
        assert_eq!(err.span, Span::new(1, 2));
        assert_eq!(err.found, Token::BlockEnd);
    }

    #[test]
    fn test_dangling_identifier_is_rejected() {
        let tokens = spanned(vec![ident("x"), ident("y")]);
        let err = parse(&tokens).unwrap_err();
        assert_eq!(err.span, Span::new(0, 1));
    }

    #[test]
    fn test_unclosed_body_fails() {
        let tokens = spanned(vec![Token::If, Token::Number(1), Token::Equal, Token::Number(1), Token::Then, Token::Print]);
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn test_failed_production_restores_cursor() {
        let tokens = spanned(vec![
            Token::Loop,
            Token::Dereference,
            ident("n"),
            Token::Do,
            Token::Print,
        ]);
        let mut parser = TokenParser::new(&tokens);
        assert_eq!(parser.parse_statement(), None);
        assert_eq!(parser.cursor().position(), 0);

        let tokens = spanned(vec![Token::Number(1), Token::Equal, Token::Number(1), Token::Equal, Token::Number(1)]);
        let mut parser = TokenParser::new(&tokens);
        assert!(parser.parse_expression().is_some());
        assert_eq!(parser.cursor().position(), 3);
    }
}
